//! Subcommands and their results.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Context;
use clap::Subcommand;
use hashring_core::{AddressBook, HashRing, KeyRange, NodeId, SystemResolver};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print every vnode in ring order.
    Ring,
    /// Show the primary and replicas of one or more keys.
    Locate {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Show which node takes over writes if NODE fails.
    Handoff { node: String },
    /// Show the key range NODE is primary for.
    Range {
        node: String,
        /// One range per vnode instead of the first in ring order only.
        #[arg(long)]
        all: bool,
    },
    /// Show each node's share of the hash space.
    Topology,
    /// Simulate removing a node and report which keys move.
    Disruption {
        #[arg(long)]
        remove: String,
        /// Number of synthetic keys to place.
        #[arg(long, default_value_t = 10_000)]
        keys: usize,
    },
    /// Resolve member identifiers as hostnames.
    Resolve,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VnodeEntry {
    pub position: String,
    pub node: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub key: String,
    pub position: String,
    pub primary: String,
    pub replicas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeEntry {
    pub start: String,
    pub end: String,
    pub fraction: f64,
}

impl From<&KeyRange> for RangeEntry {
    fn from(range: &KeyRange) -> Self {
        Self {
            start: range.start.to_string(),
            end: range.end.to_string(),
            fraction: range.fraction(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ownership {
    pub node: String,
    pub vnodes: usize,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisruptionReport {
    pub removed: String,
    /// Handoff target computed before removal; `None` for a lone node.
    pub handoff: Option<String>,
    pub keys: usize,
    pub moved: usize,
    /// New owners of the moved keys.
    pub moved_to: BTreeMap<String, usize>,
    /// Keys that changed owner although their owner stayed. Always 0 on a
    /// consistent ring.
    pub unexpected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressEntry {
    pub node: String,
    pub address: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandResult {
    Ring {
        partitioner: String,
        replica_count: usize,
        vnodes: Vec<VnodeEntry>,
    },
    Locate {
        placements: Vec<Placement>,
    },
    Handoff {
        node: String,
        target: String,
    },
    Range {
        node: String,
        ranges: Vec<RangeEntry>,
    },
    Topology {
        nodes: Vec<Ownership>,
        imbalance: Option<f64>,
    },
    Disruption(DisruptionReport),
    Resolve {
        addresses: Vec<AddressEntry>,
    },
}

impl Command {
    pub fn execute(&self, ring: &HashRing) -> anyhow::Result<CommandResult> {
        match self {
            Command::Ring => Ok(CommandResult::Ring {
                partitioner: ring.partitioner_name().to_owned(),
                replica_count: ring.replica_count(),
                vnodes: ring
                    .vnodes()
                    .iter()
                    .map(|v| VnodeEntry {
                        position: v.position.to_string(),
                        node: v.node_id.to_string(),
                    })
                    .collect(),
            }),
            Command::Locate { keys } => {
                let placements: Vec<Placement> = keys
                    .iter()
                    .map(|key| locate(ring, key))
                    .collect::<anyhow::Result<_>>()?;
                Ok(CommandResult::Locate { placements })
            }
            Command::Handoff { node } => {
                let target = ring
                    .handoff(node)
                    .with_context(|| format!("computing handoff for {node}"))?;
                Ok(CommandResult::Handoff {
                    node: node.clone(),
                    target: target.to_string(),
                })
            }
            Command::Range { node, all } => {
                let ranges = if *all {
                    ring.key_ranges(node)?
                } else {
                    vec![ring.key_range(node)?]
                };
                Ok(CommandResult::Range {
                    node: node.clone(),
                    ranges: ranges.iter().map(RangeEntry::from).collect(),
                })
            }
            Command::Topology => {
                let topology = ring.topology();
                Ok(CommandResult::Topology {
                    imbalance: topology.imbalance(),
                    nodes: topology
                        .nodes
                        .iter()
                        .map(|n| Ownership {
                            node: n.node_id.to_string(),
                            vnodes: n.ranges.len(),
                            fraction: n.fraction,
                        })
                        .collect(),
                })
            }
            Command::Disruption { remove, keys } => {
                disruption(ring, remove, *keys).map(CommandResult::Disruption)
            }
            Command::Resolve => Ok(CommandResult::Resolve {
                addresses: resolve_addresses(ring),
            }),
        }
    }
}

fn locate(ring: &HashRing, key: &str) -> anyhow::Result<Placement> {
    let mut nodes = ring.preference_list(key)?.into_iter().map(|n| n.to_string());
    let primary = nodes.next().context("empty preference list")?;
    Ok(Placement {
        key: key.to_owned(),
        position: ring.position_of_key(key).to_string(),
        primary,
        replicas: nodes.collect(),
    })
}

/// Removes `victim`, compares every synthetic key's owner, then puts the
/// node back so the ring is unchanged afterwards.
fn disruption(ring: &HashRing, victim: &str, keys: usize) -> anyhow::Result<DisruptionReport> {
    let handoff = ring.handoff(victim).ok().map(|n| n.to_string());
    let keys: Vec<String> = (0..keys).map(|i| format!("key-{i}")).collect();
    let before: Vec<NodeId> = keys
        .iter()
        .map(|k| ring.resolve(k))
        .collect::<Result<_, _>>()?;

    ring.remove_node(victim)
        .with_context(|| format!("removing {victim}"))?;
    let after: anyhow::Result<Vec<NodeId>> = if ring.is_empty() {
        Ok(Vec::new())
    } else {
        keys.iter()
            .map(|k| ring.resolve(k).map_err(Into::into))
            .collect()
    };
    ring.add_node(victim)?;
    let after = after?;

    let mut report = DisruptionReport {
        removed: victim.to_owned(),
        handoff,
        keys: keys.len(),
        moved: 0,
        moved_to: BTreeMap::new(),
        unexpected: 0,
    };
    for (old, new) in before.iter().zip(&after) {
        if old == new {
            continue;
        }
        report.moved += 1;
        *report.moved_to.entry(new.to_string()).or_default() += 1;
        if old != victim {
            report.unexpected += 1;
        }
    }
    if after.is_empty() {
        report.moved = keys.len();
    }
    if report.unexpected > 0 {
        warn!(unexpected = report.unexpected, "keys moved off surviving nodes");
    }
    info!(removed = victim, moved = report.moved, "disruption simulated");
    Ok(report)
}

fn resolve_addresses(ring: &HashRing) -> Vec<AddressEntry> {
    let book = AddressBook::new();
    ring.nodes()
        .into_iter()
        .map(|node| match book.register(&node, &SystemResolver) {
            Ok(ip) => AddressEntry {
                node: node.to_string(),
                address: Some(ip.to_string()),
                error: None,
            },
            Err(e) => {
                warn!(%node, error = %e, "address lookup failed");
                AddressEntry {
                    node: node.to_string(),
                    address: None,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect()
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Ring {
                partitioner,
                replica_count,
                vnodes,
            } => {
                writeln!(f, "partitioner: {partitioner}, replicas: {replica_count}")?;
                for v in vnodes {
                    writeln!(f, "{} {}", v.position, v.node)?;
                }
            }
            CommandResult::Locate { placements } => {
                for p in placements {
                    writeln!(f, "{} ({}) -> {}", p.key, p.position, p.primary)?;
                    if !p.replicas.is_empty() {
                        writeln!(f, "  replicas: {}", p.replicas.join(", "))?;
                    }
                }
            }
            CommandResult::Handoff { node, target } => {
                writeln!(f, "{node} hands off to {target}")?;
            }
            CommandResult::Range { node, ranges } => {
                writeln!(f, "{node}:")?;
                for r in ranges {
                    writeln!(f, "  [{}, {})  {:.4}%", r.start, r.end, r.fraction * 100.0)?;
                }
            }
            CommandResult::Topology { nodes, imbalance } => {
                for n in nodes {
                    writeln!(f, "{:<24} {:>5} vnodes {:>8.4}%", n.node, n.vnodes, n.fraction * 100.0)?;
                }
                if let Some(imbalance) = imbalance {
                    writeln!(f, "max/min share: {imbalance:.3}")?;
                }
            }
            CommandResult::Disruption(report) => {
                writeln!(f, "removing {}", report.removed)?;
                match &report.handoff {
                    Some(target) => writeln!(f, "  handoff: {target}")?,
                    None => writeln!(f, "  handoff: none")?,
                }
                writeln!(f, "  moved {}/{} keys", report.moved, report.keys)?;
                for (node, count) in &report.moved_to {
                    writeln!(f, "    -> {node}: {count}")?;
                }
                writeln!(f, "  unexpected moves: {}", report.unexpected)?;
            }
            CommandResult::Resolve { addresses } => {
                for a in addresses {
                    match (&a.address, &a.error) {
                        (Some(address), _) => writeln!(f, "{} {}", a.node, address)?,
                        (None, Some(error)) => writeln!(f, "{} unresolved: {}", a.node, error)?,
                        (None, None) => writeln!(f, "{} unresolved", a.node)?,
                    }
                }
            }
        }
        Ok(())
    }
}
