//! Command-line configuration and the cluster file format.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use hashring_core::{HashRing, PartitionerKind, RingBuilder, RingConfig};
use serde::Deserialize;
use tracing::{debug, info};

use crate::commands::{Command, CommandResult};
use crate::logging::{init_logging, LogLevel};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Cluster description loaded with `--config`.
///
/// ```json
/// { "ring": { "replica_count": 3, "vnodes_per_node": 8 }, "nodes": ["a", "b"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterFile {
    pub ring: RingConfig,
    pub nodes: Vec<String>,
}

impl ClusterFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading cluster file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing cluster file {}", path.display()))
    }
}

/// Inspect placement on a consistent hash ring.
///
/// Flags override values from the cluster file.
#[derive(Debug, Parser)]
#[command(name = "hashring", version, about)]
pub struct CliConfig {
    /// JSON cluster file with ring settings and members.
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Ring members, comma separated.
    #[arg(long, short = 'n', value_delimiter = ',', global = true)]
    pub nodes: Vec<String>,

    /// Replicas per key, not counting the primary.
    #[arg(long, short = 'r', global = true)]
    pub replicas: Option<usize>,

    /// Virtual nodes per physical node.
    #[arg(long, global = true)]
    pub vnodes: Option<u16>,

    /// Hash function: xxh3, blake3 or sip128.
    #[arg(long, global = true)]
    pub partitioner: Option<PartitionerKind>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Settings and members after overlaying flags on the cluster file.
    pub fn resolve_cluster(&self) -> anyhow::Result<ClusterFile> {
        let mut cluster = match &self.config {
            Some(path) => ClusterFile::load(path)?,
            None => ClusterFile::default(),
        };

        if let Some(replicas) = self.replicas {
            cluster.ring.replica_count = replicas;
        }
        if let Some(vnodes) = self.vnodes {
            cluster.ring.vnodes_per_node = vnodes;
        }
        if let Some(partitioner) = self.partitioner {
            cluster.ring.partitioner = partitioner;
        }
        if !self.nodes.is_empty() {
            cluster.nodes = self.nodes.clone();
        }

        if cluster.nodes.is_empty() {
            bail!("no ring members: pass --nodes or a --config file listing nodes");
        }
        cluster.ring.validate()?;
        Ok(cluster)
    }

    pub fn build_ring(&self) -> anyhow::Result<HashRing> {
        let cluster = self.resolve_cluster()?;
        debug!(config = ?cluster.ring, nodes = cluster.nodes.len(), "building ring");
        let ring = RingBuilder::from_config(&cluster.ring)
            .add_nodes(cluster.nodes)
            .build()
            .context("building ring")?;
        info!(
            nodes = ring.size(),
            vnodes = ring.vnode_count(),
            partitioner = ring.partitioner_name(),
            "ring ready"
        );
        Ok(ring)
    }

    /// Build the ring and run the subcommand.
    pub fn execute(&self) -> anyhow::Result<CommandResult> {
        let ring = self.build_ring()?;
        self.command.execute(&ring)
    }

    pub fn run(&self) -> anyhow::Result<()> {
        init_logging(self.log_level);
        let result = self.execute()?;
        match self.format {
            OutputFormat::Text => print!("{result}"),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> CliConfig {
        CliConfig::try_parse_from(std::iter::once("hashring").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_only() {
        let cli = parse(&["--nodes", "a,b,c", "--replicas", "2", "--vnodes", "4", "topology"]);
        let cluster = cli.resolve_cluster().unwrap();
        assert_eq!(cluster.nodes, vec!["a", "b", "c"]);
        assert_eq!(cluster.ring.replica_count, 2);
        assert_eq!(cluster.ring.vnodes_per_node, 4);
        assert_eq!(cluster.ring.partitioner, PartitionerKind::Xxh3);
    }

    #[test]
    fn test_partitioner_flag_parses() {
        let cli = parse(&["-n", "a", "--partitioner", "blake3", "ring"]);
        assert_eq!(cli.partitioner, Some(PartitionerKind::Blake3));
        assert!(CliConfig::try_parse_from(["hashring", "--partitioner", "md5", "ring"]).is_err());
    }

    #[test]
    fn test_missing_nodes_rejected() {
        let cli = parse(&["ring"]);
        let err = cli.resolve_cluster().unwrap_err();
        assert!(err.to_string().contains("no ring members"));
    }

    #[test]
    fn test_zero_vnodes_rejected() {
        let cli = parse(&["-n", "a", "--vnodes", "0", "ring"]);
        assert!(cli.resolve_cluster().is_err());
    }

    #[test]
    fn test_file_with_flag_overrides() {
        let path = std::env::temp_dir().join(format!("hashring-cli-test-{}.json", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"ring": {{"replica_count": 3, "vnodes_per_node": 8}}, "nodes": ["x", "y"]}}"#
        )
        .unwrap();

        let path_arg = path.to_str().unwrap();
        let cli = parse(&["--config", path_arg, "--replicas", "1", "ring"]);
        let cluster = cli.resolve_cluster().unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(cluster.nodes, vec!["x", "y"]);
        assert_eq!(cluster.ring.replica_count, 1);
        assert_eq!(cluster.ring.vnodes_per_node, 8);
    }

    #[test]
    fn test_max_replicas_locate() {
        let max = usize::MAX.to_string();
        let cli = parse(&["-n", "a,b,c", "--replicas", &max, "locate", "k"]);
        let CommandResult::Locate { placements } = cli.execute().unwrap() else {
            panic!("expected locate result");
        };
        assert_eq!(placements[0].replicas.len(), 3);
        assert!(!placements[0].replicas.contains(&placements[0].primary));
    }

    #[test]
    fn test_unreadable_file_has_context() {
        let cli = parse(&["--config", "/nonexistent/cluster.json", "ring"]);
        let err = cli.resolve_cluster().unwrap_err();
        assert!(err.to_string().contains("reading cluster file"));
    }
}
