//! Address resolution for ring members.
//!
//! The ring only ever sees opaque [`NodeId`]s. Turning an identifier into a
//! connectable address, and mapping a peer address back to its identifier,
//! happens here, before or after ring operations and never inside them.

use std::collections::HashMap;
use std::net::{IpAddr, ToSocketAddrs};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::node::NodeId;

/// Resolves a node identifier to an IP address.
pub trait AddressResolver: Send + Sync {
    fn resolve(&self, node_id: &NodeId) -> Result<IpAddr>;
}

impl<F> AddressResolver for F
where
    F: Fn(&NodeId) -> Result<IpAddr> + Send + Sync,
{
    fn resolve(&self, node_id: &NodeId) -> Result<IpAddr> {
        self(node_id)
    }
}

/// Treats the identifier as a hostname (or IP literal) and asks the OS
/// resolver. Blocks on the lookup; IPv4 answers are preferred.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl AddressResolver for SystemResolver {
    fn resolve(&self, node_id: &NodeId) -> Result<IpAddr> {
        let failed = |reason: String| Error::AddressResolution {
            node: node_id.clone(),
            reason,
        };
        let addrs: Vec<IpAddr> = (node_id.as_str(), 0)
            .to_socket_addrs()
            .map_err(|e| failed(e.to_string()))?
            .map(|addr| addr.ip())
            .collect();
        addrs
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| failed("no addresses returned".into()))
    }
}

#[derive(Debug, Default)]
struct Entries {
    by_node: HashMap<NodeId, IpAddr>,
    by_addr: HashMap<IpAddr, NodeId>,
}

/// Two-way node ↔ address bookkeeping.
///
/// Lets a caller that only knows a failed peer's address find the node
/// identifier to pass to [`HashRing::handoff`](crate::ring::HashRing::handoff).
/// Both directions are updated under one lock.
#[derive(Debug, Default)]
pub struct AddressBook {
    entries: RwLock<Entries>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `node_id` and record the result.
    pub fn register<R>(&self, node_id: &NodeId, resolver: &R) -> Result<IpAddr>
    where
        R: AddressResolver + ?Sized,
    {
        let ip = resolver.resolve(node_id)?;
        self.insert(node_id.clone(), ip);
        Ok(ip)
    }

    /// Record an address, replacing any previous mapping of either side.
    pub fn insert(&self, node_id: NodeId, ip: IpAddr) {
        let mut entries = self.entries.write();
        if let Some(old_ip) = entries.by_node.remove(&node_id) {
            entries.by_addr.remove(&old_ip);
        }
        if let Some(old_node) = entries.by_addr.remove(&ip) {
            entries.by_node.remove(&old_node);
        }
        debug!(node = %node_id, %ip, "recorded node address");
        entries.by_addr.insert(ip, node_id.clone());
        entries.by_node.insert(node_id, ip);
    }

    /// Drop a node's mapping, returning its address.
    pub fn forget(&self, node_id: &NodeId) -> Option<IpAddr> {
        let mut entries = self.entries.write();
        let ip = entries.by_node.remove(node_id)?;
        entries.by_addr.remove(&ip);
        Some(ip)
    }

    pub fn addr_of(&self, node_id: &NodeId) -> Option<IpAddr> {
        self.entries.read().by_node.get(node_id).copied()
    }

    pub fn node_for(&self, ip: &IpAddr) -> Option<NodeId> {
        self.entries.read().by_addr.get(ip).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().by_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
