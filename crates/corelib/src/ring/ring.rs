//! Hash ring data structure and builder.
//!
//! Virtual nodes are kept in a `Vec` sorted by position, next to a
//! membership map from node to its positions. Both live behind a single
//! `RwLock`, so lookups run concurrently and a membership change is never
//! observed half-applied.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::RingConfig;
use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::partitioner::{Partitioner, PartitionerKind};
use crate::ring::HashPosition;
use crate::topology::{KeyRange, NodeOwnership, Topology};
use crate::vnode::VirtualNode;

/// Consistent hash ring.
///
/// A key resolves to the first vnode strictly clockwise of the key's
/// position, wrapping from the largest position back to the smallest.
/// Replicas are the next distinct nodes clockwise of the primary.
///
/// All methods take `&self`; share the ring between threads with `Arc`.
pub struct HashRing<P: Partitioner = PartitionerKind> {
    partitioner: P,
    replica_count: usize,
    vnodes_per_node: u16,
    state: RwLock<RingState>,
}

#[derive(Debug, Default)]
struct RingState {
    /// Sorted by position, positions unique.
    vnodes: Vec<VirtualNode>,
    /// Positions of each member in vnode-index order.
    members: HashMap<NodeId, Vec<HashPosition>>,
}

impl RingState {
    fn index_of(&self, position: HashPosition) -> Option<usize> {
        self.vnodes
            .binary_search_by_key(&position, |v| v.position)
            .ok()
    }

    /// Index of the first vnode strictly greater than `position`, wrapping
    /// to 0 past the end.
    fn successor(&self, position: HashPosition) -> Result<usize> {
        if self.vnodes.is_empty() {
            return Err(Error::EmptyRing);
        }
        let index = self.vnodes.partition_point(|v| v.position <= position);
        Ok(if index == self.vnodes.len() { 0 } else { index })
    }

    /// Index of the node's lowest-positioned vnode.
    fn home_index(&self, node_id: &str) -> Result<usize> {
        self.members
            .get(node_id)
            .and_then(|positions| positions.iter().min())
            .and_then(|position| self.index_of(*position))
            .ok_or_else(|| Error::NodeNotFound(NodeId::from(node_id)))
    }

    fn insert(&mut self, vnode: VirtualNode) {
        let index = self.vnodes.partition_point(|v| v.position < vnode.position);
        self.vnodes.insert(index, vnode);
    }

    /// Distinct nodes clockwise of `index`, skipping `exclude`, at most `limit`.
    fn distinct_after(&self, index: usize, exclude: &NodeId, limit: usize) -> Vec<NodeId> {
        let limit = limit.min(self.members.len().saturating_sub(1));
        let mut found: Vec<NodeId> = Vec::with_capacity(limit);
        if limit == 0 {
            return found;
        }

        let len = self.vnodes.len();
        for step in 1..len {
            let node_id = &self.vnodes[(index + step) % len].node_id;
            if node_id == exclude || found.contains(node_id) {
                continue;
            }
            found.push(node_id.clone());
            if found.len() == limit {
                break;
            }
        }
        found
    }

    /// `count` replicas for the key whose primary vnode sits at `index`.
    ///
    /// When fewer than `count` other nodes exist the distinct ones are
    /// repeated in ring order, for at most one lap of the ring.
    fn replicas_from(&self, index: usize, count: usize) -> Vec<NodeId> {
        let primary = &self.vnodes[index].node_id;
        let distinct = self.distinct_after(index, primary, count);
        let len = count.min(self.vnodes.len());
        distinct.iter().cycle().take(len).cloned().collect()
    }

    fn range_ending_at(&self, index: usize) -> KeyRange {
        let len = self.vnodes.len();
        let previous = (index + len - 1) % len;
        KeyRange::new(self.vnodes[previous].position, self.vnodes[index].position)
    }

    fn ranges_of(&self, node_id: &str) -> Result<Vec<KeyRange>> {
        let positions = self
            .members
            .get(node_id)
            .ok_or_else(|| Error::NodeNotFound(NodeId::from(node_id)))?;
        let mut ranges: Vec<KeyRange> = positions
            .iter()
            .filter_map(|position| self.index_of(*position))
            .map(|index| self.range_ending_at(index))
            .collect();
        ranges.sort_by_key(|range| range.end);
        Ok(ranges)
    }
}

impl HashRing<PartitionerKind> {
    /// Create an empty ring with one vnode per node and the default
    /// partitioner.
    pub fn new(replica_count: usize) -> Self {
        Self {
            partitioner: PartitionerKind::default(),
            replica_count,
            vnodes_per_node: 1,
            state: RwLock::new(RingState::default()),
        }
    }

    pub fn from_config(config: &RingConfig) -> Result<Self> {
        config.validate()?;
        Self::with_partitioner(
            config.partitioner,
            config.replica_count,
            config.vnodes_per_node,
        )
    }
}

impl<P: Partitioner> HashRing<P> {
    /// Create an empty ring with an explicit partitioner.
    pub fn with_partitioner(partitioner: P, replica_count: usize, vnodes_per_node: u16) -> Result<Self> {
        if vnodes_per_node == 0 {
            return Err(Error::InvalidConfig(
                "vnodes_per_node must be at least 1".into(),
            ));
        }
        Ok(Self {
            partitioner,
            replica_count,
            vnodes_per_node,
            state: RwLock::new(RingState::default()),
        })
    }

    pub fn replica_count(&self) -> usize {
        self.replica_count
    }

    pub fn vnodes_per_node(&self) -> u16 {
        self.vnodes_per_node
    }

    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }

    /// Ring position of a key.
    pub fn position_of_key(&self, key: impl AsRef<[u8]>) -> HashPosition {
        self.partitioner.partition(key.as_ref())
    }

    /// Add a node, inserting all of its vnodes.
    ///
    /// Fails without modifying the ring if the node is already present or
    /// if any of its positions collides with an occupied one.
    pub fn add_node(&self, node_id: impl Into<NodeId>) -> Result<()> {
        let node_id = node_id.into();
        let vnodes: Vec<VirtualNode> = (0..self.vnodes_per_node)
            .map(|i| VirtualNode::from_index(&self.partitioner, &node_id, i))
            .collect();

        let mut state = self.state.write();
        if state.members.contains_key(&node_id) {
            warn!(node = %node_id, "rejected node: already in ring");
            return Err(Error::DuplicateNode(node_id));
        }

        let mut positions = Vec::with_capacity(vnodes.len());
        for vnode in &vnodes {
            let owner = match state.index_of(vnode.position) {
                Some(index) => Some(state.vnodes[index].node_id.clone()),
                None if positions.contains(&vnode.position) => Some(node_id.clone()),
                None => None,
            };
            if let Some(owner) = owner {
                warn!(node = %node_id, %owner, position = %vnode.position, "rejected node: position already taken");
                return Err(Error::DuplicatePosition {
                    node: node_id,
                    owner,
                    position: vnode.position,
                });
            }
            positions.push(vnode.position);
        }

        for vnode in vnodes {
            state.insert(vnode);
        }
        state.members.insert(node_id.clone(), positions);
        let nodes = state.members.len();
        drop(state);

        debug!(node = %node_id, vnodes = self.vnodes_per_node, nodes, "added node to ring");
        metrics::counter!("hashring_membership_changes_total", "op" => "add").increment(1);
        metrics::gauge!("hashring_nodes").set(nodes as f64);
        Ok(())
    }

    /// Remove a node and all of its vnodes.
    pub fn remove_node(&self, node_id: impl AsRef<str>) -> Result<()> {
        let node_id = node_id.as_ref();
        let mut state = self.state.write();
        let positions = state
            .members
            .remove(node_id)
            .ok_or_else(|| Error::NodeNotFound(NodeId::from(node_id)))?;
        for position in positions {
            if let Some(index) = state.index_of(position) {
                state.vnodes.remove(index);
            }
        }
        let nodes = state.members.len();
        drop(state);

        debug!(node = %node_id, nodes, "removed node from ring");
        metrics::counter!("hashring_membership_changes_total", "op" => "remove").increment(1);
        metrics::gauge!("hashring_nodes").set(nodes as f64);
        Ok(())
    }

    /// True if every position of the node is on the ring.
    pub fn contains(&self, node_id: impl AsRef<str>) -> bool {
        let state = self.state.read();
        state
            .members
            .get(node_id.as_ref())
            .map_or(false, |positions| {
                positions.iter().all(|p| state.index_of(*p).is_some())
            })
    }

    /// Number of physical nodes.
    pub fn size(&self) -> usize {
        self.state.read().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of positions on the ring (nodes × vnodes per node).
    pub fn vnode_count(&self) -> usize {
        self.state.read().vnodes.len()
    }

    /// All member identifiers, sorted.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.state.read().members.keys().cloned().collect();
        nodes.sort();
        nodes
    }

    /// Snapshot of every vnode in ring order.
    pub fn vnodes(&self) -> Vec<VirtualNode> {
        self.state.read().vnodes.clone()
    }

    /// The primary node for a key.
    pub fn resolve(&self, key: impl AsRef<[u8]>) -> Result<NodeId> {
        let position = self.position_of_key(key);
        let state = self.state.read();
        let index = state.successor(position)?;
        Ok(state.vnodes[index].node_id.clone())
    }

    /// The `replica_count` replica nodes for a key, in ring order after the
    /// primary. The primary is never included.
    ///
    /// If the ring has fewer than `replica_count + 1` nodes the other nodes
    /// repeat, so the list contains duplicates; with a single node it is
    /// empty. The list never exceeds [`vnode_count`](Self::vnode_count)
    /// entries.
    pub fn replicas(&self, key: impl AsRef<[u8]>) -> Result<Vec<NodeId>> {
        let position = self.position_of_key(key);
        let state = self.state.read();
        let index = state.successor(position)?;
        Ok(state.replicas_from(index, self.replica_count))
    }

    /// Primary followed by its replicas, resolved under one read lock.
    pub fn preference_list(&self, key: impl AsRef<[u8]>) -> Result<Vec<NodeId>> {
        let position = self.position_of_key(key);
        let state = self.state.read();
        let index = state.successor(position)?;
        let replicas = state.replicas_from(index, self.replica_count);
        let mut nodes = Vec::with_capacity(replicas.len().saturating_add(1));
        nodes.push(state.vnodes[index].node_id.clone());
        nodes.extend(replicas);
        Ok(nodes)
    }

    /// The node that should absorb writes for `node_id` while it is down.
    ///
    /// Walking clockwise from the node's lowest-positioned vnode, the first
    /// `replica_count` distinct nodes already hold replicas of its range;
    /// the next one is the handoff target. Call this before
    /// [`remove_node`](Self::remove_node).
    ///
    /// When `replica_count` reaches the number of other nodes the walk
    /// cycles over them, so the target is never `node_id` itself.
    pub fn handoff(&self, node_id: impl AsRef<str>) -> Result<NodeId> {
        let node_id = node_id.as_ref();
        let state = self.state.read();
        if state.vnodes.is_empty() {
            return Err(Error::EmptyRing);
        }
        let index = state.home_index(node_id)?;
        let owner = &state.vnodes[index].node_id;
        let candidates = state.distinct_after(index, owner, self.replica_count.saturating_add(1));
        if candidates.is_empty() {
            return Err(Error::NoHandoffTarget(owner.clone()));
        }
        Ok(candidates[self.replica_count % candidates.len()].clone())
    }

    /// Key range of the node's lowest-positioned vnode, the same as the
    /// first entry of [`key_ranges`](Self::key_ranges).
    pub fn key_range(&self, node_id: impl AsRef<str>) -> Result<KeyRange> {
        let state = self.state.read();
        let index = state.home_index(node_id.as_ref())?;
        Ok(state.range_ending_at(index))
    }

    /// Key ranges of all the node's vnodes, in ring order.
    pub fn key_ranges(&self, node_id: impl AsRef<str>) -> Result<Vec<KeyRange>> {
        self.state.read().ranges_of(node_id.as_ref())
    }

    /// How the hash space is currently split between nodes.
    pub fn topology(&self) -> Topology {
        let state = self.state.read();
        let mut node_ids: Vec<&NodeId> = state.members.keys().collect();
        node_ids.sort();

        let nodes = node_ids
            .into_iter()
            .map(|node_id| {
                let ranges = state.ranges_of(node_id.as_str()).unwrap_or_default();
                let fraction = ranges.iter().map(KeyRange::fraction).sum::<f64>().min(1.0);
                NodeOwnership {
                    node_id: node_id.clone(),
                    ranges,
                    fraction,
                }
            })
            .collect();
        Topology { nodes }
    }
}

impl<P: Partitioner> fmt::Debug for HashRing<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("HashRing")
            .field("partitioner", &self.partitioner.name())
            .field("replica_count", &self.replica_count)
            .field("vnodes_per_node", &self.vnodes_per_node)
            .field("nodes", &state.members.len())
            .field("vnodes", &state.vnodes.len())
            .finish()
    }
}

/// Builder for [`HashRing`].
///
/// # Example
///
/// ```rust
/// use hashring_core::RingBuilder;
///
/// let ring = RingBuilder::new()
///     .with_replicas(2)
///     .with_vnodes(16)
///     .add_node("node1")
///     .add_node("node2")
///     .add_node("node3")
///     .build()
///     .unwrap();
/// assert_eq!(ring.size(), 3);
/// assert_eq!(ring.replicas("key").unwrap().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RingBuilder<P = PartitionerKind> {
    partitioner: P,
    replica_count: usize,
    vnodes_per_node: u16,
    nodes: Vec<NodeId>,
}

impl RingBuilder<PartitionerKind> {
    pub fn new() -> Self {
        Self {
            partitioner: PartitionerKind::default(),
            replica_count: 0,
            vnodes_per_node: 1,
            nodes: Vec::new(),
        }
    }

    pub fn from_config(config: &RingConfig) -> Self {
        Self {
            partitioner: config.partitioner,
            replica_count: config.replica_count,
            vnodes_per_node: config.vnodes_per_node,
            nodes: Vec::new(),
        }
    }
}

impl Default for RingBuilder<PartitionerKind> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Partitioner> RingBuilder<P> {
    pub fn with_replicas(mut self, replica_count: usize) -> Self {
        self.replica_count = replica_count;
        self
    }

    pub fn with_vnodes(mut self, vnodes_per_node: u16) -> Self {
        self.vnodes_per_node = vnodes_per_node;
        self
    }

    pub fn with_partitioner<Q: Partitioner>(self, partitioner: Q) -> RingBuilder<Q> {
        RingBuilder {
            partitioner,
            replica_count: self.replica_count,
            vnodes_per_node: self.vnodes_per_node,
            nodes: self.nodes,
        }
    }

    pub fn add_node(mut self, node_id: impl Into<NodeId>) -> Self {
        self.nodes.push(node_id.into());
        self
    }

    pub fn add_nodes<I>(mut self, node_ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        self.nodes.extend(node_ids.into_iter().map(Into::into));
        self
    }

    /// Build the ring, adding nodes in the order given.
    pub fn build(self) -> Result<HashRing<P>> {
        let ring = HashRing::with_partitioner(self.partitioner, self.replica_count, self.vnodes_per_node)?;
        for node_id in self.nodes {
            ring.add_node(node_id)?;
        }
        Ok(ring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Places `"<n>"`-style identifiers at position `n`; vnode keys
    /// `"<n>_<i>"` at `n + i`.
    struct Numeric;

    impl Partitioner for Numeric {
        fn partition(&self, key: &[u8]) -> HashPosition {
            let key = std::str::from_utf8(key).unwrap();
            let (base, index) = key.split_once('_').unwrap_or((key, "0"));
            HashPosition(base.parse::<u128>().unwrap() + index.parse::<u128>().unwrap())
        }

        fn name(&self) -> &'static str {
            "Numeric"
        }
    }

    fn numeric_ring(replicas: usize, nodes: &[&str]) -> HashRing<Numeric> {
        let ring = HashRing::with_partitioner(Numeric, replicas, 1).unwrap();
        for node in nodes {
            ring.add_node(*node).unwrap();
        }
        ring
    }

    #[test]
    fn test_vnodes_stay_sorted_and_unique() {
        let ring = numeric_ring(0, &["300", "100", "200", "50"]);
        let positions: Vec<u128> = ring.vnodes().iter().map(|v| v.position.0).collect();
        assert_eq!(positions, vec![50, 100, 200, 300]);
    }

    #[test]
    fn test_successor_is_strict() {
        let ring = numeric_ring(0, &["100", "200", "300"]);
        assert_eq!(ring.resolve("99").unwrap(), "100");
        assert_eq!(ring.resolve("100").unwrap(), "200");
        assert_eq!(ring.resolve("299").unwrap(), "300");
        assert_eq!(ring.resolve("300").unwrap(), "100", "wraps to the minimum");
    }

    #[test]
    fn test_collision_with_other_node_rejects_whole_node() {
        // vnodes "100_1" and "101_0" both land on 101.
        let ring = HashRing::with_partitioner(Numeric, 0, 2).unwrap();
        ring.add_node("100").unwrap();
        let err = ring.add_node("101").unwrap_err();
        assert_eq!(
            err,
            Error::DuplicatePosition {
                node: NodeId::from("101"),
                owner: NodeId::from("100"),
                position: HashPosition(101),
            }
        );
        assert_eq!(ring.vnode_count(), 2);
        assert!(!ring.contains("101"));
    }

    #[test]
    fn test_distinct_after_skips_excluded_and_seen() {
        let ring = HashRing::with_partitioner(Numeric, 0, 3).unwrap();
        ring.add_node("10").unwrap(); // 10, 11, 12
        ring.add_node("20").unwrap(); // 20, 21, 22
        ring.add_node("30").unwrap(); // 30, 31, 32

        let state = ring.state.read();
        let start = state.index_of(HashPosition(12)).unwrap();
        let found = state.distinct_after(start, &NodeId::from("10"), 5);
        assert_eq!(found, vec![NodeId::from("20"), NodeId::from("30")]);
    }

    #[test]
    fn test_range_ending_at_first_wraps() {
        let ring = numeric_ring(0, &["100", "200", "300"]);
        let range = ring.key_range("100").unwrap();
        assert_eq!(range, KeyRange::new(HashPosition(300), HashPosition(100)));
        assert!(range.wraps());
    }

    #[test]
    fn test_zero_vnodes_rejected() {
        let err = HashRing::with_partitioner(Numeric, 0, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_debug_summarises() {
        let ring = numeric_ring(2, &["1", "2"]);
        let debug = format!("{ring:?}");
        assert!(debug.contains("Numeric"));
        assert!(debug.contains("nodes: 2"));
    }
}
