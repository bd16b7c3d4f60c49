//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Each physical node owns one or more positions on the ring. With a single
//! position per node a small cluster splits the hash space very unevenly;
//! several positions per node smooth the distribution, and when a node
//! leaves its keys are spread over several successors instead of one.
//!
//! # Performance Characteristics
//!
//! - **Memory**: O(v) per node where v = vnodes per node
//! - **Lookup**: O(log n) where n = total vnodes
//! - **Membership change**: O(v * n) (sorted insertion/removal per vnode)
//!
//! The vnode count is fixed for the whole ring at construction.

use crate::node::NodeId;
use crate::partitioner::Partitioner;
use crate::ring::HashPosition;

/// A virtual node on the hash ring: one position owned by a physical node.
///
/// # Invariants
///
/// - Every `VirtualNode` on a ring has a unique position
/// - Every `VirtualNode` belongs to exactly one physical node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode {
    /// Position on the ring; the hash of `"{node_id}_{index}"`.
    pub position: HashPosition,

    /// The physical node that owns this virtual node.
    pub node_id: NodeId,
}

impl VirtualNode {
    #[inline]
    pub fn new(position: HashPosition, node_id: NodeId) -> Self {
        Self { position, node_id }
    }

    /// Create virtual node `vnode_index` of `node_id`, hashing
    /// `"{node_id}_{vnode_index}"` with the given partitioner.
    ///
    /// # Example
    /// ```rust
    /// use hashring_core::partitioner::Xxh3Partitioner;
    /// use hashring_core::{NodeId, VirtualNode};
    ///
    /// let first = VirtualNode::from_index(&Xxh3Partitioner, &NodeId::from("node1"), 0);
    /// let second = VirtualNode::from_index(&Xxh3Partitioner, &NodeId::from("node1"), 1);
    /// assert_ne!(first.position(), second.position());
    /// ```
    pub fn from_index<P: Partitioner + ?Sized>(
        partitioner: &P,
        node_id: &NodeId,
        vnode_index: u16,
    ) -> Self {
        let position = partitioner.partition(node_id.vnode_key(vnode_index).as_bytes());
        Self::new(position, node_id.clone())
    }

    #[inline]
    pub fn position(&self) -> HashPosition {
        self.position
    }

    #[inline]
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Clockwise distance to another virtual node.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> u128 {
        self.position.distance_to(&other.position)
    }
}

impl std::fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VNode(position={}, node={})", self.position, self.node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partitioner::Xxh3Partitioner;

    #[test]
    fn test_vnode_creation() {
        let vnode = VirtualNode::new(HashPosition(100), NodeId::from("a"));
        assert_eq!(vnode.position(), HashPosition(100));
        assert_eq!(vnode.node_id(), "a");
    }

    #[test]
    fn test_vnode_from_index() {
        let node = NodeId::from("node1");
        let vnode0 = VirtualNode::from_index(&Xxh3Partitioner, &node, 0);
        let vnode1 = VirtualNode::from_index(&Xxh3Partitioner, &node, 1);

        assert_ne!(vnode0.position(), vnode1.position());
        assert_eq!(vnode0.node_id(), vnode1.node_id());
        assert_eq!(
            vnode0.position(),
            Xxh3Partitioner.partition(b"node1_0"),
            "vnode 0 hashes `{{id}}_0`"
        );
    }

    #[test]
    fn test_vnode_distance_and_ordering() {
        let vnode1 = VirtualNode::new(HashPosition(100), NodeId::from("b"));
        let vnode2 = VirtualNode::new(HashPosition(200), NodeId::from("a"));

        assert_eq!(vnode1.distance_to(&vnode2), 100);
        assert!(vnode1 < vnode2, "ordered by position before node");
    }
}
