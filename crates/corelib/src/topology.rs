//! Ring topology: key ranges and ownership.
//!
//! These are read-only views computed from a [`HashRing`](crate::ring::HashRing)
//! for rebalancing and auditing tools.

use std::fmt;

use crate::node::NodeId;
use crate::ring::HashPosition;

/// The interval of hash positions a single virtual node is primary for.
///
/// A key whose position `h` satisfies `start <= h < end` (with wraparound)
/// resolves to the vnode at `end`. `start` is the position of the preceding
/// vnode. When the ring holds a single position, `start == end` and the
/// range covers the whole ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyRange {
    pub start: HashPosition,
    pub end: HashPosition,
}

impl KeyRange {
    pub fn new(start: HashPosition, end: HashPosition) -> Self {
        Self { start, end }
    }

    /// True when the range covers every position.
    pub fn is_full(&self) -> bool {
        self.start == self.end
    }

    /// True when the range crosses `MAX -> MIN`.
    pub fn wraps(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, position: HashPosition) -> bool {
        if self.is_full() {
            true
        } else if self.wraps() {
            position >= self.start || position < self.end
        } else {
            self.start <= position && position < self.end
        }
    }

    /// Number of positions covered, or `None` for the full ring (2^128
    /// does not fit in a `u128`).
    pub fn width(&self) -> Option<u128> {
        if self.is_full() {
            None
        } else {
            Some(self.start.distance_to(&self.end))
        }
    }

    /// Share of the hash space covered, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        self.width().map_or(1.0, HashPosition::fraction)
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Ownership of one physical node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOwnership {
    pub node_id: NodeId,
    /// One range per vnode, in ring order.
    pub ranges: Vec<KeyRange>,
    /// Share of the hash space this node is primary for.
    pub fraction: f64,
}

/// Snapshot of how the hash space is split between nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    /// Sorted by node identifier.
    pub nodes: Vec<NodeOwnership>,
}

impl Topology {
    pub fn node(&self, node_id: &NodeId) -> Option<&NodeOwnership> {
        self.nodes.iter().find(|n| &n.node_id == node_id)
    }

    /// Ratio of the largest to the smallest ownership share; 1.0 is perfectly
    /// balanced. `None` for an empty ring.
    pub fn imbalance(&self) -> Option<f64> {
        let max = self.nodes.iter().map(|n| n.fraction).reduce(f64::max)?;
        let min = self.nodes.iter().map(|n| n.fraction).reduce(f64::min)?;
        if min == 0.0 {
            return Some(f64::INFINITY);
        }
        Some(max / min)
    }
}
