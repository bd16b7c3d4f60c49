//! Shared helpers for the ring integration tests.

use hashring_core::{HashPosition, HashRing, Partitioner};

/// Partitioner with hand-picked positions.
///
/// An identifier `"<label>@<n>"` hashes to `n`; a vnode key
/// `"<label>@<n>_<i>"` hashes to `n + i`. Anything else hashes to 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct Labeled;

impl Partitioner for Labeled {
    fn partition(&self, key: &[u8]) -> HashPosition {
        let key = std::str::from_utf8(key).unwrap_or_default();
        let Some((_, number)) = key.split_once('@') else {
            return HashPosition(0);
        };
        let (base, index) = number.split_once('_').unwrap_or((number, "0"));
        let base: u128 = base.parse().unwrap_or(0);
        let index: u128 = index.parse().unwrap_or(0);
        HashPosition(base + index)
    }

    fn name(&self) -> &'static str {
        "Labeled"
    }
}

/// Maps every identifier to the same position.
#[derive(Debug, Clone, Copy, Default)]
pub struct Constant;

impl Partitioner for Constant {
    fn partition(&self, _key: &[u8]) -> HashPosition {
        HashPosition(7)
    }

    fn name(&self) -> &'static str {
        "Constant"
    }
}

pub fn labeled_ring(replica_count: usize, nodes: &[&str]) -> HashRing<Labeled> {
    let ring = HashRing::with_partitioner(Labeled, replica_count, 1).unwrap();
    for node in nodes {
        ring.add_node(*node).unwrap();
    }
    ring
}

pub fn keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("key-{i}")).collect()
}
