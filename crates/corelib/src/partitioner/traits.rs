//! Core partitioner trait definitions.

use crate::ring::HashPosition;

/// A partitioner converts identifiers into positions on the hash ring.
///
/// Partitioners are stateless and thread-safe, allowing concurrent
/// position generation without synchronization overhead. The same input
/// must always produce the same position, in every process.
pub trait Partitioner: Send + Sync + 'static {
    /// Converts an identifier's bytes into a ring position.
    fn partition(&self, key: &[u8]) -> HashPosition;

    /// Returns the name of this partitioner.
    fn name(&self) -> &'static str;
}

