//! BLAKE3 partitioner implementation.

use crate::partitioner::traits::Partitioner;
use crate::ring::HashPosition;

/// Partitioner using the first 16 bytes of a BLAKE3 digest.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Partitioner;

impl Partitioner for Blake3Partitioner {
    fn partition(&self, key: &[u8]) -> HashPosition {
        HashPosition::from_digest(::blake3::hash(key).as_bytes())
    }

    fn name(&self) -> &'static str {
        "Blake3Partitioner"
    }
}
