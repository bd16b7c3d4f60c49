//! XXH3-128 partitioner implementation.

use xxhash_rust::xxh3::xxh3_128;

use crate::partitioner::traits::Partitioner;
use crate::ring::HashPosition;

/// Partitioner backed by the 128-bit XXH3 hash. The default.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Partitioner;

impl Partitioner for Xxh3Partitioner {
    #[inline]
    fn partition(&self, key: &[u8]) -> HashPosition {
        HashPosition(xxh3_128(key))
    }

    fn name(&self) -> &'static str {
        "Xxh3Partitioner"
    }
}
