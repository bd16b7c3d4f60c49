//! SipHash-1-3 (128-bit output) partitioner implementation.

use std::hash::Hasher;

use siphasher::sip128::{Hasher128, SipHasher13};

use crate::partitioner::traits::Partitioner;
use crate::ring::HashPosition;

/// Partitioner using SipHash-1-3 with zero keys and 128-bit output.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sip128Partitioner;

impl Partitioner for Sip128Partitioner {
    fn partition(&self, key: &[u8]) -> HashPosition {
        let mut hasher = SipHasher13::new();
        hasher.write(key);
        HashPosition(hasher.finish128().as_u128())
    }

    fn name(&self) -> &'static str {
        "Sip128Partitioner"
    }
}
