//! Partitioner abstraction for consistent hashing.
//!
//! Partitioners are responsible for converting node and key identifiers
//! into positions that can be placed on the hash ring. Every partitioner
//! produces a full 128-bit [`HashPosition`](crate::ring::HashPosition).

pub mod blake3;
pub mod kind;
pub mod sip;
pub mod traits;
pub mod xxh3;

pub use self::blake3::Blake3Partitioner;
pub use kind::PartitionerKind;
pub use sip::Sip128Partitioner;
pub use traits::Partitioner;
pub use xxh3::Xxh3Partitioner;
