//! Core library for consistent hashing.
//!
//! This crate provides:
//! - A 128-bit hash position space and pluggable partitioners
//! - Virtual nodes owned by opaque node identifiers
//! - The [`HashRing`]: primary, replica, handoff and key-range resolution
//! - Ownership topology for auditing and rebalancing tools
//! - Address bookkeeping kept outside the ring
//!
//! ```rust
//! use hashring_core::HashRing;
//!
//! let ring = HashRing::new(1);
//! ring.add_node("node1.hostname").unwrap();
//! ring.add_node("node2.hostname").unwrap();
//!
//! let primary = ring.resolve("user:42").unwrap();
//! let replicas = ring.replicas("user:42").unwrap();
//! assert_eq!(replicas.len(), 1);
//! assert_ne!(replicas[0], primary);
//! ```

pub mod config;
pub mod error;
pub mod network;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod topology;
pub mod vnode;

pub use config::RingConfig;
pub use error::{Error, Result};
pub use network::{AddressBook, AddressResolver, SystemResolver};
pub use node::NodeId;
pub use partitioner::{Partitioner, PartitionerKind};
pub use ring::{HashPosition, HashRing, RingBuilder};
pub use topology::{KeyRange, NodeOwnership, Topology};
pub use vnode::VirtualNode;
