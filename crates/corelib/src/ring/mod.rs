//! Consistent hash ring implementation.
//!
//! The ring manages vnode positions and provides efficient lookup
//! operations for finding the nodes responsible for keys.

pub mod position;
#[allow(clippy::module_inception)]
pub mod ring;

pub use position::HashPosition;
pub use ring::{HashRing, RingBuilder};
