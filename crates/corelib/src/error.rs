//! Error types for the core library.

use crate::node::NodeId;
use crate::ring::HashPosition;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
///
/// Every error leaves the ring untouched: a failed mutation never commits
/// partial state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Two distinct identifiers hashed to the same ring position.
    #[error("position {position} for node {node} is already owned by {owner}")]
    DuplicatePosition {
        /// Node whose insertion was rejected.
        node: NodeId,
        /// Node that already owns the position.
        owner: NodeId,
        /// The contested position.
        position: HashPosition,
    },

    /// The node is already a member of the ring.
    #[error("node {0} is already present in the ring")]
    DuplicateNode(NodeId),

    /// The operation referenced a node that is not on the ring.
    #[error("node {0} is not in the ring")]
    NodeNotFound(NodeId),

    /// A resolution was attempted with no registered nodes.
    #[error("ring has no nodes")]
    EmptyRing,

    /// The node is the only member, so nothing can absorb its writes.
    #[error("no other node can take over for {0}")]
    NoHandoffTarget(NodeId),

    /// Invalid ring configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The address-resolution collaborator failed for a node.
    #[error("cannot resolve address of {node}: {reason}")]
    AddressResolution {
        /// Node whose address was looked up.
        node: NodeId,
        /// Resolver failure message.
        reason: String,
    },
}
