//! Ring configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::partitioner::PartitionerKind;

/// Construction-time settings of a [`HashRing`](crate::ring::HashRing).
///
/// All fields are fixed for the lifetime of the ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RingConfig {
    /// Number of replicas per key, not counting the primary.
    pub replica_count: usize,
    /// Positions owned by each physical node.
    pub vnodes_per_node: u16,
    /// Hash function used to place nodes and keys.
    pub partitioner: PartitionerKind,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            replica_count: 0,
            vnodes_per_node: 1,
            partitioner: PartitionerKind::default(),
        }
    }
}

impl RingConfig {
    pub fn new(replica_count: usize) -> Self {
        Self {
            replica_count,
            ..Self::default()
        }
    }

    pub fn with_vnodes(mut self, vnodes_per_node: u16) -> Self {
        self.vnodes_per_node = vnodes_per_node;
        self
    }

    pub fn with_partitioner(mut self, partitioner: PartitionerKind) -> Self {
        self.partitioner = partitioner;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.vnodes_per_node == 0 {
            return Err(Error::InvalidConfig(
                "vnodes_per_node must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RingConfig::default();
        assert_eq!(config.replica_count, 0);
        assert_eq!(config.vnodes_per_node, 1);
        assert_eq!(config.partitioner, PartitionerKind::Xxh3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_vnodes_rejected() {
        let config = RingConfig::new(3).with_vnodes(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RingConfig =
            serde_json::from_str(r#"{"replica_count": 2, "partitioner": "blake3"}"#).unwrap();
        assert_eq!(config.replica_count, 2);
        assert_eq!(config.vnodes_per_node, 1);
        assert_eq!(config.partitioner, PartitionerKind::Blake3);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let parsed = serde_json::from_str::<RingConfig>(r#"{"replicas": 2}"#);
        assert!(parsed.is_err());
    }
}
