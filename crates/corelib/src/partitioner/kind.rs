//! Runtime-selectable partitioner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::partitioner::{Blake3Partitioner, Partitioner, Sip128Partitioner, Xxh3Partitioner};
use crate::ring::HashPosition;

/// Partitioner chosen by name, e.g. from a config file or command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionerKind {
    #[default]
    Xxh3,
    Blake3,
    Sip128,
}

impl PartitionerKind {
    pub const ALL: [PartitionerKind; 3] = [
        PartitionerKind::Xxh3,
        PartitionerKind::Blake3,
        PartitionerKind::Sip128,
    ];

    /// Short name accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionerKind::Xxh3 => "xxh3",
            PartitionerKind::Blake3 => "blake3",
            PartitionerKind::Sip128 => "sip128",
        }
    }
}

impl Partitioner for PartitionerKind {
    fn partition(&self, key: &[u8]) -> HashPosition {
        match self {
            PartitionerKind::Xxh3 => Xxh3Partitioner.partition(key),
            PartitionerKind::Blake3 => Blake3Partitioner.partition(key),
            PartitionerKind::Sip128 => Sip128Partitioner.partition(key),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PartitionerKind::Xxh3 => Xxh3Partitioner.name(),
            PartitionerKind::Blake3 => Blake3Partitioner.name(),
            PartitionerKind::Sip128 => Sip128Partitioner.name(),
        }
    }
}

impl fmt::Display for PartitionerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartitionerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PartitionerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "unknown partitioner {s:?} (expected xxh3, blake3 or sip128)"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitioners_are_deterministic() {
        for kind in PartitionerKind::ALL {
            assert_eq!(kind.partition(b"node1"), kind.partition(b"node1"));
            assert_ne!(kind.partition(b"node1"), kind.partition(b"node2"));
        }
    }

    #[test]
    fn test_partitioners_differ() {
        let key = b"same-input";
        let xxh3 = PartitionerKind::Xxh3.partition(key);
        let blake3 = PartitionerKind::Blake3.partition(key);
        let sip = PartitionerKind::Sip128.partition(key);
        assert_ne!(xxh3, blake3);
        assert_ne!(blake3, sip);
    }

    #[test]
    fn test_dispatch_matches_concrete() {
        assert_eq!(
            PartitionerKind::Blake3.partition(b"k"),
            Blake3Partitioner.partition(b"k")
        );
        assert_eq!(PartitionerKind::Xxh3.name(), "Xxh3Partitioner");
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("xxh3".parse::<PartitionerKind>(), Ok(PartitionerKind::Xxh3));
        assert_eq!("BLAKE3".parse::<PartitionerKind>(), Ok(PartitionerKind::Blake3));
        assert!(matches!(
            "md5".parse::<PartitionerKind>(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&PartitionerKind::Sip128).unwrap();
        assert_eq!(json, "\"sip128\"");
    }
}
