//! Ring position implementation.

use std::fmt;

/// A position on the consistent hash ring.
///
/// Positions are 128-bit unsigned integers. The ordering is linear, but
/// lookups wrap from [`HashPosition::MAX`] back to [`HashPosition::MIN`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct HashPosition(pub u128);

impl HashPosition {
    /// Start of the ring.
    pub const MIN: HashPosition = HashPosition(u128::MIN);
    /// End of the ring.
    pub const MAX: HashPosition = HashPosition(u128::MAX);

    /// Interpret the first 16 bytes of a digest as a big-endian integer.
    ///
    /// # Panics
    ///
    /// Panics if `digest` is shorter than 16 bytes.
    pub fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        HashPosition(u128::from_be_bytes(bytes))
    }

    pub fn is_min(&self) -> bool {
        self.0 == u128::MIN
    }

    pub fn is_max(&self) -> bool {
        self.0 == u128::MAX
    }

    /// Clockwise distance from `self` to `other` on the ring.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> u128 {
        other.0.wrapping_sub(self.0)
    }

    /// Fraction of the whole ring covered by `distance`.
    pub(crate) fn fraction(distance: u128) -> f64 {
        distance as f64 / 2f64.powi(128)
    }
}

impl fmt::Display for HashPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl From<u128> for HashPosition {
    fn from(value: u128) -> Self {
        HashPosition(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_wraps() {
        let a = HashPosition(100);
        let b = HashPosition(200);
        assert_eq!(a.distance_to(&b), 100);
        assert_eq!(b.distance_to(&a), u128::MAX - 99);
        assert_eq!(HashPosition::MAX.distance_to(&HashPosition::MIN), 1);
    }

    #[test]
    fn test_from_digest_is_big_endian() {
        let mut digest = [0u8; 32];
        digest[15] = 1;
        assert_eq!(HashPosition::from_digest(&digest), HashPosition(1));
        digest[0] = 0x80;
        assert_eq!(HashPosition::from_digest(&digest).0 >> 127, 1);
    }

    #[test]
    fn test_display_is_fixed_width_hex() {
        assert_eq!(HashPosition(255).to_string(), format!("{:0>32}", "ff"));
        assert_eq!(HashPosition::MAX.to_string(), "f".repeat(32));
    }

    #[test]
    fn test_bounds() {
        assert!(HashPosition::MIN.is_min());
        assert!(HashPosition::MAX.is_max());
        assert!(HashPosition::MIN < HashPosition::MAX);
    }
}
