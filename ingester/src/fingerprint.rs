//! Trace fingerprints.
//!
//! A fingerprint is a deterministic, non-cryptographic 64-bit hash of a
//! trace ID, used solely as the live-map key for O(1) lookup. Two distinct
//! trace IDs hashing to the same fingerprint would be merged into one
//! trace; that collision risk is accepted and not disambiguated.

use xxhash_rust::xxh3::xxh3_64;

/// The live-map key derived from a trace ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceFingerprint(u64);

impl TraceFingerprint {
    /// Computes the fingerprint of the given trace ID.
    #[must_use]
    pub fn of(trace_id: &[u8]) -> Self {
        Self(xxh3_64(trace_id))
    }

    /// Returns the raw 64-bit value.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TraceFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = TraceFingerprint::of(&[0x01, 0x02, 0x03]);
        let b = TraceFingerprint::of(&[0x01, 0x02, 0x03]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_differs_for_distinct_ids() {
        let a = TraceFingerprint::of(&[0x01]);
        let b = TraceFingerprint::of(&[0x02]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_display_is_fixed_width_hex() {
        let fp = TraceFingerprint::of(&[0x01]);
        assert_eq!(fp.to_string().len(), 16);
    }
}
