//! Ingester tuning configuration.
//!
//! Controls when a tenant instance cuts idle traces into its head block
//! and when the flush driver considers that block ready for rotation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Tuning knobs for a tenant instance and its flush driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngesterConfig {
    /// How long a trace may go without an append before it is cut.
    #[serde(with = "duration_secs")]
    pub trace_idle_period: Duration,

    /// Number of traces in the head block that makes it ready for rotation.
    pub max_traces_per_block: usize,

    /// Age of the head block that makes it ready for rotation regardless
    /// of trace count.
    #[serde(with = "duration_secs")]
    pub max_block_lifetime: Duration,

    /// How often the flush driver runs the cut/ready/rotate cycle.
    #[serde(with = "duration_secs")]
    pub flush_check_period: Duration,

    /// Directory where head block files are written.
    pub wal_path: PathBuf,
}

impl Default for IngesterConfig {
    fn default() -> Self {
        Self {
            trace_idle_period: Duration::from_secs(30),
            max_traces_per_block: 50_000,
            max_block_lifetime: Duration::from_secs(60 * 60),
            flush_check_period: Duration::from_secs(10),
            wal_path: PathBuf::from("/var/spanlake/wal"),
        }
    }
}

impl IngesterConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `max_traces_per_block` is zero (every block would be immediately ready)
    /// - `max_block_lifetime` is zero
    /// - `flush_check_period` is zero
    pub fn validate(&self) -> Result<(), String> {
        if self.max_traces_per_block == 0 {
            return Err("max_traces_per_block must be greater than zero".to_string());
        }
        if self.max_block_lifetime.is_zero() {
            return Err("max_block_lifetime must be greater than zero".to_string());
        }
        if self.flush_check_period.is_zero() {
            return Err("flush_check_period must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Serde support for `Duration` as whole seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
