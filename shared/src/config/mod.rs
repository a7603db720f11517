//! Configuration types for the ingestion pipeline.
//!
//! - [`limits`] - per-tenant admission limits with a global default
//! - [`ingester`] - cut/flush tuning for a tenant instance

pub mod ingester;
pub mod limits;

pub use ingester::IngesterConfig;
pub use limits::{LimitOverrides, TenantLimits};
