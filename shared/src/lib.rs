//! Spanlake Shared Library
//!
//! This crate contains the types shared between the Spanlake ingestion core
//! and any surrounding transport or query surface.
//!
//! # Modules
//!
//! - [`models`] - Span batches and the serialized trace record
//! - [`config`] - Tenant limits and ingester tuning
//!
//! # Example
//!
//! ```
//! use shared::models::{Span, SpanBatch};
//!
//! let batch = SpanBatch::new(vec![
//!     Span::new(vec![0x01], vec![0xaa], "HTTP GET /api/users", "api-service"),
//! ]);
//!
//! assert!(batch.validate_batch().is_ok());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod models;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
pub use validator;
