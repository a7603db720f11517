//! Span and span batch data models.
//!
//! A [`SpanBatch`] is the unit of ingestion: one or more spans that all
//! belong to the same trace. The upstream distributor is responsible for
//! splitting mixed batches by trace ID before they reach the ingester.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Status code for a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    /// The span completed without error.
    #[default]
    Ok,
    /// The span encountered an error.
    Error,
    /// The span was cancelled.
    Cancelled,
}

impl std::fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error => write!(f, "error"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Kind of span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    /// Default span kind (internal operation).
    #[default]
    Internal,
    /// The span represents a server handling a request.
    Server,
    /// The span represents a client making a request.
    Client,
    /// The span represents a producer sending a message.
    Producer,
    /// The span represents a consumer receiving a message.
    Consumer,
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::Server => write!(f, "server"),
            Self::Client => write!(f, "client"),
            Self::Producer => write!(f, "producer"),
            Self::Consumer => write!(f, "consumer"),
        }
    }
}

/// A span representing a unit of work within a trace.
///
/// Trace and span identifiers are opaque byte sequences, hex-encoded in
/// JSON representations.
///
/// # Example
///
/// ```
/// use shared::models::{Span, SpanKind};
///
/// let span = Span::new(vec![0x01, 0x02], vec![0xaa], "HTTP GET /api/users", "api-service")
///     .with_kind(SpanKind::Server);
///
/// assert!(span.validate_span().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Span {
    /// Identifier of the trace this span belongs to.
    #[serde(with = "hex")]
    #[validate(length(min = 1, message = "Trace ID cannot be empty"))]
    pub trace_id: Vec<u8>,

    /// Unique identifier for this span.
    #[serde(with = "hex")]
    #[validate(length(min = 1, message = "Span ID cannot be empty"))]
    pub span_id: Vec<u8>,

    /// The parent span ID (None for root spans).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<Vec<u8>>,

    /// The name/operation of this span.
    #[validate(length(min = 1, message = "Span name cannot be empty"))]
    pub name: String,

    /// The service that generated this span.
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service: String,

    /// The kind of span.
    #[serde(default)]
    pub kind: SpanKind,

    /// The status of the span.
    #[serde(default)]
    pub status: SpanStatus,

    /// Timestamp when the span started.
    pub start_time: DateTime<Utc>,

    /// Timestamp when the span ended.
    pub end_time: DateTime<Utc>,
}

/// Errors that can occur when validating a span or a span batch.
#[derive(Debug, Error)]
pub enum BatchValidationError {
    /// The batch contains no spans.
    #[error("span batch must contain at least one span")]
    EmptyBatch,

    /// The trace ID is empty.
    #[error("trace ID cannot be empty")]
    EmptyTraceId,

    /// The span ID is empty.
    #[error("span ID cannot be empty")]
    EmptySpanId,

    /// A span in the batch carries a different trace ID than the first span.
    #[error("all spans in a batch must share one trace ID")]
    MixedTraceIds,

    /// The end time is before the start time.
    #[error("end time cannot be before start time")]
    InvalidTimeRange,

    /// Validation failed with details.
    #[error("validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

impl Span {
    /// Creates a new span with the current time as both start and end.
    #[must_use]
    pub fn new(
        trace_id: Vec<u8>,
        span_id: Vec<u8>,
        name: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            trace_id,
            span_id,
            parent_span_id: None,
            name: name.into(),
            service: service.into(),
            kind: SpanKind::default(),
            status: SpanStatus::default(),
            start_time: now,
            end_time: now,
        }
    }

    /// Sets the parent span ID.
    #[must_use]
    pub fn with_parent(mut self, parent_span_id: Vec<u8>) -> Self {
        self.parent_span_id = Some(parent_span_id);
        self
    }

    /// Sets the span kind.
    #[must_use]
    pub fn with_kind(mut self, kind: SpanKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the span status.
    #[must_use]
    pub fn with_status(mut self, status: SpanStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the start time.
    #[must_use]
    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }

    /// Sets the end time.
    #[must_use]
    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = end_time;
        self
    }

    /// Returns true if this is a root span (no parent).
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }

    /// Validates the span.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The trace ID is empty
    /// - The span ID is empty
    /// - The end time is before the start time
    /// - The name or service is empty
    pub fn validate_span(&self) -> Result<(), BatchValidationError> {
        if self.trace_id.is_empty() {
            return Err(BatchValidationError::EmptyTraceId);
        }
        if self.span_id.is_empty() {
            return Err(BatchValidationError::EmptySpanId);
        }
        if self.end_time < self.start_time {
            return Err(BatchValidationError::InvalidTimeRange);
        }
        self.validate()?;
        Ok(())
    }
}

/// A batch of spans that all belong to one trace.
///
/// The distributor separates incoming spans by trace ID, so a batch
/// arriving at the ingester carries exactly one trace ID across all of
/// its spans and is never empty. [`SpanBatch::validate_batch`] checks
/// both properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanBatch {
    /// The spans in this batch.
    pub spans: Vec<Span>,
}

impl SpanBatch {
    /// Creates a new batch from the given spans.
    #[must_use]
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    /// Returns the trace ID shared by the spans in this batch, if any.
    #[must_use]
    pub fn trace_id(&self) -> Option<&[u8]> {
        self.spans.first().map(|s| s.trace_id.as_slice())
    }

    /// Returns the number of spans in this batch.
    #[must_use]
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Returns true if the batch contains no spans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Validates the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The batch is empty
    /// - Any span fails [`Span::validate_span`]
    /// - Spans carry more than one distinct trace ID
    pub fn validate_batch(&self) -> Result<(), BatchValidationError> {
        let first = self.spans.first().ok_or(BatchValidationError::EmptyBatch)?;

        for span in &self.spans {
            span.validate_span()?;
            if span.trace_id != first.trace_id {
                return Err(BatchValidationError::MixedTraceIds);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_span_new() {
        let span = Span::new(vec![0x01], vec![0xaa], "GET /api", "api-service");

        assert_eq!(span.trace_id, vec![0x01]);
        assert_eq!(span.span_id, vec![0xaa]);
        assert_eq!(span.name, "GET /api");
        assert_eq!(span.service, "api-service");
        assert!(span.is_root());
        assert_eq!(span.status, SpanStatus::Ok);
    }

    #[test]
    fn test_span_with_parent() {
        let span =
            Span::new(vec![0x01], vec![0xbb], "DB query", "db-service").with_parent(vec![0xaa]);

        assert!(!span.is_root());
        assert_eq!(span.parent_span_id, Some(vec![0xaa]));
    }

    #[test]
    fn test_span_validation_empty_trace_id() {
        let span = Span::new(vec![], vec![0xaa], "operation", "service");
        assert!(matches!(
            span.validate_span(),
            Err(BatchValidationError::EmptyTraceId)
        ));
    }

    #[test]
    fn test_span_validation_invalid_time_range() {
        let start = Utc::now();
        let end = start - Duration::seconds(1);

        let span = Span::new(vec![0x01], vec![0xaa], "operation", "service")
            .with_start_time(start)
            .with_end_time(end);

        assert!(matches!(
            span.validate_span(),
            Err(BatchValidationError::InvalidTimeRange)
        ));
    }

    #[test]
    fn test_span_validation_empty_name() {
        let span = Span::new(vec![0x01], vec![0xaa], "", "service");
        assert!(matches!(
            span.validate_span(),
            Err(BatchValidationError::ValidationError(_))
        ));
    }

    #[test]
    fn test_span_serialization_hex_ids() {
        let span = Span::new(vec![0xde, 0xad], vec![0xbe, 0xef], "GET /api", "api")
            .with_kind(SpanKind::Server);

        let json = serde_json::to_string(&span).unwrap();

        assert!(json.contains("\"trace_id\":\"dead\""));
        assert!(json.contains("\"span_id\":\"beef\""));
        assert!(json.contains("\"kind\":\"server\""));
    }

    #[test]
    fn test_batch_trace_id() {
        let batch = SpanBatch::new(vec![
            Span::new(vec![0x01], vec![0xaa], "root", "api"),
            Span::new(vec![0x01], vec![0xbb], "child", "db"),
        ]);

        assert_eq!(batch.trace_id(), Some(&[0x01][..]));
        assert_eq!(batch.span_count(), 2);
    }

    #[test]
    fn test_batch_validation_empty() {
        let batch = SpanBatch::new(vec![]);
        assert!(matches!(
            batch.validate_batch(),
            Err(BatchValidationError::EmptyBatch)
        ));
        assert!(batch.is_empty());
    }

    #[test]
    fn test_batch_validation_mixed_trace_ids() {
        let batch = SpanBatch::new(vec![
            Span::new(vec![0x01], vec![0xaa], "root", "api"),
            Span::new(vec![0x02], vec![0xbb], "stray", "db"),
        ]);

        assert!(matches!(
            batch.validate_batch(),
            Err(BatchValidationError::MixedTraceIds)
        ));
    }

    #[test]
    fn test_span_status_display() {
        assert_eq!(SpanStatus::Ok.to_string(), "ok");
        assert_eq!(SpanStatus::Error.to_string(), "error");
        assert_eq!(SpanStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_span_kind_display() {
        assert_eq!(SpanKind::Server.to_string(), "server");
        assert_eq!(SpanKind::Client.to_string(), "client");
        assert_eq!(SpanKind::Internal.to_string(), "internal");
    }
}
