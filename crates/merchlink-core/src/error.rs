//! # Connector Error Taxonomy
//!
//! The closed set of failure kinds shared by every connector component.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Connector Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Caller Errors  │  │    Transport    │  │      Host Refusals      │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Validation     │  │  Binding        │  │  PermissionDenied       │ │
//! │  │  ThreadAffinity │  │  Transport      │  │  NotFound               │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  RETRY RULES                                                           │
//! │  ───────────                                                           │
//! │  Retried:      Binding, Transport (transient kinds only)              │
//! │  Never:        Validation, PermissionDenied, ThreadAffinity, NotFound │
//! │  Terminal:     Cancelled (an outcome, not a fault)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Every underlying fault maps to exactly one kind before reaching callers
//! 3. Errors are enum variants, never strings
//! 4. Raw transport errors never leak past the dispatch boundary

use thiserror::Error;

use crate::types::Environment;

/// Result type alias for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

// =============================================================================
// Transport Faults
// =============================================================================

/// A fault at the wire level: (de)serialization failures, malformed host
/// responses, closed channels, timed-out requests.
///
/// Transient kinds are eligible for retry when run under the retry policy;
/// the rest surface immediately.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportFault {
    /// Failed to serialize an outgoing request payload.
    #[error("Failed to serialize request: {0}")]
    Serialization(String),

    /// Failed to deserialize a host response payload.
    #[error("Failed to deserialize response: {0}")]
    Deserialization(String),

    /// The host produced a response the connector cannot interpret
    /// (wrong correlation id, unknown discriminant, truncated body).
    #[error("Malformed host response: {0}")]
    MalformedResponse(String),

    /// The bound channel closed while a request was in flight.
    #[error("Host channel closed")]
    ChannelClosed,

    /// No response arrived within the configured request timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl TransportFault {
    /// Returns true if this fault class is likely to succeed when retried.
    ///
    /// Encoding failures and malformed responses are deterministic and
    /// retrying them would produce the same outcome.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportFault::ChannelClosed | TransportFault::Timeout(_)
        )
    }
}

// =============================================================================
// Connector Error (the closed taxonomy)
// =============================================================================

/// Connector error type covering all failure kinds a caller can observe.
///
/// The taxonomy is closed: dispatch and the cache layer resolve every
/// underlying fault to exactly one of these variants.
#[derive(Debug, Clone, Error)]
pub enum ConnectorError {
    /// A caller-supplied argument violates a precondition.
    /// Checked locally, before any transport interaction. Never retried.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The host was unavailable, or the handshake was rejected or timed out.
    /// Retried transparently up to the configured bound before surfacing.
    #[error("Binding to {environment} host failed: {reason}")]
    Binding {
        environment: Environment,
        reason: String,
    },

    /// The host refused the request due to authorization. Never retried.
    #[error("Host denied '{method}': not authorized")]
    PermissionDenied { method: String },

    /// The operation was invoked on the guarded foreground thread.
    /// A programmer error: immediate, fatal to the call, never retried.
    #[error("'{method}' must not be called from the foreground thread")]
    ThreadAffinity { method: String },

    /// A wire-level fault. Retried only while the kind is transient.
    #[error("Transport fault: {0}")]
    Transport(#[from] TransportFault),

    /// A referenced entity does not exist on the host. Never retried.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// The call was cancelled before completing.
    ///
    /// This is a terminal outcome rather than a fault kind: it is never
    /// retried, never cached, and never produced by fault mapping.
    #[error("Operation cancelled")]
    Cancelled,
}

impl ConnectorError {
    /// Returns true if this error is recoverable and the operation can be
    /// retried under the retry policy.
    ///
    /// ## Retryable Errors
    /// - Binding failures (host unavailable, handshake timeout)
    /// - Transient transport faults (closed channel, request timeout)
    ///
    /// ## Non-Retryable Errors
    /// - Validation and thread-affinity violations (programmer errors)
    /// - Permission refusals and missing entities (host decisions)
    /// - Cancellation (terminal by definition)
    pub fn is_retryable(&self) -> bool {
        match self {
            ConnectorError::Binding { .. } => true,
            ConnectorError::Transport(fault) => fault.is_transient(),
            _ => false,
        }
    }

    /// Returns true if this error indicates a bug in the embedding
    /// application rather than a runtime condition.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ConnectorError::Validation(_) | ConnectorError::ThreadAffinity { .. }
        )
    }

    /// Returns true if the call ended in the cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConnectorError::Cancelled)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Argument validation errors.
///
/// These occur when a caller-supplied argument doesn't meet a precondition.
/// Validation runs locally and fails fast: no round trip is made for them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. unknown price-type code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The host rejected the arguments as violating one of its own
    /// preconditions (surfaced from a bad-request discriminant).
    #[error("Rejected by host: {reason}")]
    Rejected { reason: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
