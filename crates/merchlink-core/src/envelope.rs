//! # Wire Envelopes
//!
//! Typed request/response envelopes exchanged with the host over the bound
//! transport.
//!
//! ## Wire Format (JSON)
//! Messages are serialized as tagged JSON using serde's adjacently tagged
//! enum for the reply discriminant:
//! ```json
//! { "method": "inventory.items", "correlation_id": "...", "payload": { ... } }
//! { "correlation_id": "...", "reply": { "type": "Ok", "payload": { ... } } }
//! ```
//!
//! A request envelope is consumed exactly once: dispatch takes it by value
//! and the transport owns it from there.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current envelope protocol version.
pub const PROTOCOL_VERSION: u32 = 1;

// =============================================================================
// Request
// =============================================================================

/// A single request to the host: method identifier, typed payload, and a
/// correlation id unique among in-flight requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Method identifier, e.g. `"inventory.items"`.
    pub method: String,

    /// Correlation id matched against the response.
    pub correlation_id: Uuid,

    /// Method-specific payload.
    pub payload: serde_json::Value,
}

impl RequestEnvelope {
    /// Builds a request with a fresh correlation id.
    pub fn new(method: impl Into<String>, payload: serde_json::Value) -> Self {
        RequestEnvelope {
            method: method.into(),
            correlation_id: Uuid::new_v4(),
            payload,
        }
    }
}

// =============================================================================
// Response
// =============================================================================

/// The host's response to a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Correlation id of the request being answered.
    pub correlation_id: Uuid,

    /// Payload or typed error discriminant.
    pub reply: HostReply,
}

impl ResponseEnvelope {
    /// Builds a success response for the given request.
    pub fn ok(correlation_id: Uuid, payload: serde_json::Value) -> Self {
        ResponseEnvelope {
            correlation_id,
            reply: HostReply::Ok(payload),
        }
    }

    /// Builds an error response for the given request.
    pub fn err(correlation_id: Uuid, code: HostErrorCode, message: impl Into<String>) -> Self {
        ResponseEnvelope {
            correlation_id,
            reply: HostReply::Err(HostError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Either a typed payload or a typed error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum HostReply {
    /// Success payload.
    Ok(serde_json::Value),

    /// Typed host error.
    Err(HostError),
}

/// A typed error returned by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostError {
    pub code: HostErrorCode,
    pub message: String,
}

/// Closed set of error discriminants the host may return.
///
/// Dispatch maps each discriminant to exactly one connector error kind;
/// there is no open-ended "other" code on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostErrorCode {
    /// Referenced entity absent on the host.
    NotFound,
    /// Host refused due to authorization.
    PermissionDenied,
    /// Arguments violated a host-side precondition.
    BadRequest,
    /// Host service temporarily unable to answer.
    Unavailable,
}
