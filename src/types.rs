//! Shared data model for input requests and responses.
//!
//! These types cross the worker/presentation boundary verbatim, so they carry
//! serde derives for logging and playback of request traffic.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A single request for human input, built by a provider and routed to the
/// presentation loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputRequest {
    /// Provider type id (e.g. `clarification`, `permission`).
    pub type_id: String,

    /// Correlation id assigned by the coordinator (`req_<n>`). Matches the
    /// response back to the blocked caller; never reused.
    pub request_id: String,

    /// Type-specific payload, validated by the provider before dispatch.
    pub data: Value,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// The human's answer to one [`InputRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputResponse {
    /// Correlation id of the request this answers.
    pub request_id: String,

    /// True when the operator dismissed the prompt without answering.
    pub cancelled: bool,

    /// Type-specific payload. Absent when the response is cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl InputResponse {
    /// Build an answered response carrying a payload.
    pub fn answered(request_id: impl Into<String>, data: Value) -> Self {
        Self {
            request_id: request_id.into(),
            cancelled: false,
            data: Some(data),
        }
    }

    /// Build a cancelled response with no payload.
    pub fn cancelled(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            cancelled: true,
            data: None,
        }
    }
}
