//! Permission input provider.
//!
//! Asks the operator to allow or deny one operation on one resource.
//!
//! Request payload: `{"resource": "path/or/name", "operation": "read"}`.
//! Response payload: `{"decision": "deny" | "allow_once" | "allow_session"}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::InputProvider;

/// Stable type id for permission exchanges.
pub const PERMISSION_TYPE_ID: &str = "permission";

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Operator decision for a permission request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PermissionDecision {
    /// Refuse the operation.
    Deny,
    /// Allow this one operation without remembering it.
    AllowOnce,
    /// Allow and remember the grant for the rest of the session.
    AllowSession,
}

impl PermissionDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deny => "deny",
            Self::AllowOnce => "allow_once",
            Self::AllowSession => "allow_session",
        }
    }

    /// Read the decision out of a permission response payload.
    pub fn from_payload(data: &Value) -> Option<Self> {
        serde_json::from_value(data.get("decision")?.clone()).ok()
    }

    /// Build the permission response payload for this decision.
    pub fn into_payload(self) -> Value {
        json!({"decision": self.as_str()})
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Provider for permission requests.
pub struct PermissionProvider;

impl InputProvider for PermissionProvider {
    fn type_id(&self) -> &'static str {
        PERMISSION_TYPE_ID
    }

    fn validate_request(&self, data: &Value) -> Result<(), String> {
        if data.get("resource").and_then(Value::as_str).is_none() {
            return Err("resource is required".to_string());
        }
        if data.get("operation").and_then(Value::as_str).is_none() {
            return Err("operation is required".to_string());
        }
        Ok(())
    }

    fn validate_response(&self, data: &Value) -> Result<(), String> {
        match PermissionDecision::from_payload(data) {
            Some(_) => Ok(()),
            None => Err("response must carry a known `decision`".to_string()),
        }
    }
}

/// Build a permission request payload.
pub fn permission_payload(resource: &str, operation: &str) -> Value {
    json!({"resource": resource, "operation": operation})
}
