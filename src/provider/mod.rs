//! Pluggable input provider system.
//!
//! Each provider defines one kind of human-input exchange: a stable type id,
//! shape checks for the outbound request and inbound response, and request
//! construction. Providers are independent of threading and transport; the
//! coordinator and bridge route them without knowing their payload shapes.
//!
//! New exchange kinds are added by registering a provider together with a
//! matching presentation handler; the coordinator and bridge need no changes.

pub mod clarification;
pub mod permission;

use serde_json::Value;

use crate::types::InputRequest;

pub use clarification::ClarificationProvider;
pub use permission::{PermissionDecision, PermissionProvider};

// ---------------------------------------------------------------------------
// InputProvider trait
// ---------------------------------------------------------------------------

/// One kind of human-input exchange.
///
/// Implement this trait and register the instance (paired with a
/// presentation handler) through [`crate::bridge::Bridge::register_input_type`].
pub trait InputProvider: Send + Sync {
    /// Unique type id for this exchange kind (e.g. `"clarification"`).
    fn type_id(&self) -> &'static str;

    /// Check the outbound request payload.
    ///
    /// Runs before any dispatch to the presentation loop, so a malformed
    /// request never interrupts the operator. Returns a message naming the
    /// missing or invalid field.
    fn validate_request(&self, data: &Value) -> Result<(), String>;

    /// Check the inbound response payload.
    ///
    /// Runs after the operator answered, before the blocked caller resumes.
    /// Only called for non-cancelled responses; a cancelled response with no
    /// payload is always valid.
    fn validate_response(&self, data: &Value) -> Result<(), String> {
        let _ = data;
        Ok(())
    }

    /// Build the request value for this provider. Pure construction.
    fn build_request(&self, data: Value, request_id: &str) -> InputRequest {
        InputRequest {
            type_id: self.type_id().to_string(),
            request_id: request_id.to_string(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NoCheckProvider;

    impl InputProvider for NoCheckProvider {
        fn type_id(&self) -> &'static str {
            "confirmation"
        }

        fn validate_request(&self, _data: &Value) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn build_request_stamps_type_and_correlation_id() {
        let request = NoCheckProvider.build_request(json!({"message": "go?"}), "req_4");
        assert_eq!(request.type_id, "confirmation");
        assert_eq!(request.request_id, "req_4");
        assert_eq!(request.data, json!({"message": "go?"}));
    }

    #[test]
    fn response_validation_defaults_to_accepting() {
        assert!(NoCheckProvider.validate_response(&json!(null)).is_ok());
        assert!(NoCheckProvider.validate_response(&json!({"x": 1})).is_ok());
    }
}
