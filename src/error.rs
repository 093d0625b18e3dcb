//! Unified error types for the input coordination core.

use std::fmt;

// ---------------------------------------------------------------------------
// InputError
// ---------------------------------------------------------------------------

/// Errors raised synchronously by `ask` and the registration surfaces.
///
/// Everything here is reported before any request reaches the presentation
/// loop; once a request has been dispatched, `ask` always resolves with an
/// [`crate::types::InputResponse`] rather than an error.
#[derive(Debug)]
pub enum InputError {
    /// `ask` was called before a delivery callback was installed.
    NotReady,
    /// `ask` named a type id with no registered provider.
    UnknownType(String),
    /// A second provider was registered under an already-taken type id.
    DuplicateType(String),
    /// Provider/handler pairing was attempted with differing type ids.
    HandlerMismatch { provider: String, handler: String },
    /// The outbound request payload failed the provider's shape check.
    InvalidRequest { type_id: String, message: String },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "no delivery callback installed"),
            Self::UnknownType(type_id) => write!(f, "unknown input type: {type_id}"),
            Self::DuplicateType(type_id) => {
                write!(f, "input type already registered: {type_id}")
            }
            Self::HandlerMismatch { provider, handler } => write!(
                f,
                "type id mismatch: provider has `{provider}`, handler has `{handler}`"
            ),
            Self::InvalidRequest { type_id, message } => {
                write!(f, "invalid request data for {type_id}: {message}")
            }
        }
    }
}

impl std::error::Error for InputError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_error_display() {
        assert_eq!(
            InputError::NotReady.to_string(),
            "no delivery callback installed"
        );
        assert_eq!(
            InputError::UnknownType("confirmation".into()).to_string(),
            "unknown input type: confirmation"
        );
        assert_eq!(
            InputError::DuplicateType("permission".into()).to_string(),
            "input type already registered: permission"
        );
    }

    #[test]
    fn handler_mismatch_names_both_sides() {
        let e = InputError::HandlerMismatch {
            provider: "clarification".into(),
            handler: "permission".into(),
        };
        let s = e.to_string();
        assert!(s.contains("`clarification`"), "got: {s}");
        assert!(s.contains("`permission`"), "got: {s}");
    }

    #[test]
    fn invalid_request_includes_field_detail() {
        let e = InputError::InvalidRequest {
            type_id: "clarification".into(),
            message: "questions list cannot be empty".into(),
        };
        assert_eq!(
            e.to_string(),
            "invalid request data for clarification: questions list cannot be empty"
        );
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let e = ConfigError::from(io_err);
        let s = e.to_string();
        assert!(s.starts_with("io:"), "got: {s}");
        assert!(s.contains("file not found"));
    }

    #[test]
    fn config_error_from_toml() {
        let toml_err: toml::de::Error = toml::from_str::<toml::Value>("x = [unclosed").unwrap_err();
        let e = ConfigError::from(toml_err);
        assert!(e.to_string().starts_with("toml:"));
    }
}
