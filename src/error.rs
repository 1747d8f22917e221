//! Error handling for plugin-channels
//!
//! This module defines the crate error type, the numeric status codes
//! reported back to the host, and a Result alias used throughout the crate.

use crate::property::PropertyType;
use thiserror::Error;

/// Status codes returned to the host from plugin message handling
pub mod error_codes {
    pub const OK: u64 = 0;
    pub const INTERNAL_ERROR: u64 = 0x8000_0001;
    pub const UNSUPPORTED_MESSAGE: u64 = 0x8000_0002;
    pub const INVALID_INPUT_PARAMETER: u64 = 0x8000_0003;
    pub const NOT_CONNECTED: u64 = 0x8000_0004;
}

/// Main error type for plugin-channels operations
#[derive(Error, Debug)]
pub enum PluginError {
    /// The requested value kind disagrees with the stored kind
    #[error("Type mismatch for property '{name}': requested {expected}, stored {actual}")]
    TypeMismatch {
        name: String,
        expected: PropertyType,
        actual: PropertyType,
    },

    /// No payload to read (or no entry with that name in a list)
    #[error("Absent value: {0}")]
    AbsentValue(String),

    /// Malformed or unrecognized markup
    #[error("Parse error: {0}")]
    Parse(String),

    /// Errors raised by the XML reader/writer
    #[error("Markup error: {0}")]
    Markup(String),

    /// Generating this telegram would corrupt the protocol
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A channel can only be the output of a single task
    #[error("Channel {channel} is already owned by task {task}")]
    ChannelOwned { channel: u32, task: u64 },

    /// Message id not handled by the registry
    #[error("Unsupported plugin message {0}")]
    UnknownMessage(u32),

    /// No host attached, or the host rejected a message
    #[error("Host error: {0}")]
    Host(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PluginError>,
    },
}

impl PluginError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PluginError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Status code reported to the host for this error
    pub fn status_code(&self) -> u64 {
        match self {
            PluginError::TypeMismatch { .. }
            | PluginError::AbsentValue(_)
            | PluginError::Parse(_)
            | PluginError::Markup(_)
            | PluginError::ChannelOwned { .. } => error_codes::INVALID_INPUT_PARAMETER,
            PluginError::UnknownMessage(_) => error_codes::UNSUPPORTED_MESSAGE,
            PluginError::Host(_) => error_codes::NOT_CONNECTED,
            PluginError::InvariantViolation(_) | PluginError::Config(_) | PluginError::Io(_) => {
                error_codes::INTERNAL_ERROR
            }
            PluginError::WithContext { source, .. } => source.status_code(),
        }
    }

    /// Shorthand for a type mismatch on a named property
    pub fn type_mismatch(
        name: impl Into<String>,
        expected: PropertyType,
        actual: PropertyType,
    ) -> Self {
        PluginError::TypeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }
}

impl From<quick_xml::Error> for PluginError {
    fn from(err: quick_xml::Error) -> Self {
        PluginError::Markup(err.to_string())
    }
}

/// Result type alias for plugin-channels operations
pub type Result<T> = std::result::Result<T, PluginError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PluginError::AbsentValue("Range".to_string());
        assert_eq!(err.to_string(), "Absent value: Range");
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = PluginError::type_mismatch("rate", PropertyType::Scalar, PropertyType::String);
        let text = err.to_string();
        assert!(text.contains("rate"));
        assert!(text.contains("Scalar"));
        assert!(text.contains("String"));
    }

    #[test]
    fn test_error_with_context() {
        let err = PluginError::Parse("test".to_string());
        let with_ctx = err.with_context("UpdateConfig");
        assert!(with_ctx.to_string().contains("UpdateConfig"));
        assert_eq!(with_ctx.status_code(), error_codes::INVALID_INPUT_PARAMETER);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            PluginError::UnknownMessage(99).status_code(),
            error_codes::UNSUPPORTED_MESSAGE
        );
        assert_eq!(
            PluginError::InvariantViolation("id".into()).status_code(),
            error_codes::INTERNAL_ERROR
        );
    }
}
