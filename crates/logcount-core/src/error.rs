//! Shared error type across logcount crates.

use thiserror::Error;

/// Stable error codes, used in logs and asserted on by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Plugin settings failed validation.
    Configuration,
    /// Host could not supply an output pack or accept an injected message.
    ResourceUnavailable,
    /// Operation invoked on a plugin that has not been configured.
    NotConfigured,
    /// Pipeline document could not be parsed or failed schema checks.
    InvalidConfig,
    /// No plugin registered under the requested name.
    UnknownPlugin,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Configuration => "CONFIGURATION",
            ErrorCode::ResourceUnavailable => "RESOURCE_UNAVAILABLE",
            ErrorCode::NotConfigured => "NOT_CONFIGURED",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::UnknownPlugin => "UNKNOWN_PLUGIN",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, LogCountError>;

/// Unified error type used by core and pipeline.
#[derive(Debug, Error)]
pub enum LogCountError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),
    #[error("plugin not configured")]
    NotConfigured,
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl LogCountError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LogCountError::Configuration(_) => ErrorCode::Configuration,
            LogCountError::ResourceUnavailable(_) => ErrorCode::ResourceUnavailable,
            LogCountError::NotConfigured => ErrorCode::NotConfigured,
            LogCountError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            LogCountError::UnknownPlugin(_) => ErrorCode::UnknownPlugin,
            LogCountError::Internal(_) => ErrorCode::Internal,
        }
    }
}
