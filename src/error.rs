//! Error types for the status bar context engine.

use thiserror::Error;

/// Context registry and manager errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("Context not found: {0}")]
    NotFound(String),

    #[error("{0} used after dispose")]
    UseAfterDispose(&'static str),
}

/// Status bar boundary errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatusBarError {
    #[error("Status item {0} already registered")]
    DuplicateItem(String),

    #[error("Context {0} has already been registered")]
    DuplicateContext(String),

    #[error(transparent)]
    Context(#[from] ContextError),
}

impl StatusBarError {
    /// True for both duplicate-registration variants.
    pub fn is_duplicate_registration(&self) -> bool {
        matches!(
            self,
            StatusBarError::DuplicateItem(_) | StatusBarError::DuplicateContext(_)
        )
    }
}

/// Top-level errors surfaced to the host
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error("Status bar error: {0}")]
    StatusBar(#[from] StatusBarError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
