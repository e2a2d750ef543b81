//! Error types for trellis_core

use thiserror::Error;

/// Errors raised while building or walking scopes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// A required scope, parent scope, or override context was missing
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for trellis_core operations
pub type Result<T> = std::result::Result<T, ScopeError>;
