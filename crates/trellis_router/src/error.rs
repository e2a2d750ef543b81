//! Error types for trellis_router

use thiserror::Error;

/// Errors that can occur while resolving instruction components
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// A loaded module exposed nothing to render
    #[error("Failed to load component Type from resolved Promise since no export was specified.")]
    NoExport,

    /// A loaded module exposed several exports and none of them is `default`
    #[error(
        "Failed to load component Type from resolved Promise since no 'default' export was specified when having multiple exports ({0} exports)."
    )]
    AmbiguousExport(usize),

    /// Resolution needed a container but none was supplied
    #[error("No container available when trying to resolve component '{0}'")]
    NoContainer(String),

    /// The pending load itself failed
    #[error("Component load failed: {0}")]
    Load(String),

    /// Another caller holds the pending load
    #[error("Component load is already in flight")]
    LoadInFlight,

    /// Router configuration could not be parsed
    #[error("Invalid router configuration: {0}")]
    Config(String),
}

/// Result type for trellis_router operations
pub type Result<T> = std::result::Result<T, RouterError>;
