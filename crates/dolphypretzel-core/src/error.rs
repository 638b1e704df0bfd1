//! Error types for dolphypretzel-core

use thiserror::Error;

/// Result type alias using dolphypretzel-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dolphypretzel-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before anything was written
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entry file missing from disk
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote push/pull failure; never fatal to the process
    #[error("Sync error: {0}")]
    Sync(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
