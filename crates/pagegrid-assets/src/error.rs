//! Error types for asset tools and the fallback pipeline

use thiserror::Error;

/// Errors from a single external tool run
#[derive(Error, Debug)]
pub enum ToolError {
    /// The tool is not installed or could not be started
    #[error("Tool unavailable: {0}")]
    Unavailable(String),

    /// The tool ran and failed
    #[error("{tool} failed: {message}")]
    Failed { tool: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tool runs
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Errors that stop the pipeline itself
///
/// A failed asset is not an error; it is reported as
/// [`AssetState::Failed`](crate::AssetState::Failed).
#[derive(Error, Debug)]
pub enum AssetError {
    /// Writing emitted source or fallback files failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, AssetError>;
