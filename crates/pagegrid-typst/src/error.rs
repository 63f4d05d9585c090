//! Error types for Typst emission and compilation

use thiserror::Error;

/// Result type for Typst operations
pub type Result<T> = std::result::Result<T, TypstError>;

/// Errors that can occur while compiling emitted Typst
#[derive(Error, Debug)]
pub enum TypstError {
    /// Typst compilation error
    #[error("Typst compilation failed: {0}")]
    Compilation(String),

    /// The compiler binary could not be started
    #[error("Typst compiler not available: {0}")]
    ToolMissing(String),

    /// Font loading error
    #[error("Font error: {0}")]
    Font(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
