//! Error types for notebook import.

/// Result type for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Errors that can occur while importing a notebook.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The input did not parse as nbformat v4 JSON.
    #[error("invalid notebook JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The document declares an nbformat major version this importer
    /// doesn't understand.
    #[error("unsupported nbformat version: {0}")]
    UnsupportedFormat(u32),

    /// The core index algebra or cell operations layer rejected a request.
    #[error("index algebra error: {0}")]
    Algebra(#[from] cellorder_core::error::AlgebraError),
}
