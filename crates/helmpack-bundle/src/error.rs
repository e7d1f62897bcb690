//! Error types for bundle operations

use thiserror::Error;

use helmpack_client::ClientError;
use helmpack_core::CoreError;

/// Bundle errors
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Invalid bundle {path}: {message}")]
    InvalidBundle { path: String, message: String },

    #[error("Cannot write bundle to {path}: {message}")]
    Output { path: String, message: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bundle operations
pub type Result<T> = std::result::Result<T, BundleError>;

impl BundleError {
    pub(crate) fn invalid(path: &std::path::Path, message: impl Into<String>) -> Self {
        BundleError::InvalidBundle {
            path: path.display().to_string(),
            message: message.into(),
        }
    }
}
