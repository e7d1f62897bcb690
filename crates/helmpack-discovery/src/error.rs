//! Error types for discovery

use thiserror::Error;

use helmpack_core::CoreError;

/// Discovery errors
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Chart source not found: {source_path}")]
    SourceNotFound { source_path: String },

    #[error("Unsupported chart source: {source_path}")]
    UnsupportedSource { source_path: String },

    #[error("Failed to fetch chart {source_path}: {reason}")]
    FetchFailed { source_path: String, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for discovery
pub type Result<T> = std::result::Result<T, DiscoveryError>;
