//! Error types for collaborator calls

use thiserror::Error;

use crate::registry::REQUEST_TIMEOUT_SECS;

/// Collaborator errors
#[derive(Debug, Error)]
pub enum ClientError {
    // ============ Process Errors ============
    #[error("'{binary}' not found in PATH")]
    ToolNotFound { binary: String },

    #[error("'{command}' failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Unexpected output from '{command}': {message}")]
    UnexpectedOutput { command: String, message: String },

    // ============ Runtime Errors ============
    #[error("Image not found: {reference}")]
    ImageNotFound { reference: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timeout after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("TLS error: {message}")]
    Tls { message: String },

    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    #[error("Invalid registry URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    // ============ Configuration Errors ============
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for collaborator calls
pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Whether the failure looks like a certificate problem
    pub fn is_tls(&self) -> bool {
        match self {
            ClientError::Tls { .. } => true,
            ClientError::CommandFailed { stderr, .. } => {
                let lower = stderr.to_lowercase();
                lower.contains("certificate") || lower.contains("x509") || lower.contains("tls")
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        let text = format!("{:?}", e).to_lowercase();
        if e.is_timeout() {
            ClientError::Timeout {
                seconds: REQUEST_TIMEOUT_SECS,
            }
        } else if e.is_connect() && (text.contains("certificate") || text.contains("tls")) {
            ClientError::Tls {
                message: e.to_string(),
            }
        } else if e.is_connect() {
            ClientError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else if let Some(status) = e.status() {
            ClientError::HttpError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            ClientError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_yaml::Error> for ClientError {
    fn from(e: serde_yaml::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::InvalidUrl {
            url: String::new(),
            reason: e.to_string(),
        }
    }
}
