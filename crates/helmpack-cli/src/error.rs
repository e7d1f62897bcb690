//! CLI error types with exit code handling

use miette::Diagnostic;
use thiserror::Error;

use helmpack_bundle::BundleError;
use helmpack_client::ClientError;
use helmpack_core::CoreError;
use helmpack_discovery::DiscoveryError;

use crate::exit_codes;

/// CLI error type carrying its exit code
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Chart source or chart content problem
    #[error("Chart error: {message}")]
    #[diagnostic(code(helmpack::cli::chart))]
    Chart {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Malformed bundle
    #[error("Bundle error: {message}")]
    #[diagnostic(code(helmpack::cli::bundle))]
    Bundle {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Registry credentials or connectivity
    #[error("Registry error: {message}")]
    #[diagnostic(code(helmpack::cli::registry))]
    Registry {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("IO error: {message}")]
    #[diagnostic(code(helmpack::cli::io))]
    Io { message: String },

    #[error("{message}")]
    #[diagnostic(code(helmpack::cli::error))]
    Other {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Chart { .. } => exit_codes::CHART_ERROR,
            CliError::Bundle { .. } => exit_codes::BUNDLE_ERROR,
            CliError::Registry { .. } => exit_codes::REGISTRY_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    pub fn chart(message: impl Into<String>) -> Self {
        Self::Chart {
            message: message.into(),
            help: None,
        }
    }

    pub fn bundle(message: impl Into<String>) -> Self {
        Self::Bundle {
            message: message.into(),
            help: None,
        }
    }

    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
            help: None,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::other(format!("JSON output failed: {}", err))
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        match &err {
            ClientError::ToolNotFound { binary } => CliError::Other {
                message,
                help: Some(format!(
                    "install '{}' or point helmpack at it in ~/.config/helmpack/config.yaml",
                    binary
                )),
            },
            ClientError::Io(_) => CliError::Io { message },
            _ if err.is_tls() => CliError::Registry {
                message,
                help: Some(
                    "the registry certificate was rejected; retry with --insecure".to_string(),
                ),
            },
            _ => CliError::registry(message),
        }
    }
}

impl From<DiscoveryError> for CliError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::Io(e) | DiscoveryError::Core(CoreError::Io(e)) => e.into(),
            DiscoveryError::UnsupportedSource { .. } => CliError::Chart {
                message: err.to_string(),
                help: Some(
                    "use a chart directory, a .tgz archive or an http(s):// or oci:// URL"
                        .to_string(),
                ),
            },
            other => CliError::chart(other.to_string()),
        }
    }
}

impl From<BundleError> for CliError {
    fn from(err: BundleError) -> Self {
        match err {
            BundleError::Io(e) | BundleError::Core(CoreError::Io(e)) => e.into(),
            BundleError::Output { .. } => CliError::Io {
                message: err.to_string(),
            },
            BundleError::Client(e) => e.into(),
            other => CliError::bundle(other.to_string()),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let source: CliError = DiscoveryError::SourceNotFound {
            source_path: "missing".to_string(),
        }
        .into();
        assert_eq!(source.exit_code(), exit_codes::CHART_ERROR);

        let bundle: CliError = BundleError::InvalidBundle {
            path: "x.helmpack.tgz".to_string(),
            message: "bundle.yaml not found".to_string(),
        }
        .into();
        assert_eq!(bundle.exit_code(), exit_codes::BUNDLE_ERROR);

        let io: CliError = DiscoveryError::Core(CoreError::Io(std::io::Error::other("denied"))).into();
        assert_eq!(io.exit_code(), exit_codes::IO_ERROR);

        let auth: CliError = ClientError::AuthFailed {
            message: "401".to_string(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_codes::REGISTRY_ERROR);
    }

    #[test]
    fn test_tls_errors_suggest_insecure() {
        let err: CliError = ClientError::Tls {
            message: "invalid peer certificate".to_string(),
        }
        .into();
        match err {
            CliError::Registry { help, .. } => assert!(help.unwrap().contains("--insecure")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
