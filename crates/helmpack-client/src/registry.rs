//! Registry HTTP API
//!
//! Only used for connectivity diagnostics. Image and chart transfer go
//! through the runtime and chart tool.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::credentials::RegistryCredentials;
use crate::error::{ClientError, Result};

/// Timeout applied to every API request
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

const SYSTEM_INFO_PATH: &str = "api/v2.0/systeminfo";

/// Subset of the registry's system information
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub harbor_version: Option<String>,
    #[serde(default)]
    pub registry_url: Option<String>,
    #[serde(default)]
    pub auth_mode: Option<String>,
    #[serde(default)]
    pub project_creation_restriction: Option<String>,
}

/// Client for the registry management API
pub struct RegistryApi {
    client: reqwest::Client,
    base: Url,
    credentials: RegistryCredentials,
}

impl RegistryApi {
    /// Create a client for `url`
    ///
    /// With `insecure`, certificate verification is disabled.
    pub fn new(url: &str, credentials: RegistryCredentials, insecure: bool) -> Result<Self> {
        let mut base = Url::parse(url).map_err(|e| ClientError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        if insecure {
            tracing::warn!("TLS certificate verification disabled for {}", url);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| ClientError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base,
            credentials,
        })
    }

    /// Fetch system information
    pub async fn system_info(&self) -> Result<SystemInfo> {
        let url = self.base.join(SYSTEM_INFO_PATH)?;
        tracing::debug!(url = %url, "requesting system info");

        let response = self
            .client
            .get(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ClientError::AuthFailed {
                message: format!("registry answered {}", status),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::HttpError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Host part of a registry URL: the scheme and trailing `/` are stripped
pub fn registry_host(url: &str) -> String {
    let without_scheme = match url.split_once("://") {
        Some((_, rest)) => rest,
        None => url,
    };
    without_scheme.trim_end_matches('/').to_string()
}
