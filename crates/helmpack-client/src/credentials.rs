//! Registry credentials
//!
//! Supplied on the command line or through `HELMPACK_REGISTRY_USER` and
//! `HELMPACK_REGISTRY_PASSWORD`. The password never appears in `Debug`
//! output or logs.

use crate::error::{ClientError, Result};

/// Environment variable holding the registry user
pub const USER_ENV: &str = "HELMPACK_REGISTRY_USER";

/// Environment variable holding the registry password
pub const PASSWORD_ENV: &str = "HELMPACK_REGISTRY_PASSWORD";

/// Username and password for a private registry
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl RegistryCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Resolve credentials from explicit values, falling back to the environment
    pub fn resolve(username: Option<String>, password: Option<String>) -> Result<Self> {
        let username = username
            .or_else(|| std::env::var(USER_ENV).ok())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ClientError::AuthFailed {
                message: format!("No registry user given and {} not set", USER_ENV),
            })?;
        let password = password
            .or_else(|| std::env::var(PASSWORD_ENV).ok())
            .ok_or_else(|| ClientError::AuthFailed {
                message: format!("No registry password given and {} not set", PASSWORD_ENV),
            })?;

        Ok(Self { username, password })
    }
}

impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
