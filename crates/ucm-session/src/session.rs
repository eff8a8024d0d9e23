//! Resolved connection settings for one process.

use crate::error::ConfigError;
use secrecy::SecretString;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Port of the administrative API. Fixed by the server.
pub const ADMIN_API_PORT: u16 = 8443;

/// Endpoint, credentials and verification mode.
///
/// Verification is on exactly when a trust anchor is attached, and an anchor
/// can only be attached if its file exists, so `verify()` never disagrees
/// with `verify_file()`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    host: String,
    username: String,
    password: SecretString,
    verify_file: Option<PathBuf>,
}

impl SessionConfig {
    /// Create an unverified session.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
    ) -> Result<Self, ConfigError> {
        let host = host.into().trim().to_string();
        let username = username.into().trim().to_string();

        if host.is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        if username.is_empty() {
            return Err(ConfigError::Invalid("username must not be empty".into()));
        }

        Ok(Self {
            host,
            username,
            password,
            verify_file: None,
        })
    }

    /// Enable certificate verification against the PEM file at `path`.
    pub fn with_trust_anchor(mut self, path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if is_ip_literal(&self.host) {
            return Err(ConfigError::Invalid(format!(
                "certificates cannot be verified for IP address {}",
                self.host
            )));
        }
        if !path.is_file() {
            return Err(ConfigError::Invalid(format!(
                "trust anchor {:?} does not exist",
                path
            )));
        }
        self.verify_file = Some(path);
        Ok(self)
    }

    /// Drop certificate verification.
    pub fn without_verification(mut self) -> Self {
        self.verify_file = None;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn verify(&self) -> bool {
        self.verify_file.is_some()
    }

    pub fn verify_file(&self) -> Option<&Path> {
        self.verify_file.as_deref()
    }

    /// URL of the administrative API on this host.
    pub fn admin_api_url(&self) -> String {
        format!("https://{}:{}/axl/", self.host, ADMIN_API_PORT)
    }
}

/// True when `host` is a literal IP address rather than a hostname.
pub fn is_ip_literal(host: &str) -> bool {
    host.trim().parse::<IpAddr>().is_ok()
}
