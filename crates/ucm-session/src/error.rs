//! Session bootstrap errors.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while acquiring a trust anchor.
#[derive(Error, Debug)]
pub enum TrustFetchError {
    #[error("Invalid hostname for trust anchor: {0:?}")]
    InvalidHost(String),

    #[error("Connection to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS handshake with {host} failed: {message}")]
    Handshake { host: String, message: String },

    #[error("TLS setup error: {0}")]
    Tls(String),

    #[error("Timed out fetching certificate from {0}")]
    Timeout(String),

    #[error("Server {0} presented no certificate")]
    NoCertificate(String),

    #[error("Failed to write trust anchor {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure loading, building or persisting the session configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config artifact not found at {0:?}")]
    Missing(PathBuf),

    #[error("Config artifact at {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Invalid session configuration: {0}")]
    Invalid(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),
}

impl From<aes_gcm::Error> for ConfigError {
    fn from(_: aes_gcm::Error) -> Self {
        ConfigError::Encryption("AES-GCM encryption/decryption failed".to_string())
    }
}
