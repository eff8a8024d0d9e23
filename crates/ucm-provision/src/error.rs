//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Session error: {0}")]
    Session(#[from] ucm_session::ConfigError),

    #[error("Trust anchor error: {0}")]
    Trust(#[from] ucm_session::TrustFetchError),

    #[error("AXL error: {0}")]
    Axl(#[from] axl_client::AxlError),

    #[error("Provisioning error: {0}")]
    Provision(#[from] provisioning::ProvisionError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    #[error("{kind} {key} is not available: {reason}")]
    Unavailable {
        kind: axl_client::ObjectKind,
        key: String,
        reason: String,
    },

    #[error("Onboarding of {0} did not complete")]
    Incomplete(String),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;
