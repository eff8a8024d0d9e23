//! Application settings loaded from environment variables.
//!
//! Variables use the `UCM` prefix and `__` as the nesting separator, for
//! example `UCM__SESSION__PASSPHRASE` or `UCM__DEFAULTS__PARTITION`.

use anyhow::{Context, Result};
use provisioning::{
    ProvisioningDefaults, DEFAULT_PARTITION, DEFAULT_USAGE, DEFAULT_VOICEMAIL_PROFILE,
};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Session artifact and trust anchors
    #[serde(default)]
    pub session: SessionSettings,

    /// Administrative API
    #[serde(default)]
    pub axl: AxlSettings,

    /// Log output
    #[serde(default)]
    pub log: LogSettings,

    /// Values used when a request leaves them out
    #[serde(default)]
    pub defaults: DefaultsSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_config_path")]
    pub config_path: PathBuf,

    /// Directory holding `<host>.pem` trust anchors
    #[serde(default = "default_trust_dir")]
    pub trust_dir: PathBuf,

    /// Encrypts the session artifact when set
    #[serde(default)]
    pub passphrase: Option<SecretString>,

    #[serde(default = "default_fetch_timeout", with = "humantime_serde")]
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AxlSettings {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for `writerDebug.log` and `axlTransport.log`
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsSettings {
    #[serde(default = "default_partition")]
    pub partition: String,

    #[serde(default = "default_usage")]
    pub usage: String,

    #[serde(default = "default_voicemail_profile")]
    pub voicemail_profile: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            trust_dir: default_trust_dir(),
            passphrase: None,
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

impl Default for AxlSettings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            timeout: default_timeout(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
        }
    }
}

impl Default for DefaultsSettings {
    fn default() -> Self {
        Self {
            partition: default_partition(),
            usage: default_usage(),
            voicemail_profile: default_voicemail_profile(),
        }
    }
}

impl DefaultsSettings {
    pub fn provisioning(&self) -> ProvisioningDefaults {
        ProvisioningDefaults {
            partition: self.partition.clone(),
            usage: self.usage.clone(),
            voicemail_profile: self.voicemail_profile.clone(),
        }
    }
}

// Default value functions
fn default_config_path() -> PathBuf {
    "ucm.cfg".into()
}

fn default_trust_dir() -> PathBuf {
    ".".into()
}

fn default_fetch_timeout() -> Duration {
    ucm_session::DEFAULT_FETCH_TIMEOUT
}

fn default_schema_version() -> String {
    axl_client::DEFAULT_SCHEMA_VERSION.into()
}

fn default_timeout() -> Duration {
    axl_client::DEFAULT_TIMEOUT
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_dir() -> PathBuf {
    ".".into()
}

fn default_partition() -> String {
    DEFAULT_PARTITION.into()
}

fn default_usage() -> String {
    DEFAULT_USAGE.into()
}

fn default_voicemail_profile() -> String {
    DEFAULT_VOICEMAIL_PROFILE.into()
}

impl Settings {
    /// Load settings from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("UCM")
                    .separator("__")
                    // Keep numbers such as partitions or extensions as strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
