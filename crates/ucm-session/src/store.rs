//! Persisted session artifact, plaintext or AES-GCM sealed.

use crate::error::ConfigError;
use crate::session::SessionConfig;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Context mixed into the passphrase when deriving the artifact key.
const KEY_DERIVATION_CONTEXT: &str = "ucm-session/config-artifact";

/// Nonce size for AES-GCM (96 bits = 12 bytes).
const NONCE_SIZE: usize = 12;

/// On-disk shape of the session artifact.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedConfig {
    pub username: String,
    pub password: String,
    pub url: String,
    pub verify: bool,
    #[serde(rename = "verifyFile", default)]
    pub verify_file: String,
}

impl fmt::Debug for PersistedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("url", &self.url)
            .field("verify", &self.verify)
            .field("verify_file", &self.verify_file)
            .finish()
    }
}

impl From<&SessionConfig> for PersistedConfig {
    fn from(session: &SessionConfig) -> Self {
        Self {
            username: session.username().to_string(),
            password: session.password().expose_secret().clone(),
            url: session.host().to_string(),
            verify: session.verify(),
            verify_file: session
                .verify_file()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Plain JSON artifact.
pub struct PlainStore {
    path: PathBuf,
}

/// JSON artifact sealed with a passphrase-derived AES-256-GCM key.
pub struct EncryptedStore {
    path: PathBuf,
    key: [u8; 32],
}

/// Storage backend for the session artifact.
pub enum ConfigStore {
    /// Credentials readable by anyone with file access
    Plain(PlainStore),
    /// Credentials sealed at rest
    Encrypted(EncryptedStore),
}

impl PlainStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn decode(&self, data: &[u8]) -> Result<PersistedConfig, ConfigError> {
        let config = serde_json::from_slice(data).map_err(|e| corrupt(&self.path, e))?;
        warn!(
            "Credentials in {:?} are stored in plaintext; set a config passphrase to encrypt them",
            self.path
        );
        Ok(config)
    }

    fn encode(&self, config: &PersistedConfig) -> Result<Vec<u8>, ConfigError> {
        warn!("Writing credentials to {:?} in plaintext", self.path);
        serde_json::to_vec(config).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

impl EncryptedStore {
    pub fn new(path: impl Into<PathBuf>, passphrase: &SecretString) -> Self {
        Self {
            path: path.into(),
            key: derive_key(passphrase),
        }
    }

    /// File format: [12 bytes nonce][ciphertext with auth tag]
    fn encode(&self, config: &PersistedConfig) -> Result<Vec<u8>, ConfigError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext =
            serde_json::to_vec(config).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let ciphertext = cipher.encrypt(nonce, plaintext.as_ref())?;

        let mut data = nonce_bytes.to_vec();
        data.extend(ciphertext);
        Ok(data)
    }

    fn decode(&self, data: &[u8]) -> Result<PersistedConfig, ConfigError> {
        if data.len() < NONCE_SIZE {
            return Err(corrupt(&self.path, "file too short"));
        }

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
        let plaintext = cipher
            .decrypt(nonce, &data[NONCE_SIZE..])
            .map_err(|_| corrupt(&self.path, "failed to decrypt (wrong passphrase or tampered file)"))?;

        serde_json::from_slice(&plaintext).map_err(|e| corrupt(&self.path, e))
    }
}

/// Derive a 32-byte key: SHA256(context || passphrase).
fn derive_key(passphrase: &SecretString) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(KEY_DERIVATION_CONTEXT.as_bytes());
    hasher.update(passphrase.expose_secret().as_bytes());
    let hash = hasher.finalize();

    let mut key = [0u8; 32];
    key.copy_from_slice(&hash);
    key
}

fn corrupt(path: &Path, reason: impl fmt::Display) -> ConfigError {
    ConfigError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

impl ConfigStore {
    /// Encrypted store when a passphrase is configured, plaintext otherwise.
    pub fn new(path: impl Into<PathBuf>, passphrase: Option<&SecretString>) -> Self {
        match passphrase {
            Some(passphrase) => {
                info!("Using encrypted session artifact");
                ConfigStore::Encrypted(EncryptedStore::new(path, passphrase))
            }
            None => {
                warn!("No config passphrase set, session artifact will be stored in plaintext");
                ConfigStore::Plain(PlainStore::new(path))
            }
        }
    }

    /// Force plaintext store.
    pub fn plain(path: impl Into<PathBuf>) -> Self {
        ConfigStore::Plain(PlainStore::new(path))
    }

    /// Force encrypted store.
    pub fn encrypted(path: impl Into<PathBuf>, passphrase: &SecretString) -> Self {
        ConfigStore::Encrypted(EncryptedStore::new(path, passphrase))
    }

    pub fn path(&self) -> &Path {
        match self {
            ConfigStore::Plain(s) => &s.path,
            ConfigStore::Encrypted(s) => &s.path,
        }
    }

    /// Check if an artifact file exists.
    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Read the artifact.
    ///
    /// `Missing` when there is no file, `Io` when it cannot be read, `Corrupt`
    /// when its content cannot be decoded. A plaintext artifact found by an
    /// encrypted store is sealed in place.
    pub async fn load(&self) -> Result<PersistedConfig, ConfigError> {
        let path = self.path();
        if !path.exists() {
            debug!("Session artifact not found at {:?}", path);
            return Err(ConfigError::Missing(path.to_path_buf()));
        }

        let data = fs::read(path).await?;
        let config = match self {
            ConfigStore::Plain(s) => s.decode(&data)?,
            ConfigStore::Encrypted(s) => match s.decode(&data) {
                Ok(config) => config,
                Err(e) => match serde_json::from_slice::<PersistedConfig>(&data) {
                    Ok(config) => {
                        warn!("Session artifact {:?} is plaintext, encrypting it", path);
                        self.save(&config).await?;
                        config
                    }
                    Err(_) => return Err(e),
                },
            },
        };

        debug!("Session artifact read from {:?}", path);
        Ok(config)
    }

    /// Write the artifact, replacing any existing one.
    pub async fn save(&self, config: &PersistedConfig) -> Result<(), ConfigError> {
        let data = match self {
            ConfigStore::Plain(s) => s.encode(config)?,
            ConfigStore::Encrypted(s) => s.encode(config)?,
        };

        let path = self.path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically using temp file + rename
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        restrict_permissions(&temp_path).await?;
        fs::rename(&temp_path, path).await?;

        debug!("Saved session artifact ({} bytes) to {:?}", data.len(), path);
        Ok(())
    }

    /// Remove the artifact. Returns whether a file was removed.
    pub async fn delete(&self) -> Result<bool, ConfigError> {
        match fs::remove_file(self.path()).await {
            Ok(()) => {
                info!("Removed session artifact {:?}", self.path());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersistedConfig {
        PersistedConfig {
            username: "axladmin".into(),
            password: "s3cret".into(),
            url: "ucm.example.com".into(),
            verify: true,
            verify_file: "/srv/ucm/ucm.example.com.pem".into(),
        }
    }

    #[test]
    fn test_artifact_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["username"], "axladmin");
        assert_eq!(json["url"], "ucm.example.com");
        assert_eq!(json["verify"], true);
        assert_eq!(json["verifyFile"], "/srv/ucm/ucm.example.com.pem");
    }

    #[test]
    fn test_artifact_without_verify_file() {
        let parsed: PersistedConfig = serde_json::from_str(
            r#"{"username":"a","password":"b","url":"10.0.0.5","verify":false}"#,
        )
        .unwrap();
        assert!(parsed.verify_file.is_empty());
    }

    #[test]
    fn test_debug_redacts_password() {
        assert!(!format!("{:?}", sample()).contains("s3cret"));
    }

    #[tokio::test]
    async fn test_plain_store_is_readable_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::plain(dir.path().join("ucm.cfg"));

        store.save(&sample()).await.unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"verifyFile\""));

        assert_eq!(store.load().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_encrypted_store_hides_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let passphrase = SecretString::new("correct horse".into());
        let store = ConfigStore::encrypted(dir.path().join("ucm.cfg"), &passphrase);

        store.save(&sample()).await.unwrap();
        let raw = std::fs::read(store.path()).unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("s3cret"));

        assert_eq!(store.load().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_wrong_passphrase_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ucm.cfg");

        ConfigStore::encrypted(&path, &SecretString::new("one".into()))
            .save(&sample())
            .await
            .unwrap();

        let result = ConfigStore::encrypted(&path, &SecretString::new("two".into()))
            .load()
            .await;
        assert!(matches!(result, Err(ConfigError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn test_missing_and_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::plain(dir.path().join("ucm.cfg"));

        assert!(matches!(store.load().await, Err(ConfigError::Missing(_))));
        assert!(!store.delete().await.unwrap());

        std::fs::write(store.path(), b"{\"username\": ").unwrap();
        assert!(matches!(store.load().await, Err(ConfigError::Corrupt { .. })));
        assert!(store.delete().await.unwrap());
        assert!(!store.exists());
    }

    #[tokio::test]
    async fn test_plaintext_artifact_sealed_by_passphrase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ucm.cfg");
        ConfigStore::plain(&path).save(&sample()).await.unwrap();

        let store = ConfigStore::encrypted(&path, &SecretString::new("correct horse".into()));
        assert_eq!(store.load().await.unwrap(), sample());

        let raw = std::fs::read(&path).unwrap();
        assert!(serde_json::from_slice::<PersistedConfig>(&raw).is_err());
        assert!(!String::from_utf8_lossy(&raw).contains("s3cret"));
        assert_eq!(store.load().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn test_unreadable_artifact_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::plain(dir.path().join("ucm.cfg"));
        std::fs::create_dir(store.path()).unwrap();

        assert!(matches!(store.load().await, Err(ConfigError::Io(_))));
        assert!(store.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_artifact_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::plain(dir.path().join("ucm.cfg"));
        store.save(&sample()).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
