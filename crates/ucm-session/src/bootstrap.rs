//! Session bootstrap: load the persisted artifact or build one interactively.

use crate::error::ConfigError;
use crate::prompt::{is_yes, Prompter};
use crate::session::{is_ip_literal, SessionConfig};
use crate::store::{ConfigStore, PersistedConfig};
use crate::trust::TrustStore;
use secrecy::SecretString;
use std::path::Path;
use tracing::{debug, info, info_span, instrument, warn, Span};

pub const USERNAME_PROMPT: &str = "UCM AXL Username: ";
pub const PASSWORD_PROMPT: &str = "UCM Password: ";
pub const HOST_PROMPT: &str = "UCM hostname or IP Address: ";
pub const VERIFY_PROMPT: &str = "Use Certificates (y/n): ";
pub const IP_NOTICE: &str = "NOTE: Certificates cannot be used if an IP Address is provided";

/// Establishes the [`SessionConfig`] once per process.
pub struct SessionBootstrap {
    store: ConfigStore,
    trust: TrustStore,
    span: Span,
}

impl SessionBootstrap {
    pub fn new(store: ConfigStore, trust: TrustStore) -> Self {
        Self {
            store,
            trust,
            span: info_span!("session_bootstrap"),
        }
    }

    /// Attach log output to a caller-provided span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn trust(&self) -> &TrustStore {
        &self.trust
    }

    /// Load the persisted session.
    ///
    /// A session persisted with verification on whose anchor has gone missing
    /// fetches the anchor again; if that fails verification is turned off.
    #[instrument(parent = &self.span, skip(self))]
    pub async fn load(&self) -> Result<SessionConfig, ConfigError> {
        let persisted = self.store.load().await?;

        let session = SessionConfig::new(
            persisted.url.clone(),
            persisted.username.clone(),
            SecretString::new(persisted.password.clone()),
        )
        .map_err(|e| ConfigError::Corrupt {
            path: self.store.path().to_path_buf(),
            reason: e.to_string(),
        })?;

        if !persisted.verify {
            info!("Loaded session for {} (verification disabled)", session.host());
            return Ok(session);
        }

        let anchor = Path::new(&persisted.verify_file);
        if !persisted.verify_file.is_empty() && anchor.is_file() {
            if let Ok(verified) = session.clone().with_trust_anchor(anchor) {
                info!("Loaded session for {} (verification enabled)", verified.host());
                return Ok(verified);
            }
        }

        warn!(
            "Trust anchor {:?} for {} is unavailable, fetching again",
            persisted.verify_file,
            session.host()
        );
        let session = self.attach_trust_anchor(session).await;
        if PersistedConfig::from(&session) != persisted {
            self.store.save(&PersistedConfig::from(&session)).await?;
        }
        Ok(session)
    }

    /// Prompt for credentials and host, resolve the trust anchor if wanted,
    /// persist the result and return it.
    #[instrument(parent = &self.span, skip(self, prompter))]
    pub async fn build_interactively<P>(&self, prompter: &mut P) -> Result<SessionConfig, ConfigError>
    where
        P: Prompter + ?Sized,
    {
        debug!("Building new session artifact");
        let prompt_err = |e: std::io::Error| ConfigError::Prompt(e.to_string());

        let username = prompter.prompt(USERNAME_PROMPT).map_err(prompt_err)?;
        let password = prompter.prompt_secret(PASSWORD_PROMPT).map_err(prompt_err)?;
        prompter.notice(IP_NOTICE).map_err(prompt_err)?;
        let host = prompter.prompt(HOST_PROMPT).map_err(prompt_err)?;

        let session = SessionConfig::new(host, username, SecretString::new(password))?;

        let session = if is_ip_literal(session.host()) {
            debug!("Bypassing certificate download for IP address {}", session.host());
            session
        } else {
            let answer = prompter.prompt(VERIFY_PROMPT).map_err(prompt_err)?;
            if is_yes(&answer) {
                self.attach_trust_anchor(session).await
            } else {
                debug!("Bypassing certificate download");
                session
            }
        };

        self.store.save(&PersistedConfig::from(&session)).await?;
        info!(
            "Session artifact written to {:?} (verify={})",
            self.store.path(),
            session.verify()
        );
        Ok(session)
    }

    /// Load the persisted session, or bootstrap a new one when it is missing
    /// or corrupt. A corrupt artifact is deleted first.
    pub async fn load_or_bootstrap<P>(&self, prompter: &mut P) -> Result<SessionConfig, ConfigError>
    where
        P: Prompter + ?Sized,
    {
        match self.load().await {
            Ok(session) => Ok(session),
            Err(ConfigError::Missing(path)) => {
                info!("No session artifact at {:?}, generating a new one", path);
                self.build_interactively(prompter).await
            }
            Err(ConfigError::Corrupt { path, reason }) => {
                warn!("Session artifact {:?} unusable ({}), removing it", path, reason);
                self.store.delete().await?;
                self.build_interactively(prompter).await
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve and attach the anchor, falling back to an unverified session.
    async fn attach_trust_anchor(&self, session: SessionConfig) -> SessionConfig {
        if is_ip_literal(session.host()) {
            warn!("Certificates cannot be used with IP address {}", session.host());
            return session.without_verification();
        }

        match self.trust.resolve_trust_anchor(session.host()).await {
            Ok(path) => match session.clone().with_trust_anchor(&path) {
                Ok(verified) => verified,
                Err(e) => {
                    warn!("Trust anchor rejected, verification disabled: {}", e);
                    session.without_verification()
                }
            },
            Err(e) => {
                warn!("Certificate download failed, verification disabled: {}", e);
                session.without_verification()
            }
        }
    }
}
