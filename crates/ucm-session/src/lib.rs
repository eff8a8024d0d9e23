//! Session setup for the UCM administrative API.
//!
//! Resolves the host, credentials and certificate verification mode once per
//! process:
//! - [`TrustStore`] fetches and caches the server certificate on first use
//! - [`ConfigStore`] persists the session artifact, optionally encrypted
//! - [`SessionBootstrap`] loads the artifact or prompts the operator for it

mod bootstrap;
mod error;
mod prompt;
mod session;
mod store;
mod trust;

pub use bootstrap::{
    SessionBootstrap, HOST_PROMPT, IP_NOTICE, PASSWORD_PROMPT, USERNAME_PROMPT, VERIFY_PROMPT,
};
pub use error::{ConfigError, TrustFetchError};
pub use prompt::{is_yes, Prompter, ScriptedPrompter, StdinPrompter};
pub use session::{is_ip_literal, SessionConfig, ADMIN_API_PORT};
pub use store::{ConfigStore, EncryptedStore, PersistedConfig, PlainStore};
pub use trust::{
    certificate_fingerprint, CertificateFetcher, TlsCertificateFetcher, TrustStore,
    DEFAULT_FETCH_TIMEOUT, TRUST_ANCHOR_PORT,
};
