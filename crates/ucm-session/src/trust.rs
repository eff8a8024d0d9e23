//! Trust-on-first-use certificate store.
//!
//! The first verified connection to a host has nothing to verify against, so
//! the server's leaf certificate is fetched over an unvalidated handshake and
//! pinned on disk as `<hostname>.pem`. Later sessions read the pinned file and
//! never touch the network.

use crate::error::TrustFetchError;
use async_trait::async_trait;
use pem::Pem;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{ring, verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, info_span, instrument, Span};

/// Port the anchor is fetched from.
pub const TRUST_ANCHOR_PORT: u16 = 443;

/// Default limit for connect plus handshake.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of a server's leaf certificate.
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    /// Return the DER-encoded leaf certificate presented by `host:port`.
    async fn fetch_leaf_certificate(&self, host: &str, port: u16)
        -> Result<Vec<u8>, TrustFetchError>;
}

/// Accepts whatever the server presents. Only used to read the certificate.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Fetches the leaf certificate with a raw rustls handshake.
pub struct TlsCertificateFetcher {
    config: Arc<ClientConfig>,
    timeout: Duration,
}

impl TlsCertificateFetcher {
    pub fn new(timeout: Duration) -> Result<Self, TrustFetchError> {
        let provider = Arc::new(ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| TrustFetchError::Tls(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
            .with_no_client_auth();

        Ok(Self {
            config: Arc::new(config),
            timeout,
        })
    }
}

#[async_trait]
impl CertificateFetcher for TlsCertificateFetcher {
    async fn fetch_leaf_certificate(
        &self,
        host: &str,
        port: u16,
    ) -> Result<Vec<u8>, TrustFetchError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| TrustFetchError::InvalidHost(host.to_string()))?;
        let connector = TlsConnector::from(self.config.clone());

        let handshake = async {
            let tcp = TcpStream::connect((host, port))
                .await
                .map_err(|source| TrustFetchError::Connect {
                    host: host.to_string(),
                    port,
                    source,
                })?;

            let tls = connector
                .connect(server_name, tcp)
                .await
                .map_err(|e| TrustFetchError::Handshake {
                    host: host.to_string(),
                    message: e.to_string(),
                })?;

            let (_, session) = tls.get_ref();
            session
                .peer_certificates()
                .and_then(|chain| chain.first())
                .map(|leaf| leaf.as_ref().to_vec())
                .ok_or_else(|| TrustFetchError::NoCertificate(host.to_string()))
        };

        tokio::time::timeout(self.timeout, handshake)
            .await
            .map_err(|_| TrustFetchError::Timeout(format!("{}:{}", host, port)))?
    }
}

/// Hex SHA-256 of a DER certificate, for comparison against the server's
/// certificate management page.
pub fn certificate_fingerprint(der: &[u8]) -> String {
    hex::encode(Sha256::digest(der))
}

/// On-disk cache of trust anchors, one PEM file per hostname.
#[derive(Clone)]
pub struct TrustStore {
    dir: PathBuf,
    port: u16,
    fetcher: Arc<dyn CertificateFetcher>,
    span: Span,
}

impl TrustStore {
    /// Create a store in `dir` that fetches missing anchors over TLS.
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, TrustFetchError> {
        Ok(Self::with_fetcher(
            dir,
            Arc::new(TlsCertificateFetcher::new(timeout)?),
        ))
    }

    /// Create a store with a custom certificate source.
    pub fn with_fetcher(dir: impl Into<PathBuf>, fetcher: Arc<dyn CertificateFetcher>) -> Self {
        Self {
            dir: dir.into(),
            port: TRUST_ANCHOR_PORT,
            fetcher,
            span: info_span!("trust_store"),
        }
    }

    /// Fetch from a port other than 443.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Attach log output to a caller-provided span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Directory holding the anchors.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the anchor for `host`, whether or not it exists yet.
    pub fn anchor_path(&self, host: &str) -> Result<PathBuf, TrustFetchError> {
        let valid = !host.is_empty()
            && !host.starts_with('.')
            && !host.contains(&['/', '\\', ':'][..])
            && !host.contains("..");
        if !valid {
            return Err(TrustFetchError::InvalidHost(host.to_string()));
        }
        Ok(self.dir.join(format!("{}.pem", host)))
    }

    /// The cached anchor for `host`, if one was written before.
    pub fn cached_anchor(&self, host: &str) -> Option<PathBuf> {
        self.anchor_path(host).ok().filter(|p| p.is_file())
    }

    /// Return the anchor for `host`, fetching and persisting it on first use.
    #[instrument(parent = &self.span, skip(self))]
    pub async fn resolve_trust_anchor(&self, host: &str) -> Result<PathBuf, TrustFetchError> {
        let path = self.anchor_path(host)?;
        if path.is_file() {
            debug!("Using cached trust anchor {:?}", path);
            return Ok(path);
        }

        info!("No trust anchor for {}, fetching from port {}", host, self.port);
        let der = self.fetcher.fetch_leaf_certificate(host, self.port).await?;
        info!(
            "Pinning certificate for {} (SHA-256 {})",
            host,
            certificate_fingerprint(&der)
        );
        let encoded = pem::encode(&Pem::new("CERTIFICATE", der));

        let write_err = |source: std::io::Error| TrustFetchError::Write {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).await.map_err(write_err)?;

        // Write atomically using temp file + rename
        let temp_path = path.with_extension("pem.tmp");
        fs::write(&temp_path, encoded.as_bytes())
            .await
            .map_err(write_err)?;
        fs::rename(&temp_path, &path).await.map_err(write_err)?;

        info!("Trust anchor saved to {:?}", path);
        Ok(path)
    }
}
