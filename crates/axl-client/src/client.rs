//! AXL SOAP-over-HTTPS client.

use crate::api::AdminApi;
use crate::error::AxlError;
use crate::soap;
use crate::types::*;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, info_span, instrument, warn, Span};

/// Schema version used when none is configured.
pub const DEFAULT_SCHEMA_VERSION: &str = "11.5";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest response excerpt written to the transport log.
const LOG_EXCERPT_CHARS: usize = 2000;

/// Administrative API client bound to one server endpoint.
///
/// The password is stored using `SecretString` to prevent accidental
/// exposure in logs or debug output.
#[derive(Clone)]
pub struct AxlClient {
    client: Client,
    endpoint: String,
    username: String,
    password: SecretString,
    schema_version: String,
    span: Span,
}

impl AxlClient {
    /// Create a new AXL client.
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
        tls: &TlsMode,
        timeout: Duration,
    ) -> Result<Self, AxlError> {
        let endpoint = endpoint.into();
        let mut builder = Client::builder().timeout(timeout);

        match tls {
            TlsMode::Verify(anchor) => {
                let pem = std::fs::read(anchor)
                    .map_err(|e| AxlError::TrustAnchor(format!("{}: {}", anchor.display(), e)))?;
                let certificate = reqwest::Certificate::from_pem(&pem)?;
                builder = builder.add_root_certificate(certificate);
                info!("Session security enabled, trusting {}", anchor.display());
            }
            TlsMode::Insecure => {
                warn!("Session security disabled, server certificate will not be validated");
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        let span = info_span!("axl", endpoint = %endpoint);

        Ok(Self {
            client: builder.build()?,
            endpoint,
            username: username.into(),
            password,
            schema_version: DEFAULT_SCHEMA_VERSION.into(),
            span,
        })
    }

    /// Use a different schema version for the namespace and SOAPAction header.
    pub fn with_schema_version(mut self, version: impl Into<String>) -> Self {
        self.schema_version = version.into();
        self
    }

    /// Attach log output to a caller-provided span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Get the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the configured schema version.
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Fetch the server's active software version.
    pub async fn server_version(&self) -> Result<String, AxlError> {
        let value = self.invoke("getCCMVersion", None, &Record::new()).await?;
        value
            .pointer("/componentVersion/version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AxlError::UnexpectedResponse("missing componentVersion".into()))
    }

    /// Health check - returns true if the API answers with credentials accepted.
    pub async fn health_check(&self) -> bool {
        self.server_version().await.is_ok()
    }

    /// Issue one SOAP operation and return the decoded `<return>` content.
    #[instrument(parent = &self.span, skip(self, wrapper, body))]
    async fn invoke(
        &self,
        operation: &str,
        wrapper: Option<&str>,
        body: &Record,
    ) -> Result<Value, AxlError> {
        let namespace = soap::axl_namespace(&self.schema_version);
        let envelope = soap::request_envelope(&namespace, operation, wrapper, body)?;
        debug!("Request: {}", envelope);

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .header("Content-Type", "text/xml; charset=utf-8")
            .header(
                "SOAPAction",
                format!("\"CUCM:DB ver={} {}\"", self.schema_version, operation),
            )
            .body(envelope)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle HTTP response, converting faults and status codes to errors.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value, AxlError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Authentication failed");
            return Err(AxlError::Unauthorized);
        }

        let body = response.text().await?;
        debug!(
            "Response ({}): {}",
            status,
            body.chars().take(LOG_EXCERPT_CHARS).collect::<String>()
        );

        match soap::parse_response(&body) {
            Ok(value) if status.is_success() => Ok(value),
            Err(fault @ AxlError::Fault { .. }) => {
                debug!("Server fault: {}", fault);
                Err(fault)
            }
            Err(e) if status.is_success() => Err(e),
            _ => Err(AxlError::Api {
                status: status.as_u16(),
                message: body,
            }),
        }
    }
}

/// Take the entity element out of a get response (`{"line": {...}}`).
fn into_entity(kind: ObjectKind, value: Value) -> Result<Record, AxlError> {
    match value {
        Value::Object(mut map) => match map.remove(kind.element_name()) {
            Some(Value::Object(entity)) => Ok(entity),
            Some(other) => Err(AxlError::UnexpectedResponse(format!(
                "{} element is not a structure: {}",
                kind.element_name(),
                other
            ))),
            None => Ok(map),
        },
        other => Err(AxlError::UnexpectedResponse(format!(
            "get{} returned {}",
            kind, other
        ))),
    }
}

/// Take the object uuid out of an add/update/remove response.
fn into_uuid(value: Value) -> Result<String, AxlError> {
    match value {
        Value::String(uuid) => Ok(uuid),
        other => Err(AxlError::UnexpectedResponse(format!(
            "expected uuid, got {}",
            other
        ))),
    }
}

#[async_trait]
impl AdminApi for AxlClient {
    async fn get(&self, kind: ObjectKind, criteria: Record) -> Result<Record, AxlError> {
        let value = self
            .invoke(&kind.operation(Verb::Get), None, &criteria)
            .await?;
        into_entity(kind, value)
    }

    async fn add(&self, kind: ObjectKind, record: Record) -> Result<String, AxlError> {
        let value = self
            .invoke(
                &kind.operation(Verb::Add),
                Some(kind.element_name()),
                &record,
            )
            .await?;
        into_uuid(value)
    }

    async fn update(&self, kind: ObjectKind, record: Record) -> Result<String, AxlError> {
        let value = self
            .invoke(&kind.operation(Verb::Update), None, &record)
            .await?;
        into_uuid(value)
    }

    async fn remove(&self, kind: ObjectKind, criteria: Record) -> Result<String, AxlError> {
        let value = self
            .invoke(&kind.operation(Verb::Remove), None, &criteria)
            .await?;
        into_uuid(value)
    }
}
