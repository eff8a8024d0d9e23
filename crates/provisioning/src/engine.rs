//! Generic existence-gated provisioning.

use crate::error::ProvisionError;
use crate::kind::EntityKind;
use crate::lookup::Lookup;
use axl_client::{AdminApi, ObjectKind, Record};
use serde::Serialize;
use tracing::{debug, info, info_span, instrument, Span};

/// Result of a successful add or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provisioned {
    pub uuid: String,
    /// Payload that was sent. For an update, the key criteria merged with the patch.
    pub record: Record,
}

/// Implements get/exists/add/update/delete once for every [`EntityKind`].
///
/// Holds no entity state: every read goes to the server. Adds are refused
/// when the object already exists, deletes never fail loudly.
pub struct Provisioner<A> {
    api: A,
    span: Span,
}

impl<A: AdminApi> Provisioner<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            span: info_span!("provisioner"),
        }
    }

    /// Attach log output to a caller-provided span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Query the server for the object with `key`.
    #[instrument(parent = &self.span, skip(self, key), fields(kind = %K::OBJECT, key = %key))]
    pub async fn lookup<K: EntityKind>(&self, key: &K::Key) -> Lookup {
        self.lookup_object(K::OBJECT, K::criteria(key)).await
    }

    /// The record, or `None` when absent or unreachable.
    pub async fn get<K: EntityKind>(&self, key: &K::Key) -> Option<Record> {
        self.lookup::<K>(key).await.found()
    }

    pub async fn exists<K: EntityKind>(&self, key: &K::Key) -> bool {
        self.lookup::<K>(key).await.is_found()
    }

    /// Create the object described by `spec` unless it already exists.
    ///
    /// Order: compose, dependency check, existence check, remote add. An
    /// existing object fails with `AlreadyExists` without any remote add.
    #[instrument(parent = &self.span, skip(self, spec), fields(kind = %K::OBJECT))]
    pub async fn add<K: EntityKind>(&self, spec: &K::Spec) -> Result<Provisioned, ProvisionError> {
        let key = K::key(spec);
        let record = K::compose(spec)?;

        if let Some(dependency) = K::dependency(spec) {
            match self
                .lookup_object(dependency.kind, dependency.criteria)
                .await
            {
                Lookup::Found(_) => {}
                Lookup::NotFound => {
                    return Err(ProvisionError::MissingDependency {
                        kind: dependency.kind,
                        key: dependency.key,
                    })
                }
                Lookup::TransportFailed(message) => return Err(ProvisionError::Transport(message)),
            }
        }

        match self.lookup::<K>(&key).await {
            Lookup::Found(_) => {
                info!("{} {} already exists", K::OBJECT, key);
                return Err(ProvisionError::AlreadyExists {
                    kind: K::OBJECT,
                    key: key.to_string(),
                });
            }
            Lookup::NotFound => {}
            Lookup::TransportFailed(message) => return Err(ProvisionError::Transport(message)),
        }

        debug!("Adding {} {}: {:?}", K::OBJECT, key, record);
        let uuid = self
            .api
            .add(K::OBJECT, record.clone())
            .await
            .map_err(|e| ProvisionError::from_remote(K::OBJECT, e))?;

        info!("Added {} {} ({})", K::OBJECT, key, uuid);
        Ok(Provisioned { uuid, record })
    }

    /// Apply `patch` to the object with `key`. No existence check.
    #[instrument(parent = &self.span, skip(self, key, patch), fields(kind = %K::OBJECT, key = %key))]
    pub async fn update<K: EntityKind>(
        &self,
        key: &K::Key,
        patch: Record,
    ) -> Result<Provisioned, ProvisionError> {
        let mut record = K::criteria(key);
        record.extend(patch);
        debug!("Updating {} {}: {:?}", K::OBJECT, key, record);

        let uuid = self
            .api
            .update(K::OBJECT, record.clone())
            .await
            .map_err(|e| ProvisionError::from_remote(K::OBJECT, e))?;

        info!("Updated {} {} ({})", K::OBJECT, key, uuid);
        Ok(Provisioned { uuid, record })
    }

    /// Remove the object with `key`. Failures are logged, never returned.
    #[instrument(parent = &self.span, skip(self, key), fields(kind = %K::OBJECT, key = %key))]
    pub async fn delete<K: EntityKind>(&self, key: &K::Key) -> bool {
        match self.api.remove(K::OBJECT, K::criteria(key)).await {
            Ok(uuid) => {
                info!("Removed {} {} ({})", K::OBJECT, key, uuid);
                true
            }
            Err(e) => {
                info!("Remove {} {} failed: {}", K::OBJECT, key, e);
                false
            }
        }
    }

    async fn lookup_object(&self, kind: ObjectKind, criteria: Record) -> Lookup {
        let lookup = Lookup::from_result(self.api.get(kind, criteria).await);
        if let Lookup::Found(record) = &lookup {
            debug!("Found {}: {:?}", kind, record);
        }
        lookup
    }
}
