//! Remote administrative operations, one per verb and object kind.

use crate::error::AxlError;
use crate::types::{ObjectKind, Record};
use async_trait::async_trait;

/// Object/service client for the administrative API.
///
/// `kind` selects the remote operation (`getLine`, `addPhone`, ...). Criteria
/// and records are keyed by the remote schema's field names. Any non-success
/// response is an error; interpretation of "not found" is left to callers.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Fetch one object matching `criteria`.
    async fn get(&self, kind: ObjectKind, criteria: Record) -> Result<Record, AxlError>;

    /// Create an object, returning its uuid.
    async fn add(&self, kind: ObjectKind, record: Record) -> Result<String, AxlError>;

    /// Update the object identified by the key fields in `record`.
    async fn update(&self, kind: ObjectKind, record: Record) -> Result<String, AxlError>;

    /// Remove the object matching `criteria`.
    async fn remove(&self, kind: ObjectKind, criteria: Record) -> Result<String, AxlError>;
}
