//! Per-kind capabilities consumed by the provisioning engine.

use crate::error::ProvisionError;
use axl_client::{ObjectKind, Record};
use std::fmt;

/// An object that has to exist before another can be added.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub kind: ObjectKind,
    pub key: String,
    pub criteria: Record,
}

/// What the engine needs to know about one entity kind.
///
/// `compose` is pure: everything it needs is in `Self::Spec`, and a failure there
/// happens before any remote call.
pub trait EntityKind {
    /// Remote binding.
    const OBJECT: ObjectKind;

    /// Natural key.
    type Key: fmt::Display + Send + Sync;

    /// Everything needed to build an add payload.
    type Spec: Send + Sync;

    /// Remote criteria identifying the object with `key`.
    fn criteria(key: &Self::Key) -> Record;

    /// Natural key of the object `spec` describes.
    fn key(spec: &Self::Spec) -> Self::Key;

    /// Build the add payload.
    fn compose(spec: &Self::Spec) -> Result<Record, ProvisionError>;

    /// Object that must already exist for the add to be valid.
    fn dependency(_spec: &Self::Spec) -> Option<Dependency> {
        None
    }
}

/// Reject blank required values.
pub(crate) fn require(kind: ObjectKind, field: &str, value: &str) -> Result<(), ProvisionError> {
    if value.trim().is_empty() {
        Err(ProvisionError::invalid(kind, format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}
