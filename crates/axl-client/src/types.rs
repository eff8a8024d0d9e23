//! Object kinds, records and connection settings for the AXL API.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// Attribute bag keyed by the remote schema's field names.
///
/// Field order is significant: the schema declares every object as an XML
/// sequence, so records keep insertion order.
pub type Record = Map<String, Value>;

/// Object types managed through the administrative API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectKind {
    User,
    Line,
    Phone,
    RemoteDestinationProfile,
    RemoteDestination,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 5] = [
        ObjectKind::User,
        ObjectKind::Line,
        ObjectKind::Phone,
        ObjectKind::RemoteDestinationProfile,
        ObjectKind::RemoteDestination,
    ];

    /// Schema type name, as used in remote verbs (`getLine`, `addPhone`).
    pub fn type_name(self) -> &'static str {
        match self {
            ObjectKind::User => "User",
            ObjectKind::Line => "Line",
            ObjectKind::Phone => "Phone",
            ObjectKind::RemoteDestinationProfile => "RemoteDestinationProfile",
            ObjectKind::RemoteDestination => "RemoteDestination",
        }
    }

    /// Element wrapping an add payload and a get response (`line`, `phone`).
    pub fn element_name(self) -> &'static str {
        match self {
            ObjectKind::User => "user",
            ObjectKind::Line => "line",
            ObjectKind::Phone => "phone",
            ObjectKind::RemoteDestinationProfile => "remoteDestinationProfile",
            ObjectKind::RemoteDestination => "remoteDestination",
        }
    }

    /// Remote operation name for a verb.
    pub fn operation(self, verb: Verb) -> String {
        format!("{}{}", verb.as_str(), self.type_name())
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Remote verbs exposed for every object kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Add,
    Update,
    Remove,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Add => "add",
            Verb::Update => "update",
            Verb::Remove => "remove",
        }
    }
}

/// How the client validates the server certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Trust the PEM anchor at this path in addition to the system roots.
    Verify(PathBuf),
    /// Accept any certificate.
    Insecure,
}

/// Build a record from `(field, value)` pairs, preserving order.
pub fn record<I, K, V>(fields: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Read a string field from a record.
pub fn field_str<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}
