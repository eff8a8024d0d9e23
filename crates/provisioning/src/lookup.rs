use axl_client::{AxlError, Record};
use serde::Serialize;
use tracing::{debug, warn};

/// Outcome of an existence query.
///
/// Keeps "the server says it is absent" apart from "the server could not
/// answer".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Lookup {
    Found(Record),
    NotFound,
    TransportFailed(String),
}

impl Lookup {
    /// Interpret the result of a remote get.
    ///
    /// Only the item-not-found fault counts as absence. Any other fault
    /// (overload, throttling, database errors) leaves existence unknown.
    pub fn from_result(result: Result<Record, AxlError>) -> Self {
        match result {
            Ok(record) => Lookup::Found(record),
            Err(e) if e.is_not_found() => {
                debug!("Not found: {}", e);
                Lookup::NotFound
            }
            Err(e) => {
                warn!("Existence check failed: {}", e);
                Lookup::TransportFailed(e.to_string())
            }
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// The record, if found.
    pub fn found(self) -> Option<Record> {
        match self {
            Lookup::Found(record) => Some(record),
            _ => None,
        }
    }
}
