//! AXL client errors.

use thiserror::Error;

/// AXL code returned when the requested item does not exist.
pub const AXL_ITEM_NOT_FOUND: u32 = 5007;

#[derive(Error, Debug)]
pub enum AxlError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("SOAP fault{}: {message}", fault_code(.code))]
    Fault { code: Option<u32>, message: String },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Trust anchor error: {0}")]
    TrustAnchor(String),
}

fn fault_code(code: &Option<u32>) -> String {
    code.map(|c| format!(" ({})", c)).unwrap_or_default()
}

impl AxlError {
    /// Build the fault the server returns for a missing item.
    pub fn not_found(what: impl AsRef<str>) -> Self {
        AxlError::Fault {
            code: Some(AXL_ITEM_NOT_FOUND),
            message: format!("Item not valid: The specified {} was not found", what.as_ref()),
        }
    }

    /// Whether the server reported that the addressed object does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            AxlError::Fault { code, message } => {
                *code == Some(AXL_ITEM_NOT_FOUND) || message.contains("was not found")
            }
            _ => false,
        }
    }

    /// Whether the failure happened before the server could judge the request.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AxlError::Http(_) | AxlError::Unauthorized | AxlError::Api { .. } | AxlError::Xml(_)
        )
    }
}
