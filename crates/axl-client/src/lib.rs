//! Administrative XML (AXL) client for Unified Communications Manager.

mod api;
mod client;
mod error;
pub mod soap;
mod types;

pub use api::AdminApi;
pub use client::{AxlClient, DEFAULT_SCHEMA_VERSION, DEFAULT_TIMEOUT};
pub use error::{AxlError, AXL_ITEM_NOT_FOUND};
pub use types::*;
