//! Existence-gated provisioning of UCM users, lines, phones, remote
//! destination profiles and remote destinations.
//!
//! Adds are refused when the object already exists, updates are applied
//! unconditionally, and deletes are best effort. The server is the only
//! source of truth; nothing is cached.

mod engine;
mod error;
mod kind;
pub mod kinds;
mod lookup;
mod service;

pub use engine::{Provisioned, Provisioner};
pub use error::ProvisionError;
pub use kind::{Dependency, EntityKind};
pub use kinds::*;
pub use lookup::Lookup;
pub use service::{
    MobilityUser, OnboardReport, OnboardStep, ProvisioningDefaults, ProvisioningService,
    StepOutcome, DEFAULT_PARTITION, DEFAULT_USAGE, DEFAULT_VOICEMAIL_PROFILE,
};
