//! Payload composition for each entity kind.

pub mod destination;
pub mod line;
pub mod phone;
pub mod profile;
pub mod user;

pub use destination::{DestinationEntity, DestinationSpec};
pub use line::{AltNumber, LineEntity, LineKey, LineSpec};
pub use phone::{DeviceType, PhoneEntity, PhoneSpec};
pub use profile::{profile_name, ProfileEntity, ProfileSpec};
pub use user::{UserEntity, UserSpec, UserUpdate};
