use crate::error::ProvisionError;
use crate::kind::{require, EntityKind};
use crate::kinds::line::LineKey;
use axl_client::{record, ObjectKind, Record};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

pub const COMMON_PHONE_CONFIG: &str = "Standard Common Phone Profile";
pub const LOCATION: &str = "Hub_None";

/// Softphone and mobile client device types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeviceType {
    /// Jabber for desktop
    Csf,
    /// Jabber for iPhone
    Tct,
    /// Jabber for Android
    Bot,
    /// Jabber for tablets
    Tab,
}

impl DeviceType {
    pub const ALL: [DeviceType; 4] = [DeviceType::Csf, DeviceType::Tct, DeviceType::Bot, DeviceType::Tab];

    pub fn code(self) -> &'static str {
        match self {
            DeviceType::Csf => "CSF",
            DeviceType::Tct => "TCT",
            DeviceType::Bot => "BOT",
            DeviceType::Tab => "TAB",
        }
    }

    /// Product name. The model carries the same value.
    pub fn product(self) -> &'static str {
        match self {
            DeviceType::Csf => "Cisco Unified Client Services Framework",
            DeviceType::Tct => "Cisco Dual Mode for iPhone",
            DeviceType::Bot => "Cisco Dual Mode for Android",
            DeviceType::Tab => "Cisco Jabber for Tablet",
        }
    }

    /// Device name for `username`: type code plus username, upper-cased.
    pub fn device_name(self, username: &str) -> String {
        format!("{}{}", self.code(), username).to_uppercase()
    }
}

impl FromStr for DeviceType {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CSF" => Ok(DeviceType::Csf),
            "TCT" => Ok(DeviceType::Tct),
            "BOT" => Ok(DeviceType::Bot),
            "TAB" => Ok(DeviceType::Tab),
            _ => Err(ProvisionError::UnknownDeviceType(s.to_string())),
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Phone with one line, owned by an end user.
pub struct PhoneEntity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneSpec {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub device_type: DeviceType,
    /// Line at index 1. It is not checked for existence.
    pub line: LineKey,
    /// Short extension shown in the label and description.
    pub extension: String,
    pub device_pool: String,
    pub calling_search_space: String,
}

impl PhoneSpec {
    pub fn device_name(&self) -> String {
        self.device_type.device_name(&self.username)
    }

    fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl EntityKind for PhoneEntity {
    const OBJECT: ObjectKind = ObjectKind::Phone;
    type Key = String;
    type Spec = PhoneSpec;

    fn criteria(name: &String) -> Record {
        record([("name", name.as_str())])
    }

    fn key(spec: &PhoneSpec) -> String {
        spec.device_name()
    }

    fn compose(spec: &PhoneSpec) -> Result<Record, ProvisionError> {
        require(Self::OBJECT, "username", &spec.username)?;
        require(Self::OBJECT, "line pattern", &spec.line.pattern)?;

        let name = spec.display_name();
        let product = spec.device_type.product();
        let line = json!({
            "index": 1,
            "dirn": spec.line.dirn(),
            "label": format!("{} {}", name, spec.extension),
            "display": name,
            "displayAscii": name,
            "associatedEndusers": { "enduser": { "userId": spec.username } },
        });

        Ok(record([
            ("name", Value::from(spec.device_name())),
            ("description", format!("{} x{}", name, spec.extension).into()),
            ("product", product.into()),
            ("model", product.into()),
            ("class", "Phone".into()),
            ("protocol", "SIP".into()),
            ("callingSearchSpaceName", spec.calling_search_space.as_str().into()),
            ("devicePoolName", spec.device_pool.as_str().into()),
            ("commonPhoneConfigName", COMMON_PHONE_CONFIG.into()),
            ("locationName", LOCATION.into()),
            ("lines", json!({ "line": line })),
            ("ownerUserName", spec.username.as_str().into()),
            ("mobilityUserIdName", spec.username.as_str().into()),
        ]))
    }
}
