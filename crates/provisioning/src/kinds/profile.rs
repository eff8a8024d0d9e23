use crate::error::ProvisionError;
use crate::kind::{require, EntityKind};
use crate::kinds::line::LineKey;
use crate::kinds::phone::DeviceType;
use axl_client::{record, ObjectKind, Record};
use serde_json::{json, Value};

const REMOTE_DESTINATION_PROFILE: &str = "Remote Destination Profile";

/// Profile name for `username`.
pub fn profile_name(username: &str) -> String {
    format!("RDP{}", username)
}

/// Remote destination profile tying a user's mobile destinations to a line.
pub struct ProfileEntity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSpec {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Line at index 1, embedded independently of the phone's line.
    pub line: LineKey,
    pub extension: String,
    pub device_pool: String,
    pub calling_search_space: String,
}

impl EntityKind for ProfileEntity {
    const OBJECT: ObjectKind = ObjectKind::RemoteDestinationProfile;
    type Key = String;
    type Spec = ProfileSpec;

    fn criteria(name: &String) -> Record {
        record([("name", name.as_str())])
    }

    fn key(spec: &ProfileSpec) -> String {
        profile_name(&spec.username)
    }

    fn compose(spec: &ProfileSpec) -> Result<Record, ProvisionError> {
        require(Self::OBJECT, "username", &spec.username)?;
        require(Self::OBJECT, "line pattern", &spec.line.pattern)?;

        let css = spec.calling_search_space.as_str();
        Ok(record([
            ("name", Value::from(profile_name(&spec.username))),
            (
                "description",
                format!("{} {} x{}", spec.first_name, spec.last_name, spec.extension).into(),
            ),
            ("product", REMOTE_DESTINATION_PROFILE.into()),
            ("model", REMOTE_DESTINATION_PROFILE.into()),
            ("class", REMOTE_DESTINATION_PROFILE.into()),
            ("protocol", "Remote Destination".into()),
            ("protocolSide", "User".into()),
            ("callingSearchSpaceName", css.into()),
            ("devicePoolName", spec.device_pool.as_str().into()),
            (
                "lines",
                json!({ "line": { "index": 1, "dirn": spec.line.dirn() } }),
            ),
            ("callInfoPrivacyStatus", "Default".into()),
            ("userId", spec.username.as_str().into()),
            ("rerouteCallingSearchSpaceName", css.into()),
            (
                "primaryPhoneName",
                format!("{}{}", DeviceType::Csf.code(), spec.username).into(),
            ),
        ]))
    }
}
