use crate::error::ProvisionError;
use crate::kind::{require, EntityKind};
use crate::kinds::line::LineKey;
use axl_client::{record, ObjectKind, Record};
use serde_json::{json, Value};

pub const PRESENCE_GROUP: &str = "Standard Presence group";

/// Groups that give an end user CTI control of their devices.
pub const END_USER_GROUPS: [&str; 4] = [
    "Standard CTI Enabled",
    "Standard CCM End Users",
    "Standard CTI Allow Control of Phones supporting Connected Xfer and conf",
    "Standard CTI Allow Control of Phones supporting Rollover Mode",
];

pub const ATTENDEES_ACCESS_CODE: &str = "232323";

/// End user.
pub struct UserEntity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSpec {
    pub userid: String,
    pub first_name: String,
    pub last_name: String,
    pub mail: Option<String>,
    pub telephone_number: Option<String>,
}

impl EntityKind for UserEntity {
    const OBJECT: ObjectKind = ObjectKind::User;
    type Key = String;
    type Spec = UserSpec;

    fn criteria(userid: &String) -> Record {
        record([("userid", userid.as_str())])
    }

    fn key(spec: &UserSpec) -> String {
        spec.userid.clone()
    }

    fn compose(spec: &UserSpec) -> Result<Record, ProvisionError> {
        require(Self::OBJECT, "userid", &spec.userid)?;
        require(Self::OBJECT, "lastName", &spec.last_name)?;

        let mut user = record([
            ("firstName", spec.first_name.as_str()),
            ("lastName", spec.last_name.as_str()),
            ("userid", spec.userid.as_str()),
        ]);
        if let Some(mail) = &spec.mail {
            user.insert("mailid".into(), mail.as_str().into());
        }
        if let Some(number) = &spec.telephone_number {
            user.insert("telephoneNumber".into(), number.as_str().into());
        }
        user.insert("presenceGroupName".into(), PRESENCE_GROUP.into());
        Ok(user)
    }
}

/// Associates a user with their devices and primary line and enables
/// mobility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub userid: String,
    pub primary_extension: LineKey,
    /// Self-service id, usually the user's DID.
    pub self_service: String,
    pub devices: Vec<String>,
}

impl UserUpdate {
    pub fn patch(&self) -> Record {
        let groups: Vec<Value> = END_USER_GROUPS
            .iter()
            .map(|name| json!({ "name": name }))
            .collect();

        record([
            ("selfService", Value::from(self.self_service.as_str())),
            ("associatedDevices", json!({ "device": self.devices })),
            (
                "primaryExtension",
                json!({
                    "pattern": self.primary_extension.pattern,
                    "routePartitionName": self.primary_extension.partition,
                }),
            ),
            ("associatedGroups", json!({ "userGroup": groups })),
            ("homeCluster", "true".into()),
            ("imAndPresenceEnable", "true".into()),
            ("enableUserToHostConferenceNow", "true".into()),
            ("attendeesAccessCode", ATTENDEES_ACCESS_CODE.into()),
            ("enableMobility", "true".into()),
        ])
    }
}
