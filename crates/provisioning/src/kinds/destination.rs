use crate::error::ProvisionError;
use crate::kind::{require, Dependency, EntityKind};
use crate::kinds::profile::{profile_name, ProfileEntity};
use axl_client::{record, ObjectKind, Record};
use serde_json::Value;

pub const ANSWER_TOO_SOON_MS: u32 = 1500;
pub const ANSWER_TOO_LATE_MS: u32 = 19000;
pub const DELAY_BEFORE_RINGING_MS: u32 = 4000;

/// Field the schema marks required but which excludes
/// `remoteDestinationProfileName`. Never sent.
pub const DUAL_MODE_DEVICE_FIELD: &str = "dualModeDeviceName";

/// Mobile number that rings alongside a user's desk line.
pub struct DestinationEntity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSpec {
    pub destination: String,
    pub userid: String,
}

impl EntityKind for DestinationEntity {
    const OBJECT: ObjectKind = ObjectKind::RemoteDestination;
    type Key = String;
    type Spec = DestinationSpec;

    fn criteria(destination: &String) -> Record {
        record([("destination", destination.as_str())])
    }

    fn key(spec: &DestinationSpec) -> String {
        spec.destination.clone()
    }

    fn compose(spec: &DestinationSpec) -> Result<Record, ProvisionError> {
        require(Self::OBJECT, "destination", &spec.destination)?;
        require(Self::OBJECT, "userid", &spec.userid)?;

        Ok(record([
            ("name", Value::from(format!("RD{}", spec.userid))),
            ("destination", spec.destination.as_str().into()),
            ("answerTooSoonTimer", ANSWER_TOO_SOON_MS.into()),
            ("answerTooLateTimer", ANSWER_TOO_LATE_MS.into()),
            ("delayBeforeRingingCell", DELAY_BEFORE_RINGING_MS.into()),
            ("ownerUserId", spec.userid.as_str().into()),
            ("remoteDestinationProfileName", profile_name(&spec.userid).into()),
            ("isMobilePhone", "true".into()),
            ("enableMobileConnect", "true".into()),
        ]))
    }

    fn dependency(spec: &DestinationSpec) -> Option<Dependency> {
        let name = profile_name(&spec.userid);
        Some(Dependency {
            kind: ProfileEntity::OBJECT,
            criteria: ProfileEntity::criteria(&name),
            key: name,
        })
    }
}
