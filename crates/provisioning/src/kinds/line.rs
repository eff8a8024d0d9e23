use crate::error::ProvisionError;
use crate::kind::{require, EntityKind};
use axl_client::{record, ObjectKind, Record};
use serde_json::{json, Value};
use std::fmt;

/// Forwarding triggers that send the caller to voicemail. The server has no
/// default forwarding setting, so each one is populated explicitly.
pub const VOICEMAIL_FORWARDS: [&str; 10] = [
    "callForwardBusy",
    "callForwardBusyInt",
    "callForwardNoAnswer",
    "callForwardNoAnswerInt",
    "callForwardNoCoverage",
    "callForwardNoCoverageInt",
    "callForwardOnFailure",
    "callForwardAlternateParty",
    "callForwardNotRegistered",
    "callForwardNotRegisteredInt",
];

/// Directory number. Patterns are unique within a partition only.
pub struct LineEntity;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub pattern: String,
    pub partition: String,
}

impl LineKey {
    pub fn new(pattern: impl Into<String>, partition: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            partition: partition.into(),
        }
    }

    /// `dirn` reference used inside phone and profile line associations.
    pub fn dirn(&self) -> Value {
        json!({
            "pattern": self.pattern,
            "routePartitionName": self.partition,
        })
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.pattern, self.partition)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSpec {
    pub key: LineKey,
    pub first_name: String,
    pub last_name: String,
    pub usage: String,
    pub forward_to_voicemail: bool,
    pub voicemail_profile: String,
    /// Calling search space used by every forwarding trigger.
    pub forward_css: Option<String>,
    pub share_line_appearance_css: Option<String>,
}

impl LineSpec {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn optional(value: &Option<String>) -> Value {
    value.as_deref().map(Value::from).unwrap_or(Value::Null)
}

impl EntityKind for LineEntity {
    const OBJECT: ObjectKind = ObjectKind::Line;
    type Key = LineKey;
    type Spec = LineSpec;

    fn criteria(key: &LineKey) -> Record {
        record([
            ("pattern", key.pattern.as_str()),
            ("routePartitionName", key.partition.as_str()),
        ])
    }

    fn key(spec: &LineSpec) -> LineKey {
        spec.key.clone()
    }

    fn compose(spec: &LineSpec) -> Result<Record, ProvisionError> {
        require(Self::OBJECT, "pattern", &spec.key.pattern)?;

        let name = spec.display_name();
        let css = optional(&spec.forward_css);
        let voicemail = json!({
            "forwardToVoiceMail": spec.forward_to_voicemail.to_string(),
            "callingSearchSpaceName": css,
        });

        let mut line = record([
            ("pattern", Value::from(spec.key.pattern.as_str())),
            ("description", name.as_str().into()),
            ("usage", spec.usage.as_str().into()),
            ("routePartitionName", spec.key.partition.as_str().into()),
            (
                "callForwardAll",
                json!({
                    "forwardToVoiceMail": "false",
                    "callingSearchSpaceName": css,
                }),
            ),
        ]);
        for trigger in VOICEMAIL_FORWARDS {
            line.insert(trigger.into(), voicemail.clone());
        }
        line.insert("alertingName".into(), name.as_str().into());
        line.insert("asciiAlertingName".into(), name.as_str().into());
        line.insert(
            "shareLineAppearanceCssName".into(),
            optional(&spec.share_line_appearance_css),
        );
        line.insert(
            "voiceMailProfileName".into(),
            spec.voicemail_profile.as_str().into(),
        );
        Ok(line)
    }
}

/// Enterprise alternate number advertised for a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AltNumber {
    pub mask: String,
    pub partition: String,
}

impl AltNumber {
    pub fn patch(&self) -> Record {
        record([(
            "e164AltNum",
            json!({
                "numMask": self.mask,
                "isUrgent": "false",
                "addLocalRoutePartition": "true",
                "routePartition": self.partition,
                "advertiseGloballyIls": "true",
            }),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> LineSpec {
        LineSpec {
            key: LineKey::new("5551212", "Internal PAR"),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            usage: "Device".into(),
            forward_to_voicemail: true,
            voicemail_profile: "<None>".into(),
            forward_css: Some("CSS-Forward".into()),
            share_line_appearance_css: Some("Chicago".into()),
        }
    }

    #[test]
    fn test_every_forward_goes_to_voicemail() {
        let line = LineEntity::compose(&spec()).unwrap();

        for trigger in VOICEMAIL_FORWARDS {
            assert_eq!(line[trigger]["forwardToVoiceMail"], "true", "{}", trigger);
            assert_eq!(line[trigger]["callingSearchSpaceName"], "CSS-Forward");
        }
        assert_eq!(line["callForwardAll"]["forwardToVoiceMail"], "false");
        assert_eq!(line["callForwardAll"]["callingSearchSpaceName"], "CSS-Forward");
    }

    #[test]
    fn test_line_fields() {
        let line = LineEntity::compose(&spec()).unwrap();

        assert_eq!(line["pattern"], "5551212");
        assert_eq!(line["routePartitionName"], "Internal PAR");
        assert_eq!(line["usage"], "Device");
        assert_eq!(line["alertingName"], "Jane Doe");
        assert_eq!(line["asciiAlertingName"], "Jane Doe");
        assert_eq!(line["description"], "Jane Doe");
        assert_eq!(line["voiceMailProfileName"], "<None>");
        assert_eq!(line["shareLineAppearanceCssName"], "Chicago");
        assert_eq!(line.keys().next().map(String::as_str), Some("pattern"));
    }

    #[test]
    fn test_missing_css_is_empty() {
        let mut spec = spec();
        spec.forward_css = None;
        spec.share_line_appearance_css = None;

        let line = LineEntity::compose(&spec).unwrap();
        assert!(line["callForwardBusy"]["callingSearchSpaceName"].is_null());
        assert!(line["shareLineAppearanceCssName"].is_null());
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let mut spec = spec();
        spec.key.pattern = String::new();
        assert!(LineEntity::compose(&spec).is_err());
    }

    #[test]
    fn test_alt_number_patch() {
        let patch = AltNumber {
            mask: "1212".into(),
            partition: "Internal PAR".into(),
        }
        .patch();

        assert_eq!(patch["e164AltNum"]["numMask"], "1212");
        assert_eq!(patch["e164AltNum"]["routePartition"], "Internal PAR");
        assert_eq!(patch["e164AltNum"]["advertiseGloballyIls"], "true");
    }
}
