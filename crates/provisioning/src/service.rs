//! Named provisioning operations per entity kind, and mobility onboarding.

use crate::engine::{Provisioned, Provisioner};
use crate::error::ProvisionError;
use crate::kind::EntityKind;
use crate::kinds::{
    profile_name, AltNumber, DestinationEntity, DestinationSpec, DeviceType, LineEntity, LineKey,
    LineSpec, PhoneEntity, PhoneSpec, ProfileEntity, ProfileSpec, UserEntity, UserSpec, UserUpdate,
};
use crate::lookup::Lookup;
use axl_client::{AdminApi, ObjectKind};
use serde::Serialize;
use tracing::{info, info_span, instrument, warn, Span};

pub const DEFAULT_PARTITION: &str = "Internal PAR";
pub const DEFAULT_USAGE: &str = "Device";
pub const DEFAULT_VOICEMAIL_PROFILE: &str = "<None>";

/// Site defaults applied when a request leaves them out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningDefaults {
    pub partition: String,
    pub usage: String,
    pub voicemail_profile: String,
}

impl Default for ProvisioningDefaults {
    fn default() -> Self {
        Self {
            partition: DEFAULT_PARTITION.to_string(),
            usage: DEFAULT_USAGE.to_string(),
            voicemail_profile: DEFAULT_VOICEMAIL_PROFILE.to_string(),
        }
    }
}

impl ProvisioningDefaults {
    pub fn line_key(&self, pattern: impl Into<String>) -> LineKey {
        LineKey::new(pattern, self.partition.clone())
    }

    /// Line forwarding every trigger to voicemail.
    pub fn line_spec(
        &self,
        pattern: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> LineSpec {
        LineSpec {
            key: self.line_key(pattern),
            first_name: first_name.into(),
            last_name: last_name.into(),
            usage: self.usage.clone(),
            forward_to_voicemail: true,
            voicemail_profile: self.voicemail_profile.clone(),
            forward_css: None,
            share_line_appearance_css: None,
        }
    }
}

/// Everything needed to give one user a softphone, a mobility profile and an
/// optional mobile destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobilityUser {
    pub userid: String,
    pub first_name: String,
    pub last_name: String,
    /// Full number of the user's line.
    pub pattern: String,
    /// Short enterprise extension, advertised as the alternate number.
    pub extension: String,
    pub did: String,
    pub device_pool: String,
    pub calling_search_space: String,
    pub device_type: DeviceType,
    pub mobile: Option<String>,
    pub forward_css: Option<String>,
    pub line_css: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Created { uuid: String },
    Existing,
    Updated { uuid: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnboardStep {
    pub object: ObjectKind,
    pub key: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Per-step record of an onboarding run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OnboardReport {
    pub userid: String,
    pub steps: Vec<OnboardStep>,
}

impl OnboardReport {
    /// True when no step failed.
    pub fn is_complete(&self) -> bool {
        !self
            .steps
            .iter()
            .any(|s| matches!(s.outcome, StepOutcome::Failed { .. }))
    }

    /// Record an add. Returns whether onboarding can continue.
    fn added(&mut self, object: ObjectKind, key: String, result: Result<Provisioned, ProvisionError>) -> bool {
        let outcome = match result {
            Ok(provisioned) => StepOutcome::Created {
                uuid: provisioned.uuid,
            },
            Err(ProvisionError::AlreadyExists { .. }) => StepOutcome::Existing,
            Err(e) => StepOutcome::Failed {
                error: e.to_string(),
            },
        };
        self.push(object, key, outcome)
    }

    fn updated(
        &mut self,
        object: ObjectKind,
        key: String,
        result: Result<Provisioned, ProvisionError>,
    ) -> bool {
        let outcome = match result {
            Ok(provisioned) => StepOutcome::Updated {
                uuid: provisioned.uuid,
            },
            Err(e) => StepOutcome::Failed {
                error: e.to_string(),
            },
        };
        self.push(object, key, outcome)
    }

    fn push(&mut self, object: ObjectKind, key: String, outcome: StepOutcome) -> bool {
        let ok = !matches!(outcome, StepOutcome::Failed { .. });
        if !ok {
            warn!("Onboarding {} stopped at {} {}: {:?}", self.userid, object, key, outcome);
        }
        self.steps.push(OnboardStep {
            object,
            key,
            outcome,
        });
        ok
    }
}

/// Provisioning operations for users, lines, phones, remote destination
/// profiles and remote destinations.
pub struct ProvisioningService<A> {
    engine: Provisioner<A>,
    defaults: ProvisioningDefaults,
    span: Span,
}

impl<A: AdminApi> ProvisioningService<A> {
    pub fn new(api: A) -> Self {
        let span = info_span!("provisioning");
        Self {
            engine: Provisioner::new(api).with_span(span.clone()),
            defaults: ProvisioningDefaults::default(),
            span,
        }
    }

    pub fn with_defaults(mut self, defaults: ProvisioningDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Attach log output to a caller-provided span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.engine = self.engine.with_span(span.clone());
        self.span = span;
        self
    }

    pub fn defaults(&self) -> &ProvisioningDefaults {
        &self.defaults
    }

    pub fn engine(&self) -> &Provisioner<A> {
        &self.engine
    }

    // Users

    pub async fn user_get(&self, userid: &str) -> Lookup {
        self.engine.lookup::<UserEntity>(&userid.to_string()).await
    }

    pub async fn user_exists(&self, userid: &str) -> bool {
        self.engine.exists::<UserEntity>(&userid.to_string()).await
    }

    /// Plain add. Directory-synchronized users are created by the sync.
    pub async fn user_add(&self, spec: &UserSpec) -> Result<Provisioned, ProvisionError> {
        self.engine.add::<UserEntity>(spec).await
    }

    pub async fn user_update(&self, update: &UserUpdate) -> Result<Provisioned, ProvisionError> {
        self.engine
            .update::<UserEntity>(&update.userid, update.patch())
            .await
    }

    pub async fn user_delete(&self, userid: &str) -> bool {
        self.engine.delete::<UserEntity>(&userid.to_string()).await
    }

    // Lines

    pub async fn line_get(&self, key: &LineKey) -> Lookup {
        self.engine.lookup::<LineEntity>(key).await
    }

    pub async fn line_exists(&self, key: &LineKey) -> bool {
        self.engine.exists::<LineEntity>(key).await
    }

    pub async fn line_add(&self, spec: &LineSpec) -> Result<Provisioned, ProvisionError> {
        self.engine.add::<LineEntity>(spec).await
    }

    /// Advertise `mask` as the line's enterprise alternate number.
    pub async fn line_set_alt_number(
        &self,
        key: &LineKey,
        mask: &str,
    ) -> Result<Provisioned, ProvisionError> {
        let alt = AltNumber {
            mask: mask.to_string(),
            partition: self.defaults.partition.clone(),
        };
        self.engine.update::<LineEntity>(key, alt.patch()).await
    }

    pub async fn line_delete(&self, key: &LineKey) -> bool {
        self.engine.delete::<LineEntity>(key).await
    }

    // Phones

    pub fn device_name(&self, username: &str, device_type: DeviceType) -> String {
        device_type.device_name(username)
    }

    pub async fn device_get(&self, name: &str) -> Lookup {
        self.engine.lookup::<PhoneEntity>(&name.to_string()).await
    }

    pub async fn device_exists(&self, name: &str) -> bool {
        self.engine.exists::<PhoneEntity>(&name.to_string()).await
    }

    /// Add a phone. Its line must have been added first.
    pub async fn device_add(&self, spec: &PhoneSpec) -> Result<Provisioned, ProvisionError> {
        self.engine.add::<PhoneEntity>(spec).await
    }

    pub async fn device_delete(&self, username: &str, device_type: DeviceType) -> bool {
        self.engine
            .delete::<PhoneEntity>(&self.device_name(username, device_type))
            .await
    }

    // Remote destination profiles

    pub async fn rdp_get(&self, name: &str) -> Lookup {
        self.engine.lookup::<ProfileEntity>(&name.to_string()).await
    }

    pub async fn rdp_exists(&self, name: &str) -> bool {
        self.engine.exists::<ProfileEntity>(&name.to_string()).await
    }

    pub async fn rdp_add(&self, spec: &ProfileSpec) -> Result<Provisioned, ProvisionError> {
        self.engine.add::<ProfileEntity>(spec).await
    }

    /// Remove the profile belonging to `username`.
    pub async fn rdp_delete(&self, username: &str) -> bool {
        self.engine
            .delete::<ProfileEntity>(&profile_name(username))
            .await
    }

    // Remote destinations

    pub async fn rdest_get(&self, destination: &str) -> Lookup {
        self.engine
            .lookup::<DestinationEntity>(&destination.to_string())
            .await
    }

    pub async fn rdest_exists(&self, destination: &str) -> bool {
        self.engine
            .exists::<DestinationEntity>(&destination.to_string())
            .await
    }

    /// Add a remote destination. The user's profile must exist.
    pub async fn rdest_add(&self, spec: &DestinationSpec) -> Result<Provisioned, ProvisionError> {
        self.engine.add::<DestinationEntity>(spec).await
    }

    pub async fn rdest_delete(&self, destination: &str) -> bool {
        self.engine
            .delete::<DestinationEntity>(&destination.to_string())
            .await
    }

    /// Provision line, phone, profile, destination and user association in
    /// dependency order, stopping at the first failure. Objects that already
    /// exist are kept.
    #[instrument(parent = &self.span, skip(self, user), fields(userid = %user.userid))]
    pub async fn onboard(&self, user: &MobilityUser) -> OnboardReport {
        let mut report = OnboardReport {
            userid: user.userid.clone(),
            steps: Vec::new(),
        };

        let mut line = self
            .defaults
            .line_spec(&user.pattern, &user.first_name, &user.last_name);
        line.forward_css = user.forward_css.clone();
        line.share_line_appearance_css = user.line_css.clone();
        let line_key = line.key.clone();
        let result = self.line_add(&line).await;
        if !report.added(LineEntity::OBJECT, line_key.to_string(), result) {
            return report;
        }

        let phone = PhoneSpec {
            username: user.userid.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            device_type: user.device_type,
            line: line_key.clone(),
            extension: user.extension.clone(),
            device_pool: user.device_pool.clone(),
            calling_search_space: user.calling_search_space.clone(),
        };
        let device_name = phone.device_name();
        let result = self.device_add(&phone).await;
        if !report.added(PhoneEntity::OBJECT, device_name.clone(), result) {
            return report;
        }

        let profile = ProfileSpec {
            username: user.userid.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            line: line_key.clone(),
            extension: user.extension.clone(),
            device_pool: user.device_pool.clone(),
            calling_search_space: user.calling_search_space.clone(),
        };
        let rdp_name = ProfileEntity::key(&profile);
        let result = self.rdp_add(&profile).await;
        if !report.added(ProfileEntity::OBJECT, rdp_name.clone(), result) {
            return report;
        }

        if let Some(mobile) = &user.mobile {
            let destination = DestinationSpec {
                destination: mobile.clone(),
                userid: user.userid.clone(),
            };
            let result = self.rdest_add(&destination).await;
            if !report.added(DestinationEntity::OBJECT, mobile.clone(), result) {
                return report;
            }
        }

        let update = UserUpdate {
            userid: user.userid.clone(),
            primary_extension: line_key.clone(),
            self_service: user.did.clone(),
            devices: vec![device_name, rdp_name],
        };
        let result = self.user_update(&update).await;
        if !report.updated(UserEntity::OBJECT, user.userid.clone(), result) {
            return report;
        }

        if user.extension != user.pattern {
            let result = self.line_set_alt_number(&line_key, &user.extension).await;
            report.updated(LineEntity::OBJECT, line_key.to_string(), result);
        }

        if report.is_complete() {
            info!("Onboarded {} ({} steps)", user.userid, report.steps.len());
        }
        report
    }
}
