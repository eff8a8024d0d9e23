//! Command line interface.

use axl_client::ObjectKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use provisioning::{
    DestinationSpec, DeviceType, LineKey, LineSpec, MobilityUser, PhoneSpec, ProfileSpec,
    ProvisioningDefaults, UserUpdate,
};

#[derive(Debug, Parser)]
#[command(name = "ucm-provision", version, about = "Provision Jabber and mobility users on UCM")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the session artifact if needed and check the connection
    Init {
        /// Discard the existing artifact and prompt again
        #[arg(long)]
        force: bool,
    },
    /// Fetch an object
    Get(ObjectArgs),
    /// Check whether an object exists
    Exists(ObjectArgs),
    /// Remove an object (best effort)
    Delete(ObjectArgs),
    /// Add a directory number
    AddLine(LineArgs),
    /// Add a softphone or mobile client on an existing line
    AddDevice(DeviceArgs),
    /// Add a remote destination profile
    AddProfile(ProfileArgs),
    /// Add a mobile remote destination to an existing profile
    AddDestination(DestinationArgs),
    /// Associate devices and the primary line with a user
    UpdateUser(UpdateUserArgs),
    /// Advertise an enterprise alternate number for a line
    SetAltNumber(AltNumberArgs),
    /// Provision line, device, profile, destination and user association
    Onboard(OnboardArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    User,
    Line,
    Phone,
    Rdp,
    Rdest,
}

impl KindArg {
    pub fn object(self) -> ObjectKind {
        match self {
            KindArg::User => ObjectKind::User,
            KindArg::Line => ObjectKind::Line,
            KindArg::Phone => ObjectKind::Phone,
            KindArg::Rdp => ObjectKind::RemoteDestinationProfile,
            KindArg::Rdest => ObjectKind::RemoteDestination,
        }
    }
}

#[derive(Debug, Args)]
pub struct ObjectArgs {
    pub kind: KindArg,
    /// userid, line pattern, device name, profile name or destination
    pub key: String,
    /// Line partition
    #[arg(long)]
    pub partition: Option<String>,
}

impl ObjectArgs {
    pub fn line_key(&self, defaults: &ProvisioningDefaults) -> LineKey {
        line_key(&self.key, self.partition.as_deref(), defaults)
    }
}

#[derive(Debug, Args)]
pub struct LineArgs {
    #[arg(long)]
    pub pattern: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub partition: Option<String>,
    #[arg(long)]
    pub usage: Option<String>,
    #[arg(long)]
    pub voicemail_profile: Option<String>,
    /// Do not forward unanswered calls to voicemail
    #[arg(long)]
    pub no_voicemail: bool,
    /// Calling search space for call forwarding
    #[arg(long)]
    pub forward_css: Option<String>,
    /// Shared line appearance calling search space
    #[arg(long)]
    pub line_css: Option<String>,
}

impl LineArgs {
    pub fn spec(&self, defaults: &ProvisioningDefaults) -> LineSpec {
        let mut spec = defaults.line_spec(&self.pattern, &self.first_name, &self.last_name);
        spec.key = line_key(&self.pattern, self.partition.as_deref(), defaults);
        if let Some(usage) = &self.usage {
            spec.usage = usage.clone();
        }
        if let Some(profile) = &self.voicemail_profile {
            spec.voicemail_profile = profile.clone();
        }
        spec.forward_to_voicemail = !self.no_voicemail;
        spec.forward_css = self.forward_css.clone();
        spec.share_line_appearance_css = self.line_css.clone();
        spec
    }
}

#[derive(Debug, Args)]
pub struct DeviceArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    /// Pattern of the existing line
    #[arg(long)]
    pub pattern: String,
    #[arg(long)]
    pub extension: String,
    #[arg(long)]
    pub device_pool: String,
    #[arg(long)]
    pub css: String,
    /// CSF, TCT, BOT or TAB
    #[arg(long, default_value = "CSF")]
    pub device_type: DeviceType,
    #[arg(long)]
    pub partition: Option<String>,
}

impl DeviceArgs {
    pub fn spec(&self, defaults: &ProvisioningDefaults) -> PhoneSpec {
        PhoneSpec {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            device_type: self.device_type,
            line: line_key(&self.pattern, self.partition.as_deref(), defaults),
            extension: self.extension.clone(),
            device_pool: self.device_pool.clone(),
            calling_search_space: self.css.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub pattern: String,
    #[arg(long)]
    pub extension: String,
    #[arg(long)]
    pub device_pool: String,
    #[arg(long)]
    pub css: String,
    #[arg(long)]
    pub partition: Option<String>,
}

impl ProfileArgs {
    pub fn spec(&self, defaults: &ProvisioningDefaults) -> ProfileSpec {
        ProfileSpec {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            line: line_key(&self.pattern, self.partition.as_deref(), defaults),
            extension: self.extension.clone(),
            device_pool: self.device_pool.clone(),
            calling_search_space: self.css.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct DestinationArgs {
    #[arg(long)]
    pub destination: String,
    #[arg(long)]
    pub userid: String,
}

impl DestinationArgs {
    pub fn spec(&self) -> DestinationSpec {
        DestinationSpec {
            destination: self.destination.clone(),
            userid: self.userid.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct UpdateUserArgs {
    #[arg(long)]
    pub userid: String,
    /// Primary extension pattern
    #[arg(long)]
    pub pattern: String,
    #[arg(long)]
    pub did: String,
    /// Associated device name, repeatable
    #[arg(long = "device", required = true)]
    pub devices: Vec<String>,
    #[arg(long)]
    pub partition: Option<String>,
}

impl UpdateUserArgs {
    pub fn update(&self, defaults: &ProvisioningDefaults) -> UserUpdate {
        UserUpdate {
            userid: self.userid.clone(),
            primary_extension: line_key(&self.pattern, self.partition.as_deref(), defaults),
            self_service: self.did.clone(),
            devices: self.devices.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct AltNumberArgs {
    #[arg(long)]
    pub pattern: String,
    /// Enterprise number mask
    #[arg(long)]
    pub mask: String,
    #[arg(long)]
    pub partition: Option<String>,
}

#[derive(Debug, Args)]
pub struct OnboardArgs {
    #[arg(long)]
    pub userid: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    /// Full number of the user's line
    #[arg(long)]
    pub pattern: String,
    /// Short enterprise extension
    #[arg(long)]
    pub extension: String,
    #[arg(long)]
    pub did: String,
    #[arg(long)]
    pub device_pool: String,
    #[arg(long)]
    pub css: String,
    #[arg(long, default_value = "CSF")]
    pub device_type: DeviceType,
    /// Mobile number to add as a remote destination
    #[arg(long)]
    pub mobile: Option<String>,
    #[arg(long)]
    pub forward_css: Option<String>,
    #[arg(long)]
    pub line_css: Option<String>,
}

impl OnboardArgs {
    pub fn user(&self) -> MobilityUser {
        MobilityUser {
            userid: self.userid.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            pattern: self.pattern.clone(),
            extension: self.extension.clone(),
            did: self.did.clone(),
            device_pool: self.device_pool.clone(),
            calling_search_space: self.css.clone(),
            device_type: self.device_type,
            mobile: self.mobile.clone(),
            forward_css: self.forward_css.clone(),
            line_css: self.line_css.clone(),
        }
    }
}

pub fn line_key(pattern: &str, partition: Option<&str>, defaults: &ProvisioningDefaults) -> LineKey {
    match partition {
        Some(partition) => LineKey::new(pattern, partition),
        None => defaults.line_key(pattern),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_unknown_device_type_rejected_at_parse() {
        let result = Cli::try_parse_from([
            "ucm-provision",
            "add-device",
            "--username", "jdoe",
            "--first-name", "Jane",
            "--last-name", "Doe",
            "--pattern", "5551212",
            "--extension", "1212",
            "--device-pool", "DP-Chicago",
            "--css", "CSS-Chicago",
            "--device-type", "XYZ",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_add_device_spec() {
        let cli = Cli::try_parse_from([
            "ucm-provision",
            "add-device",
            "--username", "jdoe",
            "--first-name", "Jane",
            "--last-name", "Doe",
            "--pattern", "5551212",
            "--extension", "1212",
            "--device-pool", "DP-Chicago",
            "--css", "CSS-Chicago",
            "--device-type", "bot",
        ])
        .unwrap();

        let Command::AddDevice(args) = cli.command else {
            panic!("expected add-device");
        };
        let spec = args.spec(&ProvisioningDefaults::default());
        assert_eq!(spec.device_name(), "BOTJDOE");
        assert_eq!(spec.line, LineKey::new("5551212", "Internal PAR"));
    }

    #[test]
    fn test_line_args_override_defaults() {
        let cli = Cli::try_parse_from([
            "ucm-provision",
            "add-line",
            "--pattern", "5551212",
            "--first-name", "Jane",
            "--last-name", "Doe",
            "--partition", "PT-Lab",
            "--no-voicemail",
        ])
        .unwrap();

        let Command::AddLine(args) = cli.command else {
            panic!("expected add-line");
        };
        let spec = args.spec(&ProvisioningDefaults::default());
        assert_eq!(spec.key, LineKey::new("5551212", "PT-Lab"));
        assert!(!spec.forward_to_voicemail);
        assert_eq!(spec.usage, "Device");
        assert_eq!(spec.voicemail_profile, "<None>");
    }

    #[test]
    fn test_object_args() {
        let cli = Cli::try_parse_from(["ucm-provision", "get", "rdp", "RDPjdoe"]).unwrap();
        let Command::Get(args) = cli.command else {
            panic!("expected get");
        };
        assert_eq!(args.kind.object(), ObjectKind::RemoteDestinationProfile);
        assert_eq!(args.key, "RDPjdoe");
    }

    #[test]
    fn test_update_user_requires_device() {
        let result = Cli::try_parse_from([
            "ucm-provision",
            "update-user",
            "--userid", "jdoe",
            "--pattern", "5551212",
            "--did", "3125551212",
        ]);
        assert!(result.is_err());
    }
}
