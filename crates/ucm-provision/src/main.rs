//! UCM provisioning tool - Main entry point.

mod cli;
mod commands;
mod error;
mod settings;

use crate::cli::{Cli, Command};
use crate::error::AppResult;
use crate::settings::{LogSettings, Settings};
use anyhow::Context;
use axl_client::{AxlClient, TlsMode};
use clap::Parser;
use provisioning::ProvisioningService;
use serde_json::json;
use std::fs::File;
use std::sync::Mutex;
use tracing::{info, warn, Level};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use ucm_session::{ConfigStore, SessionBootstrap, SessionConfig, StdinPrompter, TrustStore};

/// Provisioning and session log, overwritten on every run.
const WRITER_LOG: &str = "writerDebug.log";

/// SOAP transport log, overwritten on every run.
const TRANSPORT_LOG: &str = "axlTransport.log";

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&settings.log).context("Failed to initialize logging")?;

    info!("Starting ucm-provision...");

    let bootstrap = SessionBootstrap::new(
        ConfigStore::new(
            &settings.session.config_path,
            settings.session.passphrase.as_ref(),
        ),
        TrustStore::new(&settings.session.trust_dir, settings.session.fetch_timeout)?,
    );

    if let Command::Init { force: true } = cli.command {
        bootstrap.store().delete().await?;
    }

    let session = bootstrap.load_or_bootstrap(&mut StdinPrompter).await?;
    let client = admin_client(&settings, &session)?;

    let output = match cli.command {
        Command::Init { .. } => {
            let version = client
                .server_version()
                .await
                .context("Administrative API not reachable")?;
            info!("Connected to {} (version {})", session.host(), version);
            json!({
                "host": session.host(),
                "url": session.admin_api_url(),
                "verify": session.verify(),
                "verifyFile": session.verify_file().map(|p| p.display().to_string()),
                "serverVersion": version,
            })
        }
        command => {
            let service = ProvisioningService::new(client)
                .with_defaults(settings.defaults.provisioning());
            commands::run(command, &service).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Build the AXL client for the resolved session.
fn admin_client(settings: &Settings, session: &SessionConfig) -> AppResult<AxlClient> {
    let tls = match session.verify_file() {
        Some(anchor) => TlsMode::Verify(anchor.to_path_buf()),
        None => {
            warn!("Certificate verification disabled for {}", session.host());
            TlsMode::Insecure
        }
    };

    let client = AxlClient::new(
        session.admin_api_url(),
        session.username(),
        session.password().clone(),
        &tls,
        settings.axl.timeout,
    )?
    .with_schema_version(settings.axl.schema_version.as_str());

    Ok(client)
}

fn init_logging(log: &LogSettings) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&log.level));

    std::fs::create_dir_all(&log.dir)?;
    let writer_log = File::create(log.dir.join(WRITER_LOG))?;
    let transport_log = File::create(log.dir.join(TRANSPORT_LOG))?;

    let writer_targets = Targets::new()
        .with_target("provisioning", Level::DEBUG)
        .with_target("ucm_session", Level::DEBUG)
        .with_target("ucm_provision", Level::DEBUG);
    let transport_targets = Targets::new().with_target("axl_client", Level::DEBUG);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(writer_log))
                .with_filter(writer_targets),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(transport_log))
                .with_filter(transport_targets),
        )
        .init();

    Ok(())
}
