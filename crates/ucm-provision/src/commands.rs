//! Command dispatch onto the provisioning service.

use crate::cli::{line_key, Command, KindArg, ObjectArgs};
use crate::error::{AppError, AppResult};
use axl_client::AdminApi;
use provisioning::{Lookup, PhoneEntity, ProfileEntity, ProvisioningService};
use serde_json::{json, Value};
use tracing::info;

/// Run one provisioning command and return its JSON result.
///
/// `init` needs the session and is handled by the caller.
pub async fn run<A: AdminApi>(command: Command, service: &ProvisioningService<A>) -> AppResult<Value> {
    let defaults = service.defaults().clone();

    let output = match command {
        Command::Init { .. } => {
            return Err(anyhow::anyhow!("init is handled before a service exists").into())
        }
        Command::Get(args) => match lookup(service, &args).await {
            Lookup::Found(record) => Value::Object(record),
            Lookup::NotFound => return Err(unavailable(&args, "not found")),
            Lookup::TransportFailed(reason) => return Err(unavailable(&args, &reason)),
        },
        Command::Exists(args) => {
            let lookup = lookup(service, &args).await;
            if let Lookup::TransportFailed(reason) = &lookup {
                return Err(unavailable(&args, reason));
            }
            json!({
                "kind": args.kind.object().type_name(),
                "key": args.key,
                "exists": lookup.is_found(),
            })
        }
        Command::Delete(args) => {
            let deleted = delete(service, &args).await;
            json!({
                "kind": args.kind.object().type_name(),
                "key": args.key,
                "deleted": deleted,
            })
        }
        Command::AddLine(args) => serde_json::to_value(service.line_add(&args.spec(&defaults)).await?)?,
        Command::AddDevice(args) => {
            serde_json::to_value(service.device_add(&args.spec(&defaults)).await?)?
        }
        Command::AddProfile(args) => {
            serde_json::to_value(service.rdp_add(&args.spec(&defaults)).await?)?
        }
        Command::AddDestination(args) => {
            serde_json::to_value(service.rdest_add(&args.spec()).await?)?
        }
        Command::UpdateUser(args) => {
            let update = args.update(&defaults);
            let updated = service.user_update(&update).await?;
            json!({ "userid": update.userid, "uuid": updated.uuid })
        }
        Command::SetAltNumber(args) => {
            let key = line_key(&args.pattern, args.partition.as_deref(), &defaults);
            let updated = service.line_set_alt_number(&key, &args.mask).await?;
            json!({ "pattern": key.pattern, "mask": args.mask, "uuid": updated.uuid })
        }
        Command::Onboard(args) => {
            let report = service.onboard(&args.user()).await;
            let complete = report.is_complete();
            let output = serde_json::to_value(&report)?;
            if !complete {
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Err(AppError::Incomplete(report.userid));
            }
            info!("Onboarding of {} complete", report.userid);
            output
        }
    };

    Ok(output)
}

async fn lookup<A: AdminApi>(service: &ProvisioningService<A>, args: &ObjectArgs) -> Lookup {
    match args.kind {
        KindArg::User => service.user_get(&args.key).await,
        KindArg::Line => service.line_get(&args.line_key(service.defaults())).await,
        KindArg::Phone => service.device_get(&args.key).await,
        KindArg::Rdp => service.rdp_get(&args.key).await,
        KindArg::Rdest => service.rdest_get(&args.key).await,
    }
}

/// Keys are object names, so phones and profiles go through the engine.
async fn delete<A: AdminApi>(service: &ProvisioningService<A>, args: &ObjectArgs) -> bool {
    match args.kind {
        KindArg::User => service.user_delete(&args.key).await,
        KindArg::Line => service.line_delete(&args.line_key(service.defaults())).await,
        KindArg::Phone => service.engine().delete::<PhoneEntity>(&args.key).await,
        KindArg::Rdp => service.engine().delete::<ProfileEntity>(&args.key).await,
        KindArg::Rdest => service.rdest_delete(&args.key).await,
    }
}

fn unavailable(args: &ObjectArgs, reason: &str) -> AppError {
    AppError::Unavailable {
        kind: args.kind.object(),
        key: args.key.clone(),
        reason: reason.to_string(),
    }
}
