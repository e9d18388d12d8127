//! Light command handlers.

use canopy_api::GatewayClient;

use crate::cli::{GlobalOpts, LightArgs, LightCommand};
use crate::error::CliError;

use super::util;

pub async fn handle(
    client: &GatewayClient,
    args: LightArgs,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        LightCommand::Set { percent } => {
            if percent > 100 {
                return Err(CliError::Validation {
                    field: "percent".into(),
                    reason: format!("brightness must be 0-100, got {percent}"),
                });
            }

            let reply = client
                .set_brightness(percent)
                .await
                .map_err(|err| CliError::from_api(err, profile))?;
            util::check_reply(&reply)?;

            if !global.quiet {
                eprintln!("Brightness set to {percent}%");
            }
            Ok(())
        }

        LightCommand::On { device_id } => switch(client, false, device_id, profile, global).await,
        LightCommand::Off { device_id } => switch(client, true, device_id, profile, global).await,
    }
}

async fn switch(
    client: &GatewayClient,
    is_close: bool,
    device_id: Option<String>,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let reply = client
        .toggle(is_close, device_id.as_deref())
        .await
        .map_err(|err| CliError::from_api(err, profile))?;
    util::check_reply(&reply)?;

    if !global.quiet {
        eprintln!("Light turned {}", if is_close { "off" } else { "on" });
    }
    Ok(())
}
