//! Fan command handlers.
//!
//! Range policy lives here, not in the core: the vendor's fans stall below
//! 25%, so this adapter raises lower requests to the floor. The gateway
//! client itself passes percentages through untouched.

use tracing::warn;

use canopy_api::{GatewayClient, ProductKind};

use crate::cli::{FanArgs, FanCommand, GlobalOpts};
use crate::error::CliError;

use super::util;

/// Lowest speed the hardware runs at reliably.
const MIN_FAN_SPEED: u8 = 25;
const MAX_FAN_SPEED: u8 = 100;

/// Clamp a requested speed into the supported range.
fn clamp_speed(percent: u8) -> u8 {
    percent.clamp(MIN_FAN_SPEED, MAX_FAN_SPEED)
}

pub async fn handle(
    client: &GatewayClient,
    args: FanArgs,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        FanCommand::Set { percent, device_id } => {
            let clamped = clamp_speed(percent);
            if clamped != percent {
                warn!(requested = percent, clamped, "fan speed outside supported range");
            }

            let reply = client
                .set_fan_speed(clamped, device_id.as_deref())
                .await
                .map_err(|err| CliError::from_api(err, profile))?;
            util::check_reply(&reply)?;

            if !global.quiet {
                eprintln!("Fan speed set to {clamped}%");
            }
            Ok(())
        }

        FanCommand::On { device_id } => switch(client, false, device_id, profile, global).await,
        FanCommand::Off { device_id } => switch(client, true, device_id, profile, global).await,
    }
}

async fn switch(
    client: &GatewayClient,
    is_close: bool,
    device_id: Option<String>,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // The toggle endpoint needs the fan's own id; resolve it via fan
    // discovery when not given explicitly.
    let device_id =
        util::resolve_device_id(client, ProductKind::Fan, device_id, profile).await?;

    let reply = client
        .toggle(is_close, Some(&device_id))
        .await
        .map_err(|err| CliError::from_api(err, profile))?;
    util::check_reply(&reply)?;

    if !global.quiet {
        eprintln!("Fan turned {}", if is_close { "off" } else { "on" });
    }
    Ok(())
}
