//! Command dispatch: bridges CLI args → gateway operations → output.

pub mod config_cmd;
pub mod devices;
pub mod fan;
pub mod light;
pub mod login;
pub mod status;
pub mod util;

use canopy_api::GatewayClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &GatewayClient,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login => login::handle(client, profile, global).await,
        Command::Status => status::handle(client, profile, global).await,
        Command::Devices(args) => devices::handle(client, args, profile).await,
        Command::Light(args) => light::handle(client, args, profile, global).await,
        Command::Fan(args) => fan::handle(client, args, profile, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
