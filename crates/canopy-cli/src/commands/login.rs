//! Login command: verify credentials against the cloud.

use canopy_api::GatewayClient;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub async fn handle(
    client: &GatewayClient,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    client
        .login()
        .await
        .map_err(|err| CliError::from_api(err, profile))?;

    if !global.quiet {
        eprintln!("Login OK (profile '{profile}')");
    }
    Ok(())
}
