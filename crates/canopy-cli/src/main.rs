mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use canopy_api::GatewayClient;
use canopy_config::GatewaySettings;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a gateway client
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global).await,

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "canopy", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to the cloud
        cmd => {
            let (client, profile_name) = build_gateway(&cli.global)?;

            tracing::debug!(command = ?cmd, profile = %profile_name, "dispatching command");
            commands::dispatch(cmd, &client, &profile_name, &cli.global).await
        }
    }
}

/// Build a `GatewayClient` from the config file, profile, and CLI overrides.
fn build_gateway(global: &cli::GlobalOpts) -> Result<(GatewayClient, String), CliError> {
    let cfg = canopy_config::load_config_or_default();
    let profile_name = canopy_config::active_profile_name(global.profile.as_deref(), &cfg);

    let mut profile = cfg.profiles.get(&profile_name).cloned().unwrap_or_default();

    // CLI flags override the profile.
    if let Some(ref email) = global.email {
        profile.email = Some(email.clone());
    }
    if let Some(ref base_url) = global.base_url {
        profile.base_url = Some(base_url.clone());
    }

    let GatewaySettings { session, transport } =
        canopy_config::profile_to_gateway_settings(&profile, &profile_name, &cfg.defaults)?;

    let client = GatewayClient::with_session(session, &transport)
        .map_err(|err| CliError::from_api(err, &profile_name))?;
    Ok((client, profile_name))
}
