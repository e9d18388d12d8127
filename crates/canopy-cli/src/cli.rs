//! Command-line definition (clap derive).

use clap::{Args, Parser, Subcommand, ValueEnum};

use canopy_api::ProductKind;

#[derive(Debug, Parser)]
#[command(
    name = "canopy",
    about = "Control grow-room lights and fans through the vendor cloud",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile name from the config file.
    #[arg(long, global = true, env = "CANOPY_PROFILE")]
    pub profile: Option<String>,

    /// Account email (overrides the profile).
    #[arg(long, global = true, env = "CANOPY_EMAIL")]
    pub email: Option<String>,

    /// API base URL (overrides the profile).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify the configured credentials by logging in.
    Login,

    /// Show the current light and fan state.
    Status,

    /// List raw device records for a product category.
    Devices(DevicesArgs),

    /// Light controls.
    Light(LightArgs),

    /// Fan controls.
    Fan(FanArgs),

    /// Manage configuration profiles.
    Config(ConfigArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Product category.
    #[arg(value_enum, default_value = "light")]
    pub kind: DeviceKindArg,

    /// Emit raw JSON records instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DeviceKindArg {
    Light,
    Fan,
}

impl From<DeviceKindArg> for ProductKind {
    fn from(kind: DeviceKindArg) -> Self {
        match kind {
            DeviceKindArg::Light => Self::Light,
            DeviceKindArg::Fan => Self::Fan,
        }
    }
}

#[derive(Debug, Args)]
pub struct LightArgs {
    #[command(subcommand)]
    pub command: LightCommand,
}

#[derive(Debug, Subcommand)]
pub enum LightCommand {
    /// Set brightness (percent, 0-100).
    Set {
        percent: u8,
    },
    /// Turn the light on.
    On {
        /// Target device id (defaults to the discovered light).
        #[arg(long)]
        device_id: Option<String>,
    },
    /// Turn the light off.
    Off {
        #[arg(long)]
        device_id: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct FanArgs {
    #[command(subcommand)]
    pub command: FanCommand,
}

#[derive(Debug, Subcommand)]
pub enum FanCommand {
    /// Set fan speed (percent; values below 25 are raised to 25).
    Set {
        percent: u8,
        /// Target device id (defaults to the discovered fan).
        #[arg(long)]
        device_id: Option<String>,
    },
    /// Turn the fan on.
    On {
        #[arg(long)]
        device_id: Option<String>,
    },
    /// Turn the fan off.
    Off {
        #[arg(long)]
        device_id: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or update a profile interactively.
    Init {
        /// Skip the live login check.
        #[arg(long)]
        no_verify: bool,
    },
    /// Print the config file path.
    Path,
    /// Show the resolved configuration (passwords redacted).
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
