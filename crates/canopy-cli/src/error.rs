//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with actionable
//! help text and stable process exit codes.

use miette::Diagnostic;
use thiserror::Error;

/// Process exit codes.
#[allow(dead_code)]
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NO_DEVICE: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("could not reach the cloud API")]
    #[diagnostic(
        code(canopy::connection_failed),
        help(
            "Check your network connection and --base-url.\n\
             The vendor cloud has occasional outages; retry in a few minutes."
        )
    )]
    Connection {
        #[source]
        source: canopy_api::Error,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("authentication failed for profile '{profile}'")]
    #[diagnostic(
        code(canopy::auth_failed),
        help(
            "Verify the email and password for this account.\n\
             Run: canopy config init"
        )
    )]
    AuthFailed {
        profile: String,
        #[source]
        source: canopy_api::Error,
    },

    // ── Devices ──────────────────────────────────────────────────────
    #[error("no {kind} device found on this account")]
    #[diagnostic(
        code(canopy::no_device),
        help("Make sure the device is paired in the vendor app and online.")
    )]
    NoDevice { kind: String },

    #[error("device command rejected ({code}): {message}")]
    #[diagnostic(
        code(canopy::api_error),
        help("The device may be offline or claimed by another app session.")
    )]
    Api { code: String, message: String },

    // ── Input / config ───────────────────────────────────────────────
    #[error("invalid {field}: {reason}")]
    #[diagnostic(code(canopy::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(canopy::config))]
    Config(#[from] canopy_config::ConfigError),

    #[error("IO error: {0}")]
    #[diagnostic(code(canopy::io))]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    #[diagnostic(code(canopy::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map an error to its process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Connection { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NoDevice { .. } => exit_code::NO_DEVICE,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Api { .. } | Self::Config(_) | Self::Io(_) | Self::Json(_) => {
                exit_code::GENERAL
            }
        }
    }

    /// Wrap a core error, splitting the authentication/transport
    /// asymmetry into distinct diagnostics.
    pub fn from_api(err: canopy_api::Error, profile: &str) -> Self {
        if err.is_authentication() {
            Self::AuthFailed {
                profile: profile.into(),
                source: err,
            }
        } else {
            Self::Connection { source: err }
        }
    }
}
