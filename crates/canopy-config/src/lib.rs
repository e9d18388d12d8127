//! Shared configuration for canopy tools.
//!
//! TOML profiles, figment env layering, and credential resolution
//! (env var → system keyring → plaintext config). Translates a profile
//! into the `canopy-api` construction inputs; the core never sees these
//! types.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use canopy_api::{Credentials, Session, TransportConfig};

/// Keyring service name for stored passwords.
const KEYRING_SERVICE: &str = "canopy";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
///
/// One profile per cloud account. Multiple accounts get multiple
/// profiles — and therefore multiple independent gateway client
/// instances, which never contend with each other.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name (used when `--profile` is not specified).
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Minimum interval between non-forced logins, in seconds.
    #[serde(default = "default_min_login_interval")]
    pub min_login_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            min_login_interval: default_min_login_interval(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_min_login_interval() -> u64 {
    300
}

/// A named account profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Account email.
    pub email: Option<String>,

    /// Password (plaintext — prefer keyring or `CANOPY_PASSWORD`).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// API base URL override (defaults to the production cloud).
    pub base_url: Option<String>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Override the login throttle interval (seconds).
    pub min_login_interval: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "canopy", "canopy").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("canopy");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from an explicit file path + environment.
///
/// Env vars use the `CANOPY_` prefix with `_` as the section separator,
/// e.g. `CANOPY_DEFAULTS_TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CANOPY_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning defaults if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

/// The active profile name: explicit choice, then the config's
/// `default_profile`, then `"default"`.
pub fn active_profile_name(explicit: Option<&str>, cfg: &Config) -> String {
    explicit
        .map(str::to_owned)
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve account credentials for a profile.
///
/// Email: profile field, then `CANOPY_EMAIL`. Password chain:
/// the profile's `password_env` var, then `CANOPY_PASSWORD`, then the
/// system keyring (`canopy` / `{profile}/password`), then plaintext in
/// the config file.
pub fn resolve_credentials(profile: &Profile, profile_name: &str) -> Result<Credentials, ConfigError> {
    let email = profile
        .email
        .clone()
        .or_else(|| std::env::var("CANOPY_EMAIL").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(pw) = std::env::var(env_name) {
            return Ok(Credentials::new(email, SecretString::from(pw)));
        }
    }

    // 2. CANOPY_PASSWORD
    if let Ok(pw) = std::env::var("CANOPY_PASSWORD") {
        return Ok(Credentials::new(email, SecretString::from(pw)));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(Credentials::new(email, SecretString::from(pw)));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(Credentials::new(email, SecretString::from(pw.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring for a profile.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), keyring::Error> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))?;
    entry.set_password(password)
}

// ── Gateway construction inputs ─────────────────────────────────────

/// Everything needed to construct a `GatewayClient` from a profile.
pub struct GatewaySettings {
    pub session: Session,
    pub transport: TransportConfig,
}

/// Build gateway construction inputs from a profile.
pub fn profile_to_gateway_settings(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<GatewaySettings, ConfigError> {
    let credentials = resolve_credentials(profile, profile_name)?;

    let mut transport = TransportConfig::default();
    if let Some(ref raw) = profile.base_url {
        transport.base_url = raw.parse::<Url>().map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {raw}"),
        })?;
    }
    transport.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    let interval =
        Duration::from_secs(profile.min_login_interval.unwrap_or(defaults.min_login_interval));
    let session = Session::new(credentials).with_min_login_interval(interval);

    Ok(GatewaySettings { session, transport })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn load_layers_toml_under_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    default_profile = "tent"

                    [defaults]
                    timeout = 10

                    [profiles.tent]
                    email = "grower@example.com"
                    password = "hunter2"
                "#,
            )?;
            jail.set_env("CANOPY_DEFAULTS_TIMEOUT", "20");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.default_profile.as_deref(), Some("tent"));
            // Env overrides the file.
            assert_eq!(cfg.defaults.timeout, 20);
            assert_eq!(cfg.defaults.min_login_interval, 300);
            assert_eq!(
                cfg.profiles["tent"].email.as_deref(),
                Some("grower@example.com")
            );
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        figment::Jail::expect_with(|_jail| {
            let cfg = load_config_from(Path::new("nonexistent.toml")).unwrap();
            assert_eq!(cfg.default_profile.as_deref(), Some("default"));
            assert_eq!(cfg.defaults.timeout, 30);
            assert!(cfg.profiles.is_empty());
            Ok(())
        });
    }

    #[test]
    fn password_env_var_beats_plaintext() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("TENT_PW", "from-env");

            let profile = Profile {
                email: Some("grower@example.com".into()),
                password: Some("from-file".into()),
                password_env: Some("TENT_PW".into()),
                ..Profile::default()
            };

            let creds = resolve_credentials(&profile, "tent").unwrap();
            assert_eq!(creds.email, "grower@example.com");
            assert_eq!(
                secrecy::ExposeSecret::expose_secret(&creds.password),
                "from-env"
            );
            Ok(())
        });
    }

    #[test]
    fn missing_email_is_no_credentials() {
        let profile = Profile {
            password: Some("hunter2".into()),
            ..Profile::default()
        };
        let result = resolve_credentials(&profile, "tent");
        assert!(matches!(result, Err(ConfigError::NoCredentials { .. })));
    }

    #[test]
    fn profile_overrides_transport_settings() {
        let profile = Profile {
            email: Some("grower@example.com".into()),
            password: Some("hunter2".into()),
            base_url: Some("https://staging.example.test/api/android".into()),
            timeout: Some(5),
            min_login_interval: Some(60),
            ..Profile::default()
        };

        let settings =
            profile_to_gateway_settings(&profile, "tent", &Defaults::default()).unwrap();
        assert_eq!(
            settings.transport.base_url.as_str(),
            "https://staging.example.test/api/android"
        );
        assert_eq!(settings.transport.timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_base_url_is_validation_error() {
        let profile = Profile {
            email: Some("grower@example.com".into()),
            password: Some("hunter2".into()),
            base_url: Some("not a url".into()),
            ..Profile::default()
        };

        let result = profile_to_gateway_settings(&profile, "tent", &Defaults::default());
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "base_url"
        ));
    }
}
