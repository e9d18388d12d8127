//! Config command handlers: profile init, path, show.

use std::io::Write as _;

use secrecy::SecretString;

use canopy_api::{Credentials, GatewayClient, TransportConfig};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { no_verify } => init(global, no_verify).await,
        ConfigCommand::Path => {
            println!("{}", canopy_config::config_path().display());
            Ok(())
        }
        ConfigCommand::Show => show(global),
    }
}

/// Interactive profile setup: email + password prompt, optional live
/// login check, then save. The password goes to the system keyring when
/// one is available; plaintext in the config file is the fallback.
async fn init(global: &GlobalOpts, no_verify: bool) -> Result<(), CliError> {
    let mut cfg = canopy_config::load_config_or_default();
    let profile_name = canopy_config::active_profile_name(global.profile.as_deref(), &cfg);

    let email = match global.email.clone() {
        Some(email) => email,
        None => prompt("Account email: ")?,
    };
    if !looks_like_email(&email) {
        return Err(CliError::Validation {
            field: "email".into(),
            reason: format!("'{email}' is not an email address"),
        });
    }

    let password = rpassword::prompt_password("Account password: ")?;

    if no_verify {
        eprintln!("Skipping login check");
    } else {
        verify_login(&email, &password, global).await?;
        eprintln!("Login OK");
    }

    let mut profile = cfg.profiles.get(&profile_name).cloned().unwrap_or_default();
    profile.email = Some(email);
    if let Some(ref base_url) = global.base_url {
        profile.base_url = Some(base_url.clone());
    }

    match canopy_config::store_password(&profile_name, &password) {
        Ok(()) => {
            profile.password = None;
            eprintln!("Password stored in the system keyring");
        }
        Err(err) => {
            // No keyring available (headless box, stripped container):
            // fall back to plaintext with a nudge toward CANOPY_PASSWORD.
            eprintln!("Keyring unavailable ({err}); storing password in the config file");
            eprintln!("Consider setting CANOPY_PASSWORD instead");
            profile.password = Some(password);
        }
    }

    cfg.profiles.insert(profile_name.clone(), profile);
    if cfg.default_profile.is_none() {
        cfg.default_profile = Some(profile_name.clone());
    }
    canopy_config::save_config(&cfg)?;

    eprintln!(
        "Profile '{profile_name}' saved to {}",
        canopy_config::config_path().display()
    );
    Ok(())
}

/// Validate credentials with a real login against the cloud.
async fn verify_login(email: &str, password: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let mut transport = TransportConfig::default();
    if let Some(ref base_url) = global.base_url {
        transport.base_url = base_url.parse().map_err(|_| CliError::Validation {
            field: "base-url".into(),
            reason: format!("invalid URL: {base_url}"),
        })?;
    }

    let credentials = Credentials::new(email, SecretString::from(password.to_owned()));
    let client = GatewayClient::new(credentials, &transport)
        .map_err(|err| CliError::from_api(err, "init"))?;
    client
        .login()
        .await
        .map_err(|err| CliError::from_api(err, "init"))
}

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = canopy_config::load_config_or_default();
    let profile_name = canopy_config::active_profile_name(global.profile.as_deref(), &cfg);

    println!("config file:     {}", canopy_config::config_path().display());
    println!("active profile:  {profile_name}");

    match cfg.profiles.get(&profile_name) {
        Some(profile) => {
            println!("email:           {}", profile.email.as_deref().unwrap_or("-"));
            println!(
                "password:        {}",
                if profile.password.is_some() {
                    "(in config file)"
                } else {
                    "(keyring or env)"
                }
            );
            if let Some(ref base_url) = profile.base_url {
                println!("base_url:        {base_url}");
            }
            if let Some(timeout) = profile.timeout {
                println!("timeout:         {timeout}s");
            }
        }
        None => println!("profile not configured; run: canopy config init"),
    }
    Ok(())
}

fn prompt(message: &str) -> Result<String, CliError> {
    eprint!("{message}");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_owned())
}

/// Minimal shape check; the cloud is the real validator.
fn looks_like_email(candidate: &str) -> bool {
    match candidate.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}
