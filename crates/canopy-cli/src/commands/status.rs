//! Status command: one table with the current light and fan state.

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use canopy_api::{FanSnapshot, GatewayClient, LightSnapshot};

use crate::cli::GlobalOpts;
use crate::error::CliError;

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "DEVICE")]
    device: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "POWER")]
    power: String,
    #[tabled(rename = "LEVEL")]
    level: String,
    #[tabled(rename = "HUMIDITY")]
    humidity: String,
    #[tabled(rename = "TEMP")]
    temperature: String,
}

pub async fn handle(
    client: &GatewayClient,
    profile: &str,
    _global: &GlobalOpts,
) -> Result<(), CliError> {
    // Log in up front so a credentials problem surfaces as an error
    // instead of two "unavailable" rows.
    client
        .login()
        .await
        .map_err(|err| CliError::from_api(err, profile))?;

    // Absent snapshots mean "temporarily unavailable", not failure.
    let light = client.light_data().await;
    let fan = client.fan_data().await;

    let rows = vec![light_row(light.as_ref()), fan_row(fan.as_ref())];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn power_cell(is_closed: bool) -> String {
    if is_closed {
        "off".red().to_string()
    } else {
        "on".green().to_string()
    }
}

fn light_row(snapshot: Option<&LightSnapshot>) -> StatusRow {
    match snapshot {
        Some(light) => StatusRow {
            device: light.device_name.clone(),
            kind: "light".into(),
            power: power_cell(light.is_closed),
            level: format!("{}%", light.brightness_percent),
            humidity: "-".into(),
            temperature: "-".into(),
        },
        None => unavailable_row("light"),
    }
}

fn fan_row(snapshot: Option<&FanSnapshot>) -> StatusRow {
    match snapshot {
        Some(fan) => StatusRow {
            device: fan.device_name.clone(),
            kind: "fan".into(),
            power: power_cell(fan.is_closed),
            level: format!("{}%", fan.speed_percent),
            humidity: fan
                .humidity
                .map_or_else(|| "-".into(), |h| format!("{h:.0}%")),
            temperature: fan
                .temperature_f
                .map_or_else(|| "-".into(), |t| format!("{t:.1}°F")),
        },
        None => unavailable_row("fan"),
    }
}

fn unavailable_row(kind: &str) -> StatusRow {
    StatusRow {
        device: "-".into(),
        kind: kind.into(),
        power: "unavailable".dimmed().to_string(),
        level: "-".into(),
        humidity: "-".into(),
        temperature: "-".into(),
    }
}
