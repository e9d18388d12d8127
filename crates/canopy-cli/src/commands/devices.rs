//! Devices command: raw discovery records for one product category.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use canopy_api::{DeviceRecord, GatewayClient};

use crate::cli::DevicesArgs;
use crate::error::CliError;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "RATE")]
    rate: String,
    #[tabled(rename = "POWER")]
    power: String,
}

impl DeviceRow {
    fn from_record(record: &DeviceRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.device_name.clone(),
            rate: record
                .device_light_rate
                .map_or_else(|| "-".into(), |rate| format!("{rate}%")),
            power: match record.is_close {
                Some(true) => "off".into(),
                Some(false) => "on".into(),
                None => "-".into(),
            },
        }
    }
}

pub async fn handle(
    client: &GatewayClient,
    args: DevicesArgs,
    profile: &str,
) -> Result<(), CliError> {
    let records = client
        .list_devices(args.kind.into())
        .await
        .map_err(|err| CliError::from_api(err, profile))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        eprintln!("No devices found");
        return Ok(());
    }

    let rows: Vec<DeviceRow> = records.iter().map(DeviceRow::from_record).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}
