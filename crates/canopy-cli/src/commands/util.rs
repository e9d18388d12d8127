//! Shared helpers for command handlers.

use canopy_api::{GatewayClient, ProductKind, Reply};

use crate::error::CliError;

/// Turn a command reply into a CLI result: success passes, any business
/// failure becomes a diagnostic. The core already handled the one
/// token-expiry retry; whatever code survives is final.
pub fn check_reply(reply: &Reply) -> Result<(), CliError> {
    if reply.is_success() {
        return Ok(());
    }
    Err(CliError::Api {
        code: reply.code.clone(),
        message: reply
            .msg
            .clone()
            .unwrap_or_else(|| "no server message".into()),
    })
}

/// Resolve a device id for a category: the explicit flag if given,
/// otherwise the first discovered device of that kind.
pub async fn resolve_device_id(
    client: &GatewayClient,
    kind: ProductKind,
    explicit: Option<String>,
    profile: &str,
) -> Result<String, CliError> {
    if let Some(id) = explicit {
        return Ok(id);
    }

    let records = client
        .list_devices(kind)
        .await
        .map_err(|err| CliError::from_api(err, profile))?;

    records
        .into_iter()
        .next()
        .map(|record| record.id)
        .ok_or_else(|| CliError::NoDevice {
            kind: kind.to_string(),
        })
}
