// Wire models for the cloud API
//
// Every endpoint replies with the same envelope: `{ code, msg, data }`,
// where `code == "000"` marks success and `"102"` a stale token. Device
// records use `#[serde(default)]` liberally plus a flattened catch-all map,
// because the API is inconsistent about field presence across firmware
// versions — and about types: ids and percentages arrive as either JSON
// numbers or strings depending on the device generation.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Reply code marking success.
pub const CODE_SUCCESS: &str = "000";
/// Reply code marking an expired bearer token.
pub const CODE_TOKEN_EXPIRED: &str = "102";

// ── Reply envelope ───────────────────────────────────────────────────

/// Standard reply envelope wrapping every endpoint's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiReply<T> {
    /// Business-level status code; `"000"` is success.
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiReply<T> {
    /// `true` when the remote side accepted the request.
    pub fn is_success(&self) -> bool {
        self.code == CODE_SUCCESS
    }

    /// `true` when the remote side rejected the bearer token as expired.
    pub fn is_token_expired(&self) -> bool {
        self.code == CODE_TOKEN_EXPIRED
    }
}

/// Reply shape handed back to the host for command operations.
///
/// Business failure (any non-`"000"` code) is data, not an error — the
/// host decides how to present it.
pub type Reply = ApiReply<serde_json::Value>;

/// Payload of a successful login reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub token: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Devices ──────────────────────────────────────────────────────────

/// Product category understood by the discovery endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductKind {
    Light,
    Fan,
}

impl ProductKind {
    /// Wire value for the `productType` field of discovery requests.
    /// Fans are `"WIND"` on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Light => "LIGHT",
            Self::Fan => "WIND",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Fan => f.write_str("fan"),
        }
    }
}

/// One page of the device list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicePage {
    #[serde(default)]
    pub list: Vec<DeviceRecord>,
    /// Catch-all for undocumented fields (page counters, totals).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Raw device record from `udm/getDeviceList/v1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub device_name: String,
    /// Brightness for lights, speed for fans; percent 0–100.
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub device_light_rate: Option<i64>,
    #[serde(default)]
    pub is_close: Option<bool>,
    #[serde(default)]
    pub device_img: Option<String>,
    /// Reported by fan devices only.
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub humidity: Option<f64>,
    /// Degrees Fahrenheit; reported by fan devices only.
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub temperature: Option<f64>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Identity of a discovered device, as cached by the gateway client.
///
/// Latest discovery wins: an id, once observed, is the current id for its
/// category until a fresher discovery supersedes it. There is no staleness
/// detection — a known limitation of the vendor protocol usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub id: String,
    pub name: String,
    pub kind: ProductKind,
}

// ── Snapshots ────────────────────────────────────────────────────────

/// Read-only projection of the current light state.
///
/// Exists only as a query's return value; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightSnapshot {
    pub device_name: String,
    /// Percent 0–100 as reported by the remote side; not rounded or
    /// clamped by the client.
    pub brightness_percent: i64,
    pub is_closed: bool,
    pub image: Option<String>,
}

impl LightSnapshot {
    pub(crate) fn from_record(record: &DeviceRecord) -> Self {
        Self {
            device_name: record.device_name.clone(),
            brightness_percent: record.device_light_rate.unwrap_or(0),
            is_closed: record.is_close.unwrap_or(false),
            image: record.device_img.clone(),
        }
    }
}

/// Read-only projection of the current fan state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FanSnapshot {
    pub device_name: String,
    pub humidity: Option<f64>,
    pub temperature_f: Option<f64>,
    /// Percent 0–100 as reported by the remote side.
    pub speed_percent: i64,
    pub is_closed: bool,
    pub image: Option<String>,
}

impl FanSnapshot {
    pub(crate) fn from_record(record: &DeviceRecord) -> Self {
        Self {
            device_name: record.device_name.clone(),
            humidity: record.humidity,
            temperature_f: record.temperature,
            speed_percent: record.device_light_rate.unwrap_or(0),
            is_closed: record.is_close.unwrap_or(false),
            image: record.device_img.clone(),
        }
    }
}

// ── Lenient deserializers ────────────────────────────────────────────

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Str(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n.to_string(),
        Raw::Str(s) => s,
    })
}

fn de_opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Str(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(n)) => Some(n),
        Some(Raw::Str(s)) => s.trim().parse().ok(),
        None => None,
    })
}

fn de_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(n)) => Some(n),
        Some(Raw::Str(s)) => s.trim().parse().ok(),
        None => None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn device_record_accepts_numeric_id_and_rate() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "id": 87_654,
            "deviceName": "FC-E6000",
            "deviceLightRate": 40,
            "isClose": false
        }))
        .unwrap();

        assert_eq!(record.id, "87654");
        assert_eq!(record.device_light_rate, Some(40));
    }

    #[test]
    fn device_record_accepts_string_id_and_rate() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "id": "87654",
            "deviceName": "TSW-2000",
            "deviceLightRate": "75",
            "isClose": true,
            "deviceImg": "https://cdn.example/img.png",
            "firmware": "1.3.2"
        }))
        .unwrap();

        assert_eq!(record.id, "87654");
        assert_eq!(record.device_light_rate, Some(75));
        assert_eq!(record.is_close, Some(true));
        // Undocumented fields survive in the catch-all.
        assert_eq!(record.extra["firmware"], "1.3.2");
    }

    #[test]
    fn fan_snapshot_carries_telemetry() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "id": 3,
            "deviceName": "FC-E4000",
            "deviceLightRate": "55",
            "isClose": false,
            "humidity": "61.5",
            "temperature": 78.2
        }))
        .unwrap();

        let snapshot = FanSnapshot::from_record(&record);
        assert_eq!(snapshot.speed_percent, 55);
        assert_eq!(snapshot.humidity, Some(61.5));
        assert_eq!(snapshot.temperature_f, Some(78.2));
        assert!(!snapshot.is_closed);
    }

    #[test]
    fn light_snapshot_defaults_missing_fields() {
        let record: DeviceRecord =
            serde_json::from_value(json!({ "id": "L1", "deviceName": "SP-3000" })).unwrap();

        let snapshot = LightSnapshot::from_record(&record);
        assert_eq!(snapshot.brightness_percent, 0);
        assert!(!snapshot.is_closed);
        assert_eq!(snapshot.image, None);
    }

    #[test]
    fn reply_code_predicates() {
        let ok: Reply = serde_json::from_value(json!({ "code": "000" })).unwrap();
        let expired: Reply =
            serde_json::from_value(json!({ "code": "102", "msg": "token invalid" })).unwrap();

        assert!(ok.is_success());
        assert!(!ok.is_token_expired());
        assert!(expired.is_token_expired());
        assert_eq!(expired.msg.as_deref(), Some("token invalid"));
    }

    #[test]
    fn product_kind_wire_names() {
        assert_eq!(ProductKind::Light.wire_name(), "LIGHT");
        assert_eq!(ProductKind::Fan.wire_name(), "WIND");
    }
}
