// Request envelope ("systemData" header)
//
// Every call to the cloud API carries a `systemData` header: a JSON-encoded
// object with a fresh request id, fixed client-identity constants, the
// current bearer token, and locale fields. The remote side uses the request
// id for deduplication, so `req_id` and `timestamp` must be taken from the
// clock on every construction; all other fields are reproduced
// field-for-field from the vendor's mobile app.

use chrono::Utc;
use serde::Serialize;

const APP_VERSION: &str = "1.2.0";
const OS_TYPE: &str = "android";
const OS_VERSION: &str = "14";
const DEVICE_TYPE: &str = "SM-S928C";
const NET_TYPE: &str = "wifi";
const WIFI_NAME: &str = "123";
const TIMEZONE: &str = "Europe/Berlin";
const LANGUAGE: &str = "German";

/// Per-request authentication and identity metadata.
///
/// Built fresh for every outbound call and never stored. Construction is
/// pure apart from reading the clock; it cannot fail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemData {
    /// Epoch milliseconds at construction time. The remote side treats this
    /// as a per-request id for deduplication.
    req_id: i64,
    app_version: &'static str,
    os_type: &'static str,
    os_version: &'static str,
    device_type: &'static str,
    /// Most recently observed device id, if any.
    device_id: Option<String>,
    net_type: &'static str,
    wifi_name: &'static str,
    /// Epoch seconds at construction time.
    timestamp: i64,
    /// Current bearer token; empty string before the first login.
    token: String,
    timezone: &'static str,
    language: &'static str,
}

impl SystemData {
    /// Build a fresh envelope from the current token and cached device id.
    pub fn new(token: Option<&str>, device_id: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            req_id: now.timestamp_millis(),
            app_version: APP_VERSION,
            os_type: OS_TYPE,
            os_version: OS_VERSION,
            device_type: DEVICE_TYPE,
            device_id: device_id.map(str::to_owned),
            net_type: NET_TYPE,
            wifi_name: WIFI_NAME,
            timestamp: now.timestamp(),
            token: token.unwrap_or_default().to_owned(),
            timezone: TIMEZONE,
            language: LANGUAGE,
        }
    }

    /// The JSON string placed under the `systemData` header.
    ///
    /// The header carries a serialized JSON object, not a native header
    /// structure.
    pub fn header_value(&self) -> String {
        serde_json::to_string(self).expect("systemData always serializes")
    }
}
