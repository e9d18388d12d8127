//! Async client for the grow-room lighting and ventilation cloud API.
//!
//! The entry point is [`GatewayClient`]: it owns the authentication session,
//! the discovered-device cache, and the single critical section (the *gate*)
//! that serializes every operation against one account. Hosts poll
//! [`light_data`](GatewayClient::light_data) / [`fan_data`](GatewayClient::fan_data)
//! on their own cadence and issue commands ([`toggle`](GatewayClient::toggle),
//! [`set_brightness`](GatewayClient::set_brightness),
//! [`set_fan_speed`](GatewayClient::set_fan_speed)); a stale-token reply is
//! healed transparently by one forced re-login and one retry.
//!
//! Business-level rejections come back as [`Reply`] values, absent devices as
//! `None` snapshots; only transport and authentication failures are `Err`.

pub mod client;
pub mod envelope;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;

pub use client::GatewayClient;
pub use error::Error;
pub use models::{
    ApiReply, DeviceIdentity, DevicePage, DeviceRecord, FanSnapshot, LightSnapshot, ProductKind,
    Reply,
};
pub use session::{Credentials, DEFAULT_MIN_LOGIN_INTERVAL, Session};
pub use transport::{DEFAULT_BASE_URL, Transport, TransportConfig};
