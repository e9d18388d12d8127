// Device gateway client
//
// The orchestrator. A single `tokio::sync::Mutex` (the gate) serializes
// every operation against one client instance: the remote token is a single
// shared resource, and concurrent logins or interleaved stale-token
// commands corrupt it. The gate is held for the full request/response round
// trip — including the bounded token-expiry retry — and released on every
// exit path. It guarantees non-overlap only, not FIFO admission.
//
// The gate is per-instance: independent clients (separate accounts) never
// contend with each other.

use std::future::Future;

use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::envelope::SystemData;
use crate::error::Error;
use crate::models::{
    ApiReply, DeviceIdentity, DevicePage, DeviceRecord, FanSnapshot, LightSnapshot, ProductKind,
    Reply,
};
use crate::session::{Credentials, Session};
use crate::transport::{Transport, TransportConfig};

const DEVICE_LIST_PATH: &str = "udm/getDeviceList/v1";
const LAMP_SWITCH_PATH: &str = "udm/lampSwitch/v1";
const ADJUST_LIGHT_PATH: &str = "udm/adjustLight/v1";

/// Cached identities from discovery. Written only under the gate.
///
/// Latest discovery wins; there is no staleness detection. `last_seen`
/// mirrors the most recently observed id of either category and feeds the
/// envelope's `deviceId` field, matching the vendor app's single "current
/// device" notion.
#[derive(Debug, Default)]
struct DeviceCache {
    light: Option<DeviceIdentity>,
    fan: Option<DeviceIdentity>,
    last_seen: Option<String>,
}

impl DeviceCache {
    fn get(&self, kind: ProductKind) -> Option<&DeviceIdentity> {
        match kind {
            ProductKind::Light => self.light.as_ref(),
            ProductKind::Fan => self.fan.as_ref(),
        }
    }

    fn store(&mut self, identity: DeviceIdentity) {
        self.last_seen = Some(identity.id.clone());
        match identity.kind {
            ProductKind::Light => self.light = Some(identity),
            ProductKind::Fan => self.fan = Some(identity),
        }
    }
}

/// The only shared-mutable state in the crate; lives inside the gate.
struct GatewayState {
    session: Session,
    devices: DeviceCache,
}

/// Client-side gateway to the vendor cloud: login, discovery, and device
/// commands, serialized through one critical section per instance.
///
/// The host platform drives this cooperatively (polling scheduler, UI
/// actions); no background tasks or timers exist in here.
pub struct GatewayClient {
    transport: Transport,
    state: Mutex<GatewayState>,
}

impl GatewayClient {
    /// Create a client with the default session policy.
    pub fn new(credentials: Credentials, transport: &TransportConfig) -> Result<Self, Error> {
        Self::with_session(Session::new(credentials), transport)
    }

    /// Create a client from a pre-configured [`Session`] (custom login
    /// throttle interval).
    pub fn with_session(session: Session, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            transport: Transport::new(transport)?,
            state: Mutex::new(GatewayState {
                session,
                devices: DeviceCache::default(),
            }),
        })
    }

    /// Authenticate with the configured credentials.
    ///
    /// Throttled: a no-op while the current token is younger than the
    /// session's minimum login interval, so concurrent login bursts
    /// collapse into a single network call.
    pub async fn login(&self) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        let GatewayState { session, devices } = &mut *state;
        session.login(&self.transport, devices.last_seen.as_deref()).await
    }

    /// List raw device records for a product category.
    ///
    /// A business-level rejection (non-`"000"` code) is routine — the
    /// server message is logged and an empty list returned. Transport
    /// failures propagate. The first record's identity becomes the cached
    /// current device of that category.
    pub async fn list_devices(&self, kind: ProductKind) -> Result<Vec<DeviceRecord>, Error> {
        let mut state = self.state.lock().await;
        self.discover(&mut state, kind).await
    }

    /// Current light state, or `None` when no device is found or any
    /// internal error occurs. Callers treat absence as "temporarily
    /// unavailable", not fatal.
    pub async fn light_data(&self) -> Option<LightSnapshot> {
        let mut state = self.state.lock().await;
        match self.discover(&mut state, ProductKind::Light).await {
            Ok(records) => records.first().map(LightSnapshot::from_record),
            Err(err) => {
                warn!(error = %err, "light data unavailable");
                None
            }
        }
    }

    /// Current fan state, or `None`; same contract as [`light_data`](Self::light_data).
    pub async fn fan_data(&self) -> Option<FanSnapshot> {
        let mut state = self.state.lock().await;
        match self.discover(&mut state, ProductKind::Fan).await {
            Ok(records) => records.first().map(FanSnapshot::from_record),
            Err(err) => {
                warn!(error = %err, "fan data unavailable");
                None
            }
        }
    }

    /// Switch a device on (`is_close = false`) or off (`is_close = true`).
    ///
    /// Without an explicit id the cached light id is used, discovering the
    /// light first if nothing is cached yet (the vendor app's fallback).
    /// Pass the fan's id explicitly to switch a fan.
    pub async fn toggle(&self, is_close: bool, device_id: Option<&str>) -> Result<Reply, Error> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state
            .session
            .ensure_token(&self.transport, state.devices.last_seen.as_deref())
            .await?;

        let device_id = self
            .resolve_device_id(state, ProductKind::Light, device_id)
            .await?;
        let body = json!({
            "isClose": is_close,
            "deviceId": device_id,
            "groupId": null,
        });
        self.command(state, LAMP_SWITCH_PATH, &body).await
    }

    /// Set light brightness. `percent` is passed through exactly as given —
    /// range policy and rounding are host concerns.
    pub async fn set_brightness(&self, percent: u8) -> Result<Reply, Error> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state
            .session
            .ensure_token(&self.transport, state.devices.last_seen.as_deref())
            .await?;

        let device_id = self
            .resolve_device_id(state, ProductKind::Light, None)
            .await?;
        let body = json!({
            "light": percent,
            "deviceId": device_id,
            "groupId": null,
        });
        self.command(state, ADJUST_LIGHT_PATH, &body).await
    }

    /// Set fan speed. `percent` is passed through exactly as given: the
    /// vendor's 25% floor is an adapter policy, not enforced here.
    pub async fn set_fan_speed(
        &self,
        percent: u8,
        device_id: Option<&str>,
    ) -> Result<Reply, Error> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state
            .session
            .ensure_token(&self.transport, state.devices.last_seen.as_deref())
            .await?;

        let device_id = self
            .resolve_device_id(state, ProductKind::Fan, device_id)
            .await?;
        let body = json!({
            "light": percent,
            "deviceId": device_id,
            "groupId": null,
        });
        self.command(state, ADJUST_LIGHT_PATH, &body).await
    }

    /// Run an arbitrary future under the gate.
    ///
    /// Hook for hosts that need their own read sequences serialized against
    /// this client's operations. The gate is non-reentrant: the closure
    /// must not call back into this client or it will deadlock.
    pub async fn serialized<T, Fut>(&self, op: impl FnOnce() -> Fut) -> T
    where
        Fut: Future<Output = T>,
    {
        let _gate = self.state.lock().await;
        op().await
    }

    // ── Internals (called with the gate held) ────────────────────────

    /// Resolve the device id for a command: explicit id, then cache, then
    /// a fresh discovery (self-heal). May still be `None` when the account
    /// has no device of that category; the command is sent anyway and the
    /// remote side reports the failure in its reply code.
    async fn resolve_device_id(
        &self,
        state: &mut GatewayState,
        kind: ProductKind,
        explicit: Option<&str>,
    ) -> Result<Option<String>, Error> {
        if let Some(id) = explicit {
            return Ok(Some(id.to_owned()));
        }
        if let Some(identity) = state.devices.get(kind) {
            return Ok(Some(identity.id.clone()));
        }
        self.discover(state, kind).await?;
        Ok(state.devices.get(kind).map(|identity| identity.id.clone()))
    }

    async fn discover(
        &self,
        state: &mut GatewayState,
        kind: ProductKind,
    ) -> Result<Vec<DeviceRecord>, Error> {
        let GatewayState { session, devices } = state;
        session.ensure_token(&self.transport, devices.last_seen.as_deref()).await?;

        let envelope = SystemData::new(session.token(), devices.last_seen.as_deref());
        let body = json!({
            "currentPage": 0,
            "type": null,
            "productType": kind.wire_name(),
        });

        debug!(kind = %kind, "listing devices");
        let reply: ApiReply<DevicePage> =
            self.transport.post(DEVICE_LIST_PATH, &envelope, &body).await?;

        if !reply.is_success() {
            // Discovery failure is routine (device offline, account empty):
            // report "no devices" rather than erroring. Login failures, by
            // contrast, do propagate — the asymmetry is deliberate.
            warn!(
                code = %reply.code,
                msg = reply.msg.as_deref().unwrap_or(""),
                "device list rejected"
            );
            return Ok(Vec::new());
        }

        let records = reply.data.map(|page| page.list).unwrap_or_default();
        match records.first() {
            Some(first) => {
                // Only the first record is "the" device of this category;
                // the rest are discarded by every consumer.
                devices.store(DeviceIdentity {
                    id: first.id.clone(),
                    name: first.device_name.clone(),
                    kind,
                });
            }
            None => warn!(kind = %kind, "no devices found"),
        }
        Ok(records)
    }

    /// Issue a command with the token-expiry retry protocol: on a `"102"`
    /// reply, exactly one forced re-login and one re-issue of the identical
    /// command (fresh envelope, same body). A second `"102"` is returned
    /// to the caller as-is. Bounded by construction — no recursion.
    async fn command(
        &self,
        state: &mut GatewayState,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<Reply, Error> {
        let GatewayState { session, devices } = state;

        let mut retried = false;
        loop {
            let envelope = SystemData::new(session.token(), devices.last_seen.as_deref());
            debug!(path, "sending command");
            let reply: Reply = self.transport.post(path, &envelope, body).await?;

            if reply.is_token_expired() && !retried {
                warn!("token expired, re-authenticating");
                session
                    .force_login(&self.transport, devices.last_seen.as_deref())
                    .await?;
                retried = true;
                continue;
            }

            if !reply.is_success() {
                warn!(
                    code = %reply.code,
                    msg = reply.msg.as_deref().unwrap_or(""),
                    "command rejected"
                );
            }
            return Ok(reply);
        }
    }
}
