// Session manager
//
// Owns the account credentials and the bearer token. A login replaces the
// token unconditionally, except that ordinary logins are throttled: bursts
// of near-simultaneous callers observing a fresh token collapse into
// no-ops. The token-expiry retry in the gateway client bypasses the
// throttle via `force_login`, since the token is known stale there.
//
// All mutation happens under the gateway client's gate — this type has no
// locking of its own.

use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, info};

use crate::envelope::SystemData;
use crate::error::Error;
use crate::models::{ApiReply, LoginPayload};
use crate::transport::Transport;

const LOGIN_PATH: &str = "ulogin/mailLogin/v1";

/// Minimum interval between ordinary (non-forced) logins.
pub const DEFAULT_MIN_LOGIN_INTERVAL: Duration = Duration::from_secs(300);

/// Account credentials, immutable for the lifetime of a client instance.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }
}

/// Authentication session: credentials, token, and freshness policy.
///
/// `token` is `Some` iff at least one login has succeeded since
/// construction.
#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    token: Option<String>,
    issued_at: Option<Instant>,
    min_login_interval: Duration,
}

impl Session {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            token: None,
            issued_at: None,
            min_login_interval: DEFAULT_MIN_LOGIN_INTERVAL,
        }
    }

    /// Override the login throttle interval (mainly for tests and
    /// accounts with short-lived tokens).
    pub fn with_min_login_interval(mut self, interval: Duration) -> Self {
        self.min_login_interval = interval;
        self
    }

    /// The account email this session authenticates as.
    pub fn email(&self) -> &str {
        &self.credentials.email
    }

    /// Current bearer token, if a login has succeeded.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn is_fresh(&self) -> bool {
        self.token.is_some()
            && self
                .issued_at
                .is_some_and(|t| t.elapsed() < self.min_login_interval)
    }

    /// Authenticate against the remote endpoint, replacing the token.
    ///
    /// No-op (no network call) while a token is younger than the throttle
    /// interval. Fails with [`Error::Authentication`] on a non-2xx status
    /// or a payload lacking a token; there is no retry inside this method.
    pub(crate) async fn login(
        &mut self,
        transport: &Transport,
        device_id: Option<&str>,
    ) -> Result<(), Error> {
        if self.is_fresh() {
            debug!("token still fresh, skipping login");
            return Ok(());
        }
        self.login_uncached(transport, device_id).await
    }

    /// Authenticate unconditionally, bypassing the throttle.
    ///
    /// Used by the token-expiry retry: the remote side has already declared
    /// the token stale, so freshness bookkeeping is irrelevant.
    pub(crate) async fn force_login(
        &mut self,
        transport: &Transport,
        device_id: Option<&str>,
    ) -> Result<(), Error> {
        self.login_uncached(transport, device_id).await
    }

    /// Login only if no token is held at all.
    pub(crate) async fn ensure_token(
        &mut self,
        transport: &Transport,
        device_id: Option<&str>,
    ) -> Result<(), Error> {
        if self.token.is_none() {
            return self.login(transport, device_id).await;
        }
        Ok(())
    }

    async fn login_uncached(
        &mut self,
        transport: &Transport,
        device_id: Option<&str>,
    ) -> Result<(), Error> {
        let envelope = SystemData::new(self.token.as_deref(), device_id);
        let body = json!({
            "email": self.credentials.email,
            "password": self.credentials.password.expose_secret(),
            "loginMethod": "1",
        });

        debug!(email = %self.credentials.email, "logging in");

        let resp = transport.send(LOGIN_PATH, &envelope, &body).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status})"),
            });
        }

        let reply: ApiReply<LoginPayload> = Transport::decode(resp).await?;
        let ApiReply { msg, data, .. } = reply;
        let token = data
            .and_then(|payload| payload.token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Authentication {
                message: msg.unwrap_or_else(|| "login reply did not include a token".into()),
            })?;

        self.token = Some(token);
        self.issued_at = Some(Instant::now());
        info!("login successful");
        Ok(())
    }
}
