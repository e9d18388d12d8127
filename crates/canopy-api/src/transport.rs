// HTTP transport
//
// One POST per operation, stateless. The cloud API encodes business failure
// inside the `code` field of an otherwise-200 JSON body, so `post` decodes
// without gating on HTTP status; the login flow applies its stricter
// non-2xx rule on top of `send`.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::envelope::SystemData;
use crate::error::Error;

/// Production endpoint root of the vendor cloud.
pub const DEFAULT_BASE_URL: &str = "https://api.lgledsolutions.com/api/android";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport configuration for building a gateway client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// API root; joined with endpoint paths like `udm/getDeviceList/v1`.
    pub base_url: Url,
    /// Whole-request timeout of the underlying HTTP client. A timeout
    /// surfaces as [`Error::Transport`]; no cancellation is threaded
    /// through beyond it.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL parses"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("canopy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Transport)
    }
}

/// Stateless HTTP layer: URL construction, the `systemData` header, and
/// JSON decoding. Holds no session state — the gateway client owns that.
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
}

impl Transport {
    /// Create a transport from a [`TransportConfig`].
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: config.build_client()?,
            base_url: config.base_url.clone(),
        })
    }

    /// Create a transport with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The API root this transport talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint_url(&self, path: &str) -> Url {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{path}")).expect("invalid endpoint URL")
    }

    /// Send one POST with the `systemData` header and a JSON body.
    ///
    /// Fails only on connection-level problems; the response is returned
    /// whatever its status.
    pub(crate) async fn send(
        &self,
        path: &str,
        envelope: &SystemData,
        body: &(impl Serialize + Sync),
    ) -> Result<reqwest::Response, Error> {
        let url = self.endpoint_url(path);
        debug!("POST {}", url);

        self.http
            .post(url)
            .header("systemData", envelope.header_value())
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)
    }

    /// POST and decode the JSON reply, regardless of HTTP status.
    ///
    /// Non-login endpoints report failure through the body's `code` field
    /// with a 2xx status, so the status is not consulted here.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        envelope: &SystemData,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let resp = self.send(path, envelope, body).await?;
        Self::decode(resp).await
    }

    /// Decode a response body as JSON, keeping a preview for diagnostics.
    pub(crate) async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await.map_err(Error::Transport)?;

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Decode {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}
