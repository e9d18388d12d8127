use thiserror::Error;

/// Top-level error type for the `canopy-api` crate.
///
/// Only transport-level and authentication failures are errors. Business-level
/// rejections (a non-`"000"` code in an otherwise-valid reply body) are
/// returned as data in [`Reply`](crate::models::Reply) — the host decides how
/// to present them.
#[derive(Debug, Error)]
pub enum Error {
    /// Login failed: wrong credentials, a non-2xx status from the auth
    /// endpoint, or a login payload without a token.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("decode error: {message}")]
    Decode { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error came from the login flow and retrying
    /// with different credentials might resolve it.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient network error worth retrying
    /// on the host's next polling cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
