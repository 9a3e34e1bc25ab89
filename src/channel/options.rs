//! Channel configuration.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChannelOptions`] | Everything the channel needs besides credentials |
//! | [`Endpoint`] | Page origin + path, turned into a `ws(s)://` URL per connect |
//! | [`ReconnectPolicy`] | Exponential backoff parameters |
//! | [`Credentials`] | Bearer token and optional scope for one `connect` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default path of the notification endpoint.
pub const DEFAULT_PATH: &str = "/ws";

/// Default base delay between reconnection attempts.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(3000);

/// Default number of reconnection attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default WebSocket handshake timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameter carrying the bearer token.
const TOKEN_PARAM: &str = "token";

/// Query parameter carrying the scope identifier.
const SERVER_ID_PARAM: &str = "server_id";

// ============================================================================
// Credentials
// ============================================================================

/// Token and optional scope supplied to `connect`.
///
/// The `Debug` output redacts the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    server_id: Option<String>,
}

impl Credentials {
    /// Creates credentials from a token and optional server scope.
    ///
    /// An empty `server_id` means no scope.
    #[must_use]
    pub fn new(token: impl Into<String>, server_id: Option<&str>) -> Self {
        Self {
            token: token.into(),
            server_id: server_id.filter(|id| !id.is_empty()).map(str::to_string),
        }
    }

    /// Returns the bearer token.
    #[inline]
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the server scope.
    #[inline]
    #[must_use]
    pub fn server_id(&self) -> Option<&str> {
        self.server_id.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("server_id", &self.server_id)
            .finish()
    }
}

// ============================================================================
// Endpoint
// ============================================================================

/// Location of the notification endpoint.
///
/// Built from the origin of the page hosting the dashboard; the WebSocket
/// scheme follows the page scheme (`https` → `wss`, `http` → `ws`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    origin: Url,
    path: String,
}

impl Endpoint {
    /// Creates an endpoint from a page origin such as `https://media.example.com`.
    ///
    /// `ws://` and `wss://` origins are accepted as-is.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the origin does not parse
    /// - [`Error::InvalidUrl`] if the scheme is unsupported or there is no host
    pub fn from_origin(origin: &str) -> Result<Self> {
        let origin = Url::parse(origin)?;
        ws_scheme(&origin)?;

        if origin.host_str().is_none() {
            return Err(Error::invalid_url(format!("origin has no host: {origin}")));
        }

        Ok(Self {
            origin,
            path: DEFAULT_PATH.to_string(),
        })
    }

    /// Overrides the endpoint path.
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Returns the configured origin.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Returns the endpoint path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Builds the connection URL for one `connect` call.
    ///
    /// Format: `ws[s]://{host}{path}?token={token}[&server_id={id}]`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the scheme cannot be mapped.
    pub fn url(&self, credentials: &Credentials) -> Result<Url> {
        let scheme = ws_scheme(&self.origin)?;

        let mut url = self.origin.clone();
        url.set_scheme(scheme)
            .map_err(|()| {
                Error::invalid_url(format!("cannot use scheme {scheme} for {}", self.origin))
            })?;
        url.set_path(&self.path);
        url.set_fragment(None);
        url.set_query(None);

        {
            let mut query = url.query_pairs_mut();
            query.append_pair(TOKEN_PARAM, credentials.token());
            if let Some(server_id) = credentials.server_id() {
                query.append_pair(SERVER_ID_PARAM, server_id);
            }
        }

        Ok(url)
    }
}

/// Maps a page scheme to the matching WebSocket scheme.
fn ws_scheme(origin: &Url) -> Result<&'static str> {
    match origin.scheme() {
        "https" | "wss" => Ok("wss"),
        "http" | "ws" => Ok("ws"),
        other => Err(Error::invalid_url(format!(
            "unsupported origin scheme: {other}"
        ))),
    }
}

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Exponential backoff parameters.
///
/// The delay before zero-indexed attempt `n` is `base_delay × 2^n`. There is
/// no per-attempt ceiling; growth is bounded by `max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnection attempt.
    pub base_delay: Duration,
    /// Reconnection attempts before giving up.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Returns the delay before zero-indexed attempt `attempt`.
    #[inline]
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Returns `true` while another attempt may be scheduled.
    #[inline]
    #[must_use]
    pub const fn allows(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

// ============================================================================
// ChannelOptions
// ============================================================================

/// Complete channel configuration.
///
/// Usually produced by [`ChannelBuilder`](crate::ChannelBuilder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOptions {
    /// Notification endpoint.
    pub endpoint: Endpoint,
    /// Backoff parameters.
    pub reconnect: ReconnectPolicy,
    /// WebSocket handshake timeout.
    pub connect_timeout: Duration,
    /// Interval of client `ping` envelopes while open. `None` disables them.
    pub heartbeat_interval: Option<Duration>,
}

impl ChannelOptions {
    /// Creates options with defaults for the given endpoint.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            reconnect: ReconnectPolicy::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            heartbeat_interval: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
