//! Builder pattern for channel configuration.
//!
//! Provides a fluent API for configuring and creating
//! [`NotificationChannel`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use mediadash_notify::NotificationChannel;
//!
//! # async fn example() -> mediadash_notify::Result<()> {
//! let channel = NotificationChannel::builder()
//!     .origin("https://media.example.com")
//!     .base_delay(Duration::from_secs(3))
//!     .max_attempts(5)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::runtime::Handle;

use crate::error::{Error, Result};
use crate::transport::{Connector, WsConnector};

use super::core::NotificationChannel;
use super::options::{
    ChannelOptions, DEFAULT_BASE_DELAY, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_ATTEMPTS, Endpoint,
    ReconnectPolicy,
};

// ============================================================================
// ChannelBuilder
// ============================================================================

/// Builder for configuring a [`NotificationChannel`].
///
/// Use [`NotificationChannel::builder()`] to create a new builder.
#[derive(Debug, Clone, Default)]
pub struct ChannelBuilder {
    /// Page origin, e.g. `https://media.example.com`.
    origin: Option<String>,
    /// Endpoint path override.
    path: Option<String>,
    /// Base reconnect delay.
    base_delay: Option<Duration>,
    /// Maximum reconnect attempts.
    max_attempts: Option<u32>,
    /// Handshake timeout.
    connect_timeout: Option<Duration>,
    /// Heartbeat interval.
    heartbeat_interval: Option<Duration>,
}

// ============================================================================
// ChannelBuilder Implementation
// ============================================================================

impl ChannelBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page origin the endpoint is derived from.
    ///
    /// # Arguments
    ///
    /// * `origin` - e.g. `"https://media.example.com"` (becomes `wss://`)
    #[inline]
    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Overrides the endpoint path (default `/ws`).
    #[inline]
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the base reconnect delay (default 3000 ms).
    #[inline]
    #[must_use]
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = Some(delay);
        self
    }

    /// Sets how many reconnection attempts are made before giving up
    /// (default 5). Zero disables automatic reconnection.
    #[inline]
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Sets the WebSocket handshake timeout (default 30 s).
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Enables client `ping` envelopes at the given interval while open.
    ///
    /// The server drops clients it has not heard from in 60 seconds, so
    /// anything well below that works.
    #[inline]
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Builds the validated options without creating a channel.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the origin is missing or a duration is zero
    /// - [`Error::Config`] if the path does not start with `/`
    /// - [`Error::Url`] / [`Error::InvalidUrl`] if the origin is unusable
    pub fn options(&self) -> Result<ChannelOptions> {
        let endpoint = self.validate_endpoint()?;
        let reconnect = self.validate_reconnect()?;
        let connect_timeout = self.validate_timeouts()?;

        Ok(ChannelOptions {
            endpoint,
            reconnect,
            connect_timeout,
            heartbeat_interval: self.heartbeat_interval,
        })
    }

    /// Builds a channel backed by the WebSocket connector.
    ///
    /// Must be called from within a Tokio runtime; the channel spawns its
    /// connection work there.
    ///
    /// # Errors
    ///
    /// Everything [`options`](Self::options) returns, plus [`Error::Config`]
    /// when called outside a runtime.
    pub fn build(self) -> Result<NotificationChannel<WsConnector>> {
        let options = self.options()?;
        let connector = WsConnector::new(options.connect_timeout);
        Self::assemble(options, connector)
    }

    /// Builds a channel backed by a custom connector.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn build_with_connector<C: Connector>(self, connector: C) -> Result<NotificationChannel<C>> {
        let options = self.options()?;
        Self::assemble(options, connector)
    }

    fn assemble<C: Connector>(
        options: ChannelOptions,
        connector: C,
    ) -> Result<NotificationChannel<C>> {
        let runtime = Handle::try_current().map_err(|_| {
            Error::config(
                "NotificationChannel must be built inside a Tokio runtime.\n\
                 Call build() from async code or within Runtime::enter().",
            )
        })?;

        Ok(NotificationChannel::from_parts(options, connector, runtime))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ChannelBuilder {
    /// Validates the origin and path.
    fn validate_endpoint(&self) -> Result<Endpoint> {
        let origin = self.origin.as_deref().ok_or_else(|| {
            Error::config(
                "Origin is required. Use .origin() to set it.\n\
                 Example: NotificationChannel::builder().origin(\"https://media.example.com\")",
            )
        })?;

        let mut endpoint = Endpoint::from_origin(origin)?;

        if let Some(path) = &self.path {
            if !path.starts_with('/') {
                return Err(Error::config(format!(
                    "Endpoint path must start with '/': {path}"
                )));
            }
            endpoint = endpoint.with_path(path.clone());
        }

        Ok(endpoint)
    }

    /// Validates the backoff parameters.
    fn validate_reconnect(&self) -> Result<ReconnectPolicy> {
        let base_delay = self.base_delay.unwrap_or(DEFAULT_BASE_DELAY);
        if base_delay.is_zero() {
            return Err(Error::config("Base reconnect delay must be greater than zero"));
        }

        Ok(ReconnectPolicy {
            base_delay,
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
        })
    }

    /// Validates handshake and heartbeat durations.
    fn validate_timeouts(&self) -> Result<Duration> {
        let connect_timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        if connect_timeout.is_zero() {
            return Err(Error::config("Connect timeout must be greater than zero"));
        }

        if self.heartbeat_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(Error::config("Heartbeat interval must be greater than zero"));
        }

        Ok(connect_timeout)
    }
}

// ============================================================================
// Tests
// ============================================================================
