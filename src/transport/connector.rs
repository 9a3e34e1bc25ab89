//! Transport connectors.
//!
//! A [`Connector`] turns an endpoint URL into an open duplex stream of
//! WebSocket messages. The channel owns one connector and calls it for the
//! initial connection and for every reconnection attempt.
//!
//! [`WsConnector`] is the production implementation backed by
//! `tokio-tungstenite`.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Sink, Stream};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use crate::channel::options::DEFAULT_CONNECT_TIMEOUT;
use crate::error::{Error, Result};

// ============================================================================
// Connector
// ============================================================================

/// Opens transports for the notification channel.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Duplex message stream produced by a successful connection.
    type Stream: Stream<Item = std::result::Result<WsMessage, WsError>>
        + Sink<WsMessage, Error = WsError>
        + Unpin
        + Send
        + 'static;

    /// Establishes a transport to `url`.
    ///
    /// # Errors
    ///
    /// Any error is treated by the channel as an abnormal closure and routed
    /// into the reconnection procedure.
    async fn connect(&self, url: &Url) -> Result<Self::Stream>;
}

// ============================================================================
// WsConnector
// ============================================================================

/// `tokio-tungstenite` connector.
///
/// `wss://` URLs require the crate's `rustls` feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WsConnector {
    /// Handshake timeout.
    connect_timeout: Duration,
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl WsConnector {
    /// Creates a connector with the given handshake timeout.
    #[inline]
    #[must_use]
    pub const fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Returns the handshake timeout.
    #[inline]
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

#[async_trait]
impl Connector for WsConnector {
    type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn connect(&self, url: &Url) -> Result<Self::Stream> {
        let handshake = timeout(self.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| Error::connection_timeout(self.connect_timeout.as_millis() as u64))?;

        let (ws_stream, response) = handshake.map_err(Error::WebSocket)?;

        debug!(
            host = url.host_str().unwrap_or_default(),
            status = %response.status(),
            "WebSocket handshake completed"
        );

        Ok(ws_stream)
    }
}

// ============================================================================
// Tests
// ============================================================================
