//! In-memory transport for tests.
//!
//! [`MockConnector`] hands out scripted outcomes in order: a
//! [`MockTransport`] whose far end is driven through [`MockRemote`], or a
//! connection failure. Once the script runs out every attempt fails.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::{Sink, Stream};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use url::Url;

use crate::error::{Error, Result};

use super::Connector;

// ============================================================================
// MockTransport
// ============================================================================

/// Client half of an in-memory duplex connection.
pub(crate) struct MockTransport {
    incoming: mpsc::UnboundedReceiver<std::result::Result<WsMessage, WsError>>,
    outgoing: mpsc::UnboundedSender<WsMessage>,
    closed: Arc<AtomicBool>,
}

/// Server half of an in-memory duplex connection.
pub(crate) struct MockRemote {
    incoming: Option<mpsc::UnboundedSender<std::result::Result<WsMessage, WsError>>>,
    outgoing: mpsc::UnboundedReceiver<WsMessage>,
    closed: Arc<AtomicBool>,
}

impl MockTransport {
    pub(crate) fn pair() -> (Self, MockRemote) {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        let transport = Self {
            incoming: incoming_rx,
            outgoing: outgoing_tx,
            closed: Arc::clone(&closed),
        };
        let remote = MockRemote {
            incoming: Some(incoming_tx),
            outgoing: outgoing_rx,
            closed,
        };

        (transport, remote)
    }
}

impl Stream for MockTransport {
    type Item = std::result::Result<WsMessage, WsError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().incoming.poll_recv(cx)
    }
}

impl Sink<WsMessage> for MockTransport {
    type Error = WsError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), WsError>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: WsMessage) -> std::result::Result<(), WsError> {
        self.get_mut()
            .outgoing
            .send(item)
            .map_err(|_| WsError::ConnectionClosed)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), WsError>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), WsError>> {
        self.closed.store(true, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}

impl MockRemote {
    /// Pushes a text frame to the client.
    pub(crate) fn send_text(&self, text: &str) {
        if let Some(tx) = &self.incoming {
            let _ = tx.send(Ok(WsMessage::Text(text.to_string().into())));
        }
    }

    /// Pushes a close frame to the client.
    pub(crate) fn send_close(&self) {
        if let Some(tx) = &self.incoming {
            let _ = tx.send(Ok(WsMessage::Close(None)));
        }
    }

    /// Drops the connection without a close frame.
    pub(crate) fn disconnect(&mut self) {
        self.incoming = None;
    }

    /// Returns the next text frame the client sent, if any.
    pub(crate) fn try_recv_text(&mut self) -> Option<String> {
        while let Ok(message) = self.outgoing.try_recv() {
            if let WsMessage::Text(text) = message {
                return Some(text.to_string());
            }
        }
        None
    }

    /// Returns `true` once the client closed its sink.
    pub(crate) fn is_closed_by_client(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

// ============================================================================
// MockConnector
// ============================================================================

/// Scripted connector.
#[derive(Clone, Default)]
pub(crate) struct MockConnector {
    inner: Arc<MockConnectorInner>,
}

#[derive(Default)]
struct MockConnectorInner {
    script: Mutex<VecDeque<Option<MockTransport>>>,
    urls: Mutex<Vec<Url>>,
}

impl MockConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful attempt and returns its server half.
    pub(crate) fn push_transport(&self) -> MockRemote {
        let (transport, remote) = MockTransport::pair();
        self.inner.script.lock().push_back(Some(transport));
        remote
    }

    /// Scripts a failed attempt.
    pub(crate) fn push_failure(&self) {
        self.inner.script.lock().push_back(None);
    }

    /// Number of connection attempts made so far.
    pub(crate) fn attempts(&self) -> usize {
        self.inner.urls.lock().len()
    }

    /// URLs of every attempt, in order.
    pub(crate) fn urls(&self) -> Vec<Url> {
        self.inner.urls.lock().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Stream = MockTransport;

    async fn connect(&self, url: &Url) -> Result<MockTransport> {
        self.inner.urls.lock().push(url.clone());

        self.inner
            .script
            .lock()
            .pop_front()
            .flatten()
            .ok_or_else(|| Error::connection("connection refused"))
    }
}
