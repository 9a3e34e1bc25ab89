//! Per-connection event loop.
//!
//! Once a transport is open, the channel runs [`run_event_loop`] on a tokio
//! task. The loop handles:
//!
//! - Inbound text frames, parsed and fanned out to listeners
//! - Outbound frames queued through [`ConnectionHandle`]
//! - The optional heartbeat `ping`
//! - Graceful shutdown on request
//!
//! The loop returns a [`CloseReason`] so the channel can decide whether to
//! reconnect.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde_json::to_string;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, error, trace, warn};

use crate::channel::listeners::ListenerRegistry;
use crate::protocol::Message;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
#[derive(Debug)]
pub(crate) enum ConnectionCommand {
    /// Send a serialized text frame.
    Send(String),
    /// Close the connection.
    Shutdown,
}

// ============================================================================
// ConnectionHandle
// ============================================================================

/// Sending half of a running event loop.
///
/// This is the channel's "transport handle": it exists only while the
/// transport is open.
#[derive(Debug, Clone)]
pub(crate) struct ConnectionHandle {
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
}

impl ConnectionHandle {
    /// Creates a handle and the receiver the event loop consumes.
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<ConnectionCommand>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        (Self { command_tx }, command_rx)
    }

    /// Queues a text frame. Returns `false` if the loop has already exited.
    pub(crate) fn send_text(&self, text: String) -> bool {
        self.command_tx.send(ConnectionCommand::Send(text)).is_ok()
    }

    /// Asks the loop to close the transport.
    pub(crate) fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }
}

// ============================================================================
// CloseReason
// ============================================================================

/// Why an event loop exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseReason {
    /// Shutdown was requested through the handle.
    Requested,
    /// Every handle was dropped.
    HandleDropped,
    /// The server sent a close frame.
    RemoteClosed,
    /// The stream ended without a close frame.
    StreamEnded,
    /// Reading or writing failed.
    TransportError,
}

// ============================================================================
// Event Loop
// ============================================================================

/// Runs the event loop until the transport closes.
pub(crate) async fn run_event_loop<S>(
    stream: S,
    mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    listeners: &ListenerRegistry,
    heartbeat_interval: Option<Duration>,
) -> CloseReason
where
    S: Stream<Item = Result<WsMessage, WsError>> + Sink<WsMessage, Error = WsError> + Unpin,
{
    let (mut ws_write, mut ws_read) = stream.split();
    let mut heartbeat = heartbeat_interval.map(|period| {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    let reason = loop {
        tokio::select! {
            // Incoming frames from the server
            message = ws_read.next() => {
                match message {
                    Some(Ok(WsMessage::Text(text))) => {
                        handle_incoming_frame(&text, listeners);
                    }

                    Some(Ok(WsMessage::Close(frame))) => {
                        debug!(?frame, "WebSocket closed by remote");
                        break CloseReason::RemoteClosed;
                    }

                    Some(Err(e)) => {
                        error!(error = %e, "WebSocket error");
                        break CloseReason::TransportError;
                    }

                    None => {
                        debug!("WebSocket stream ended");
                        break CloseReason::StreamEnded;
                    }

                    // Binary, Ping, Pong, raw frames
                    Some(Ok(other)) => {
                        trace!(len = other.len(), "Ignoring non-text frame");
                    }
                }
            }

            // Commands from the channel
            command = command_rx.recv() => {
                match command {
                    Some(ConnectionCommand::Send(text)) => {
                        if let Err(e) = ws_write.send(WsMessage::Text(text.into())).await {
                            warn!(error = %e, "Failed to send frame");
                            break CloseReason::TransportError;
                        }
                        trace!("Frame sent");
                    }

                    Some(ConnectionCommand::Shutdown) => {
                        debug!("Shutdown command received");
                        let _ = ws_write.close().await;
                        break CloseReason::Requested;
                    }

                    None => {
                        debug!("Command channel closed");
                        let _ = ws_write.close().await;
                        break CloseReason::HandleDropped;
                    }
                }
            }

            // Keepalive
            () = next_heartbeat(&mut heartbeat) => {
                let ping = match to_string(&Message::ping()) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize heartbeat");
                        continue;
                    }
                };

                if let Err(e) = ws_write.send(WsMessage::Text(ping.into())).await {
                    warn!(error = %e, "Failed to send heartbeat");
                    break CloseReason::TransportError;
                }
                trace!("Heartbeat sent");
            }
        }
    };

    debug!(?reason, "Event loop terminated");
    reason
}

/// Parses one text frame and dispatches every message in it.
///
/// Malformed frames (or lines of a batched frame) are logged and dropped.
fn handle_incoming_frame(text: &str, listeners: &ListenerRegistry) {
    for parsed in Message::parse_frame(text) {
        match parsed {
            Ok(message) => {
                trace!(message_type = message.message_type(), "Message received");
                listeners.dispatch(&message);
            }
            Err(e) => {
                warn!(error = %e, len = text.len(), "Failed to parse incoming message");
            }
        }
    }
}

/// Resolves on the next heartbeat tick, or never when heartbeats are off.
async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
