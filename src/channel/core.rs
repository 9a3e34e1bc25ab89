//! Notification channel implementation.
//!
//! One [`NotificationChannel`] owns at most one live transport. Its state
//! lives behind a single mutex; tasks it spawns (the connection task and the
//! reconnect timer) carry the *generation* they were started for and ignore
//! themselves once a newer transport has replaced them.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use futures_util::SinkExt;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::protocol::Message;
use crate::transport::connection::{ConnectionHandle, run_event_loop};
use crate::transport::{Connector, WsConnector};

use super::builder::ChannelBuilder;
use super::listeners::{ListenerRegistry, Subscription};
use super::options::{ChannelOptions, Credentials};
use super::state::{ChannelPhase, ConnectionState};

// ============================================================================
// NotificationChannel
// ============================================================================

/// Resilient real-time notification channel.
///
/// Cloning is cheap and yields another handle to the same channel; share
/// one instance across every consumer of the session.
///
/// All methods are synchronous and return immediately. Connection work runs
/// on the Tokio runtime the channel was built in.
///
/// # Example
///
/// ```no_run
/// use mediadash_notify::NotificationChannel;
///
/// # async fn example() -> mediadash_notify::Result<()> {
/// let channel = NotificationChannel::builder()
///     .origin("https://media.example.com")
///     .build()?;
///
/// let subscription = channel.on_message(|message| {
///     println!("{} from {:?}", message.message_type(), message.server_id());
/// });
///
/// channel.connect("bearer-token", Some("srv-1"));
/// // ...
/// subscription.unsubscribe();
/// channel.disconnect();
/// # Ok(())
/// # }
/// ```
pub struct NotificationChannel<C: Connector = WsConnector> {
    shared: Arc<Shared<C>>,
}

impl<C: Connector> Clone for NotificationChannel<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl NotificationChannel<WsConnector> {
    /// Creates a builder for a channel using the WebSocket connector.
    #[inline]
    #[must_use]
    pub fn builder() -> ChannelBuilder {
        ChannelBuilder::new()
    }
}

// ============================================================================
// NotificationChannel - Public API
// ============================================================================

impl<C: Connector> NotificationChannel<C> {
    /// Creates a channel from validated options.
    pub(crate) fn from_parts(options: ChannelOptions, connector: C, runtime: Handle) -> Self {
        Self {
            shared: Arc::new(Shared {
                options,
                connector,
                runtime,
                listeners: Arc::new(ListenerRegistry::default()),
                state: Mutex::new(ChannelState::default()),
            }),
        }
    }

    /// Opens the channel.
    ///
    /// No-op while the transport is open. Otherwise any half-open transport
    /// and any pending reconnect timer are discarded and a new transport is
    /// started for `token` / `server_id`. Failures are never returned; they
    /// feed the reconnection procedure.
    pub fn connect(&self, token: &str, server_id: Option<&str>) {
        let mut state = self.shared.state.lock();

        if state.transport == ConnectionState::Open {
            debug!("Notification channel already connected");
            return;
        }

        // A channel that was idle gets a fresh retry budget.
        if state.phase == ChannelPhase::Disconnected {
            state.attempts = 0;
        }

        state.manual_close = false;
        state.credentials = Some(Credentials::new(token, server_id));
        self.shared.open(&mut state);
    }

    /// Closes the channel and stops reconnecting.
    ///
    /// Cancels any pending reconnect timer. Automatic reconnection stays off
    /// until [`connect`](Self::connect) is called again.
    pub fn disconnect(&self) {
        let mut state = self.shared.state.lock();

        state.manual_close = true;
        state.phase = ChannelPhase::Disconnected;
        Shared::<C>::cancel_reconnect(&mut state);

        match state.transport {
            ConnectionState::Open => {
                if let Some(connection) = state.connection.take() {
                    connection.shutdown();
                }
                state.transport = ConnectionState::Closing;
            }
            ConnectionState::Connecting => {
                if let Some(task) = state.connection_task.take() {
                    task.abort();
                }
                state.transport = ConnectionState::Closed;
            }
            ConnectionState::Closing | ConnectionState::Closed => {}
        }

        info!("Notification channel disconnected");
    }

    /// Sends a message if the transport is open.
    ///
    /// The value is serialized as-is. Returns `false` when the message was
    /// dropped (not connected, or not serializable); nothing is buffered.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) -> bool {
        let connection = {
            let state = self.shared.state.lock();
            match (&state.connection, state.transport) {
                (Some(connection), ConnectionState::Open) => connection.clone(),
                _ => {
                    warn!(state = %state.transport, "Notification channel not connected, dropping message");
                    return false;
                }
            }
        };

        match serde_json::to_string(message) {
            Ok(text) => {
                let queued = connection.send_text(text);
                if !queued {
                    warn!("Notification transport already closed, dropping message");
                }
                queued
            }
            Err(e) => {
                warn!(error = %e, "Failed to serialize outbound message");
                false
            }
        }
    }

    /// Registers a message listener.
    ///
    /// Every inbound message is passed to every listener. A listener that
    /// panics is logged and does not affect the others.
    pub fn on_message<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        let id = self.shared.listeners.insert(Arc::new(handler));
        Subscription::new(id, &self.shared.listeners)
    }

    /// Returns the lifecycle stage of the current transport.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state.lock().transport
    }

    /// Returns the reconnection state machine phase.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> ChannelPhase {
        self.shared.state.lock().phase
    }

    /// Returns `true` iff the transport is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Returns the reconnection attempt counter.
    #[inline]
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.state.lock().attempts
    }

    /// Returns the number of registered listeners.
    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// Returns the channel options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ChannelOptions {
        &self.shared.options
    }
}

impl<C: Connector> fmt::Debug for NotificationChannel<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("NotificationChannel")
            .field("phase", &state.phase)
            .field("transport", &state.transport)
            .field("attempts", &state.attempts)
            .field("listeners", &self.shared.listeners.len())
            .finish()
    }
}

// ============================================================================
// ChannelState
// ============================================================================

/// Mutable channel state, guarded by [`Shared::state`].
#[derive(Default)]
struct ChannelState {
    /// Reconnection state machine phase.
    phase: ChannelPhase,
    /// Lifecycle of the current transport.
    transport: ConnectionState,
    /// Id of the current transport attempt.
    generation: u64,
    /// Reconnection attempts since the last successful open.
    attempts: u32,
    /// Set by `disconnect`, cleared by `connect`.
    manual_close: bool,
    /// Credentials of the last `connect`, reused by reconnects.
    credentials: Option<Credentials>,
    /// Transport handle; present only while open.
    connection: Option<ConnectionHandle>,
    /// Task performing the handshake and running the event loop.
    connection_task: Option<JoinHandle<()>>,
    /// Pending reconnect timer.
    reconnect_timer: Option<JoinHandle<()>>,
}

// ============================================================================
// Shared
// ============================================================================

struct Shared<C: Connector> {
    options: ChannelOptions,
    connector: C,
    runtime: Handle,
    listeners: Arc<ListenerRegistry>,
    state: Mutex<ChannelState>,
}

impl<C: Connector> Shared<C> {
    /// Starts a new transport, replacing whatever is there.
    fn open(self: &Arc<Self>, state: &mut ChannelState) {
        Self::cancel_reconnect(state);
        Self::release_transport(state);

        state.generation += 1;
        state.phase = ChannelPhase::Connecting;
        state.transport = ConnectionState::Connecting;

        let Some(credentials) = state.credentials.as_ref() else {
            error!("Cannot open notification channel without credentials");
            state.phase = ChannelPhase::Disconnected;
            state.transport = ConnectionState::Closed;
            return;
        };

        let url = match self.options.endpoint.url(credentials) {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "Failed to build notification endpoint");
                self.handle_abnormal_close(state);
                return;
            }
        };

        info!(
            host = url.host_str().unwrap_or_default(),
            path = url.path(),
            generation = state.generation,
            attempt = state.attempts,
            "Opening notification channel"
        );

        let shared = Arc::clone(self);
        let generation = state.generation;
        state.connection_task = Some(
            self.runtime
                .spawn(async move { shared.run_connection(generation, url).await }),
        );
    }

    /// Handshake, then event loop, then close handling.
    async fn run_connection(self: Arc<Self>, generation: u64, url: Url) {
        let mut stream = match self.connector.connect(&url).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, generation, "Notification transport failed to open");
                self.on_transport_closed(generation);
                return;
            }
        };

        let (handle, command_rx) = ConnectionHandle::new();
        let accepted = {
            let mut state = self.state.lock();
            if state.generation != generation || state.manual_close {
                false
            } else {
                state.phase = ChannelPhase::Connected;
                state.transport = ConnectionState::Open;
                state.attempts = 0;
                Self::cancel_reconnect(&mut state);
                state.connection = Some(handle);
                true
            }
        };

        if !accepted {
            debug!(generation, "Discarding superseded transport");
            let _ = stream.close().await;
            return;
        }

        info!(generation, "Notification channel connected");

        let reason = run_event_loop(
            stream,
            command_rx,
            &self.listeners,
            self.options.heartbeat_interval,
        )
        .await;

        debug!(?reason, generation, "Notification transport closed");
        self.on_transport_closed(generation);
    }

    /// Transport of `generation` is gone; reconnect unless closed on purpose.
    fn on_transport_closed(self: &Arc<Self>, generation: u64) {
        let mut state = self.state.lock();

        if state.generation != generation {
            debug!(generation, current = state.generation, "Ignoring close of superseded transport");
            return;
        }

        state.connection = None;
        state.connection_task = None;
        state.transport = ConnectionState::Closed;

        if state.manual_close {
            state.phase = ChannelPhase::Disconnected;
            debug!("Notification transport closed after disconnect");
            return;
        }

        warn!(generation, "Notification channel closed unexpectedly");
        self.handle_abnormal_close(&mut state);
    }

    /// Schedules a reconnect or gives up once attempts are exhausted.
    fn handle_abnormal_close(self: &Arc<Self>, state: &mut ChannelState) {
        state.transport = ConnectionState::Closed;
        let policy = self.options.reconnect;

        if !policy.allows(state.attempts) {
            error!(
                attempts = state.attempts,
                max_attempts = policy.max_attempts,
                "Notification channel reconnect attempts exhausted"
            );
            Self::cancel_reconnect(state);
            state.phase = ChannelPhase::Disconnected;
            return;
        }

        Self::cancel_reconnect(state);

        let delay = policy.delay_for(state.attempts);
        state.phase = ChannelPhase::ReconnectScheduled;

        info!(
            delay_ms = delay.as_millis() as u64,
            attempt = state.attempts + 1,
            max_attempts = policy.max_attempts,
            "Scheduling notification channel reconnect"
        );

        let shared = Arc::clone(self);
        let generation = state.generation;
        state.reconnect_timer = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            shared.fire_reconnect(generation);
        }));
    }

    /// Reconnect timer callback.
    fn fire_reconnect(self: &Arc<Self>, generation: u64) {
        let mut state = self.state.lock();

        if state.manual_close
            || state.phase != ChannelPhase::ReconnectScheduled
            || state.generation != generation
        {
            debug!(generation, "Ignoring stale reconnect timer");
            return;
        }

        // Detach rather than abort: this is the timer's own task.
        state.reconnect_timer = None;
        state.attempts += 1;

        debug!(attempt = state.attempts, "Reconnect timer fired");
        self.open(&mut state);
    }

    /// Aborts the pending reconnect timer, if any.
    fn cancel_reconnect(state: &mut ChannelState) {
        if let Some(timer) = state.reconnect_timer.take() {
            timer.abort();
            debug!("Pending reconnect cancelled");
        }
    }

    /// Lets go of the current transport before a new one is started.
    fn release_transport(state: &mut ChannelState) {
        match state.transport {
            ConnectionState::Open => {
                if let Some(connection) = state.connection.take() {
                    connection.shutdown();
                }
                state.connection_task = None;
            }
            ConnectionState::Connecting => {
                if let Some(task) = state.connection_task.take() {
                    task.abort();
                }
            }
            ConnectionState::Closing | ConnectionState::Closed => {
                state.connection = None;
                state.connection_task = None;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
