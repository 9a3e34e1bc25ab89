//! Mediadash Notify - Resilient real-time notifications for the media dashboard.
//!
//! This library keeps one WebSocket connection to the dashboard server's
//! notification hub and fans every inbound message out to registered
//! listeners.
//!
//! # Architecture
//!
//! - **Channel**: owns the connection lifecycle and the reconnect state machine
//! - **Transport**: opens the socket and runs a per-connection event loop
//! - **Protocol**: the `{type, server_id, data, timestamp}` JSON envelope
//!
//! Key behaviors:
//!
//! - Endpoint derived from the page origin (`https` → `wss`, `http` → `ws`)
//! - Bearer token and optional `server_id` scope sent as query parameters
//! - Exponential backoff after abnormal closure, bounded attempt count
//! - A panicking listener never affects the others
//!
//! # Quick Start
//!
//! ```no_run
//! use mediadash_notify::{MessageKind, NotificationChannel, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let channel = NotificationChannel::builder()
//!         .origin("https://media.example.com")
//!         .build()?;
//!
//!     let _subscription = channel.on_message(|message| {
//!         if message.kind() == MessageKind::DeviceUpdate {
//!             println!("device changed: {}", message.data());
//!         }
//!     });
//!
//!     channel.connect("bearer-token", Some("srv-1"));
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     channel.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`channel`] | [`NotificationChannel`], builder, options, state |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Message envelope and kinds |
//! | [`transport`] | Connectors and event loop |
//!
//! # Features
//!
//! - **`rustls`**: enables `wss://` endpoints

// ============================================================================
// Modules
// ============================================================================

/// Notification channel.
///
/// Use [`NotificationChannel::builder()`] to create a configured channel.
pub mod channel;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Notification message envelope.
pub mod protocol;

/// WebSocket transport layer.
///
/// Exposes the [`Connector`] seam; the event loop is internal.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Channel types
pub use channel::{
    ChannelBuilder, ChannelOptions, ChannelPhase, ConnectionState, Credentials, Endpoint,
    Listener, NotificationChannel, ReconnectPolicy, Subscription,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::ListenerId;

// Protocol types
pub use protocol::{Message, MessageKind};

// Transport types
pub use transport::{Connector, WsConnector};
