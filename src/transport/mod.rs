//! WebSocket transport layer.
//!
//! This module opens the connection to the dashboard's notification
//! endpoint and runs the per-connection event loop.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                        ┌─────────────────┐
//! │ NotificationChannel  │                        │  Dashboard      │
//! │                      │       WebSocket        │  server         │
//! │  Connector ──────────┼───────────────────────►│                 │
//! │  event loop task     │◄──────────────────────►│  /ws hub        │
//! │  └─► listeners       │   ws(s)://host/ws?...  │                 │
//! └──────────────────────┘                        └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connector` | [`Connector`] trait and the tungstenite [`WsConnector`] |
//! | `connection` | Event loop, outbound commands, close reasons |

// ============================================================================
// Submodules
// ============================================================================

/// Per-connection event loop.
pub(crate) mod connection;

/// Transport connectors.
pub mod connector;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use connector::{Connector, WsConnector};
