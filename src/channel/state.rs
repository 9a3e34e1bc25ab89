//! Channel and transport state enums.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle stage of the current transport.
///
/// Mirrors the browser `WebSocket.readyState` values; [`Closed`](Self::Closed)
/// also stands for "no transport at all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Handshake in progress.
    Connecting,
    /// Transport open; frames flow both ways.
    Open,
    /// Close requested, close handshake not finished.
    Closing,
    /// No live transport.
    #[default]
    Closed,
}

impl ConnectionState {
    /// Returns the numeric `readyState` code (0..=3).
    #[inline]
    #[must_use]
    pub const fn ready_state(&self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closing => 2,
            Self::Closed => 3,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "CONNECTING",
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
            Self::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

// ============================================================================
// ChannelPhase
// ============================================================================

/// Reconnection state machine phase.
///
/// ```text
/// Disconnected ──connect()──► Connecting ──open──► Connected
///      ▲                        │   ▲                  │
///      │ attempts exhausted     │   │ timer fires      │ unexpected close
///      │ or disconnect()        ▼   │                  ▼
///      └──────────────── ReconnectScheduled ◄──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelPhase {
    /// Idle: never connected, manually closed, or out of attempts.
    #[default]
    Disconnected,
    /// A transport is being established.
    Connecting,
    /// The transport is open.
    Connected,
    /// Waiting for the backoff timer to retry.
    ReconnectScheduled,
}

impl fmt::Display for ChannelPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::ReconnectScheduled => "RECONNECT_SCHEDULED",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Tests
// ============================================================================
