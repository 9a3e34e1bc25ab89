//! Notification channel.
//!
//! This module provides the entry point consumers talk to.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`NotificationChannel`] | Connection lifecycle, reconnection, send, fan-out |
//! | [`ChannelBuilder`] | Fluent configuration builder |
//! | [`ChannelOptions`] | Endpoint, backoff and timeout settings |
//! | [`Subscription`] | Handle that removes a listener |
//! | [`ConnectionState`] / [`ChannelPhase`] | Observable state |
//!
//! # Reconnection
//!
//! An abnormal closure schedules a reconnect after `base_delay × 2^N`,
//! where `N` counts attempts since the last successful open. After
//! `max_attempts` failures the channel logs an error and goes idle until
//! the next explicit `connect`. With the defaults the delays are 3 s, 6 s,
//! 12 s, 24 s and 48 s.

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for channel configuration.
pub mod builder;

/// Core channel implementation.
pub mod core;

/// Listener registry and subscriptions.
pub mod listeners;

/// Channel options and endpoint derivation.
pub mod options;

/// Observable state enums.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ChannelBuilder;
pub use self::core::NotificationChannel;
pub use listeners::{Listener, Subscription};
pub use options::{ChannelOptions, Credentials, Endpoint, ReconnectPolicy};
pub use state::{ChannelPhase, ConnectionState};
