//! WebSocket protocol message types.
//!
//! The notification endpoint speaks a single envelope in both directions.
//!
//! | Direction | Content |
//! |-----------|---------|
//! | Server → Client | `system`, `server-status`, `device-update`, `library-update`, `pong` |
//! | Client → Server | `ping`, or any caller-supplied JSON via [`NotificationChannel::send`](crate::NotificationChannel::send) |

// ============================================================================
// Submodules
// ============================================================================

/// Message envelope and kinds.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use message::{Message, MessageKind};
