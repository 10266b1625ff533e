//! Transport Layer for Assistant Sessions
//!
//! Separates how frames travel from what the session does with them:
//! - [`WebSocketTransport`]: the real connection to the assistant service
//! - [`RecordingTransport`]: no network, records calls for scripted tests
//!
//! Both implement [`Transport`]. Connection outcomes and inbound frames are
//! not return values; they arrive as [`SessionEvent`](crate::events::SessionEvent)s
//! and are fed to the controller through its single event entry point.

pub mod recording;
pub mod traits;
pub mod websocket;

// Re-exports for convenience
pub use recording::{RecordingTransport, TransportCall};
pub use traits::{Transport, TransportError};
pub use websocket::{WebSocketOptions, WebSocketTransport};
