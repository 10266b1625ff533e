//! Transport Traits
//!
//! The seam between the session controller and whatever carries frames.
//!
//! Every method is synchronous and must return promptly: the controller calls
//! them from inside its own state transitions. Anything that takes time
//! (handshakes, socket writes) happens elsewhere and is reported back as a
//! [`SessionEvent`](crate::events::SessionEvent) on the channel the transport
//! was created with.

use std::time::Duration;

use thiserror::Error;

/// Errors a transport can report synchronously
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection could not be initiated
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The handshake did not finish in time
    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// A frame could not be queued for sending
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The connection is gone
    #[error("Connection closed")]
    ConnectionClosed,

    /// The transport was used before `open`
    #[error("Transport not open")]
    NotOpen,

    /// WebSocket protocol or IO failure
    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

/// Client side of a duplex, text-framed connection
pub trait Transport: Send {
    /// Begin connecting to `endpoint`
    ///
    /// Success only means the attempt started. The outcome arrives later as
    /// `Opened`, `Error` or `Closed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt could not even be started.
    fn open(&mut self, endpoint: &str) -> Result<(), TransportError>;

    /// Queue one text frame
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be queued.
    fn transmit(&mut self, text: &str) -> Result<(), TransportError>;

    /// Release the connection. Aborts an attempt still in flight.
    ///
    /// Must be idempotent and safe before `open`.
    fn close(&mut self);
}
