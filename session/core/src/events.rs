//! Session Events
//!
//! Everything that can happen to a session from the outside, reduced to a few
//! discrete events. Transports push these into a channel; the controller
//! consumes them through a single entry point,
//! [`SessionController::handle_event`](crate::controller::SessionController::handle_event).
//!
//! Feeding a scripted `Vec<SessionEvent>` to a controller is the intended way
//! to exercise the state machine without a network.

/// Transport-originated events
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The connection handshake finished
    Opened,
    /// One complete text frame arrived from the assistant
    FrameReceived(String),
    /// The connection was closed, by the peer or locally
    Closed {
        /// Close reason reported by the peer, if any
        reason: Option<String>,
    },
    /// The connection failed or could not be established
    Error(String),
}

impl SessionEvent {
    /// Convenience constructor for a frame event
    pub fn frame(text: impl Into<String>) -> Self {
        Self::FrameReceived(text.into())
    }

    /// Convenience constructor for a reasonless close
    #[must_use]
    pub fn closed() -> Self {
        Self::Closed { reason: None }
    }

    /// Short name for logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::FrameReceived(_) => "frame",
            Self::Closed { .. } => "closed",
            Self::Error(_) => "error",
        }
    }
}
