//! Connection State
//!
//! ```text
//! Disconnected --start()--> Connecting --opened--> Connected
//!                               |                      |
//!                               +--failed--> Closed <--+ close/error
//! ```
//!
//! `Closed` is terminal. A controller that reached it never leaves it; a new
//! conversation needs a new controller.

use std::fmt;

use serde::Serialize;

/// Lifecycle of the single duplex connection a controller owns
///
/// Serializes lowercase (`"connecting"`) for status snapshots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Nothing attempted yet
    #[default]
    Disconnected,
    /// Connection attempt in flight
    Connecting,
    /// Transport open, sends accepted
    Connected,
    /// Terminal: failed, dropped, or torn down
    Closed,
}

impl ConnectionState {
    /// Whether `next` is a legal successor of `self`
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Disconnected, Self::Connecting)
                | (Self::Disconnected | Self::Connecting | Self::Connected, Self::Closed)
                | (Self::Connecting, Self::Connected)
        )
    }

    /// Whether no further transition can happen
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }

    /// Whether outbound sends may be attempted
    #[must_use]
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Why a controller ended up `Closed`
///
/// Kept for diagnostics only. Surfaces are expected to show a plain
/// "not connected" regardless of the cause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CloseCause {
    /// The transport never reached `Connected`
    ConnectFailed(String),
    /// The peer closed an established connection
    RemoteClosed,
    /// An established connection failed
    TransportError(String),
    /// The owner released the session
    TornDown,
}

impl CloseCause {
    /// Whether the session was ever usable before closing
    #[must_use]
    pub fn was_established(&self) -> bool {
        matches!(self, Self::RemoteClosed | Self::TransportError(_))
    }
}

impl fmt::Display for CloseCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed(reason) => write!(f, "connection failed: {reason}"),
            Self::RemoteClosed => f.write_str("closed by peer"),
            Self::TransportError(reason) => write!(f, "transport error: {reason}"),
            Self::TornDown => f.write_str("torn down"),
        }
    }
}
