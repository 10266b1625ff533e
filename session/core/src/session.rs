//! Chat Session
//!
//! Async owner that wires a [`SessionController`] to a live
//! [`WebSocketTransport`]. The controller stays synchronous; this type only
//! pumps transport events into it one at a time and republishes the
//! connection state on a `watch` channel for anything that wants to react to
//! readiness (an input box, a status line).
//!
//! Dropping a `ChatSession` tears the connection down.

use tokio::sync::{mpsc, watch};

use crate::config::ChatConfig;
use crate::controller::{SendOutcome, SessionController};
use crate::events::SessionEvent;
use crate::exchange::ExchangeLog;
use crate::messages::Message;
use crate::state::{CloseCause, ConnectionState};
use crate::transport::{WebSocketOptions, WebSocketTransport};

/// What changed after one transport event was applied
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The connection opened; sends are now accepted
    Connected,
    /// An assistant reply was appended to the log
    Reply(Message),
    /// The session ended; no further updates follow
    Closed(CloseCause),
}

/// A live chat session over WebSocket
#[derive(Debug)]
pub struct ChatSession {
    controller: SessionController<WebSocketTransport>,
    events: mpsc::Receiver<SessionEvent>,
    state_tx: watch::Sender<ConnectionState>,
    close_reported: bool,
}

impl ChatSession {
    /// Create the session and start connecting
    ///
    /// Must be called from within a tokio runtime; otherwise the session is
    /// closed straight away and the first [`next_update`](Self::next_update)
    /// reports why.
    #[must_use]
    pub fn connect(config: &ChatConfig) -> Self {
        let options = WebSocketOptions {
            connect_timeout: config.connect_timeout,
            event_capacity: config.event_capacity,
        };
        let (transport, events) = WebSocketTransport::new(options);
        let mut controller = SessionController::new(config.url.clone(), transport);
        let (state_tx, _) = watch::channel(controller.state());

        controller.start();

        let session = Self {
            controller,
            events,
            state_tx,
            close_reported: false,
        };
        session.publish_state();
        session
    }

    /// Wait for the next observable change
    ///
    /// Returns `None` once the close has been reported.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        loop {
            if let Some(update) = self.take_close() {
                return Some(update);
            }
            if self.close_reported {
                return None;
            }

            let Some(event) = self.events.recv().await else {
                // The transport owns a sender for its whole life, so this only
                // happens if it was torn down underneath us.
                self.controller.teardown();
                self.publish_state();
                continue;
            };

            let before_state = self.controller.state();
            let before_len = self.controller.log().len();

            self.controller.handle_event(event);
            self.publish_state();

            if let Some(update) = self.take_close() {
                return Some(update);
            }
            if before_state != ConnectionState::Connected && self.controller.is_connected() {
                return Some(SessionUpdate::Connected);
            }
            if let Some(reply) = self.controller.log().since(before_len).last() {
                return Some(SessionUpdate::Reply(reply.clone()));
            }
        }
    }

    /// Send one user turn. See [`SessionController::send`].
    pub fn send(&mut self, text: &str) -> SendOutcome {
        let outcome = self.controller.send(text);
        self.publish_state();
        outcome
    }

    /// Close the connection now rather than on drop
    pub fn teardown(&mut self) {
        self.controller.teardown();
        self.publish_state();
    }

    /// Watch connection state changes
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.controller.state()
    }

    /// Whether a sent turn is still waiting for its reply
    #[must_use]
    pub fn is_awaiting_reply(&self) -> bool {
        self.controller.is_awaiting_reply()
    }

    /// Read-only view of the conversation
    #[must_use]
    pub fn log(&self) -> &ExchangeLog {
        self.controller.log()
    }

    /// The underlying controller, read-only
    #[must_use]
    pub fn controller(&self) -> &SessionController<WebSocketTransport> {
        &self.controller
    }

    fn take_close(&mut self) -> Option<SessionUpdate> {
        if self.close_reported || !self.controller.state().is_terminal() {
            return None;
        }
        self.close_reported = true;
        let cause = self
            .controller
            .close_cause()
            .cloned()
            .unwrap_or(CloseCause::TornDown);
        Some(SessionUpdate::Closed(cause))
    }

    fn publish_state(&self) {
        let state = self.controller.state();
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn unreachable_config() -> ChatConfig {
        ChatConfig {
            url: "ws://127.0.0.1:9/ws/chat".to_string(),
            connect_timeout: Duration::from_millis(500),
            ..ChatConfig::default()
        }
    }

    #[test]
    fn test_connect_outside_runtime_closes() {
        let session = ChatSession::connect(&unreachable_config());
        assert_eq!(session.state(), ConnectionState::Closed);
        assert!(matches!(
            session.controller().close_cause(),
            Some(CloseCause::ConnectFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_close_reported_once() {
        let mut session = ChatSession::connect(&unreachable_config());
        session.teardown();

        assert_eq!(
            session.next_update().await,
            Some(SessionUpdate::Closed(CloseCause::TornDown))
        );
        assert_eq!(session.next_update().await, None);
    }

    #[tokio::test]
    async fn test_state_watch_follows_controller() {
        let mut session = ChatSession::connect(&unreachable_config());
        let watcher = session.subscribe_state();
        assert_eq!(*watcher.borrow(), ConnectionState::Connecting);

        session.teardown();
        assert_eq!(*watcher.borrow(), ConnectionState::Closed);
    }
}
