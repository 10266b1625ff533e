//! Session Controller
//!
//! Owns one connection attempt, the exchange log, and the pending-reply gate.
//! It is a plain synchronous state machine: callers invoke [`start`],
//! [`send`] and [`teardown`]; the transport's outcomes are fed in through
//! [`handle_event`]. Nothing here awaits or spawns.
//!
//! # Rules
//!
//! - Sends are accepted only while `Connected`, for non-blank text, and when
//!   no earlier send is still waiting for its reply. Refusals change nothing.
//! - Every inbound frame becomes exactly one assistant entry and opens the gate.
//! - Any close or error is terminal and also opens the gate, so a surface
//!   never stays stuck "thinking".
//! - Dropping the controller tears the connection down.
//!
//! [`start`]: SessionController::start
//! [`send`]: SessionController::send
//! [`teardown`]: SessionController::teardown
//! [`handle_event`]: SessionController::handle_event

use std::fmt;

use tracing::{debug, info, warn};

use crate::events::SessionEvent;
use crate::exchange::ExchangeLog;
use crate::messages::Message;
use crate::pending::{ExchangeId, PendingReply, ReplyGate};
use crate::state::{CloseCause, ConnectionState};
use crate::transport::Transport;

/// Why a send was not accepted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefusalReason {
    /// The connection is not open
    NotConnected,
    /// The text was empty after trimming
    EmptyInput,
    /// A previous send has not been answered yet
    AwaitingReply,
}

impl fmt::Display for RefusalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotConnected => "not connected",
            Self::EmptyInput => "empty input",
            Self::AwaitingReply => "waiting for a reply",
        };
        f.write_str(text)
    }
}

/// Result of [`SessionController::send`]
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Appended to the log and handed to the transport
    Sent(ExchangeId),
    /// Nothing happened
    Refused(RefusalReason),
}

impl SendOutcome {
    /// Whether the send was accepted
    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

/// Single-session chat controller
pub struct SessionController<T: Transport> {
    endpoint: String,
    transport: T,
    state: ConnectionState,
    history: Vec<ConnectionState>,
    log: ExchangeLog,
    gate: ReplyGate,
    close_cause: Option<CloseCause>,
}

impl<T: Transport> SessionController<T> {
    /// Create an idle controller for `endpoint`
    pub fn new(endpoint: impl Into<String>, transport: T) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
            state: ConnectionState::Disconnected,
            history: vec![ConnectionState::Disconnected],
            log: ExchangeLog::new(),
            gate: ReplyGate::default(),
            close_cause: None,
        }
    }

    /// Begin connecting. Does nothing unless the controller is still idle.
    pub fn start(&mut self) {
        if self.state != ConnectionState::Disconnected {
            debug!(state = %self.state, "start() ignored");
            return;
        }

        self.transition(ConnectionState::Connecting);

        if let Err(e) = self.transport.open(&self.endpoint) {
            warn!(endpoint = %self.endpoint, error = %e, "Could not start connection");
            self.close(CloseCause::ConnectFailed(e.to_string()));
        }
    }

    /// Send one user turn
    ///
    /// The text is trimmed; the trimmed text is what gets logged and sent.
    /// A refused send leaves the log, the gate and the wire untouched.
    pub fn send(&mut self, text: &str) -> SendOutcome {
        let text = text.trim();

        let refusal = if !self.state.is_connected() {
            Some(RefusalReason::NotConnected)
        } else if text.is_empty() {
            Some(RefusalReason::EmptyInput)
        } else if !self.gate.is_open() {
            Some(RefusalReason::AwaitingReply)
        } else {
            None
        };

        if let Some(reason) = refusal {
            debug!(state = %self.state, %reason, "Send refused");
            return SendOutcome::Refused(reason);
        }

        self.log.push(Message::user(text));
        let id = self.gate.hold();
        debug!(exchange = %id, chars = text.chars().count(), "User turn sent");

        if let Err(e) = self.transport.transmit(text) {
            warn!(exchange = %id, error = %e, "Transmit failed");
            self.close(CloseCause::TransportError(e.to_string()));
        }

        SendOutcome::Sent(id)
    }

    /// Apply one transport event
    ///
    /// Events that arrive after the controller closed are ignored, which is
    /// what keeps a torn-down session from coming back to life.
    pub fn handle_event(&mut self, event: SessionEvent) {
        if self.state.is_terminal() {
            debug!(event = event.kind(), "Event after close ignored");
            return;
        }

        match event {
            SessionEvent::Opened => {
                if self.state == ConnectionState::Connecting {
                    self.transition(ConnectionState::Connected);
                } else {
                    debug!(state = %self.state, "Unexpected open ignored");
                }
            }
            SessionEvent::FrameReceived(text) => self.on_frame(text),
            SessionEvent::Closed { reason } => {
                let cause = if self.state.is_connected() {
                    CloseCause::RemoteClosed
                } else {
                    CloseCause::ConnectFailed(
                        reason.unwrap_or_else(|| "closed before open".to_string()),
                    )
                };
                self.close(cause);
            }
            SessionEvent::Error(reason) => {
                let cause = if self.state.is_connected() {
                    CloseCause::TransportError(reason)
                } else {
                    CloseCause::ConnectFailed(reason)
                };
                self.close(cause);
            }
        }
    }

    /// Release the connection. Safe from any state; a no-op once closed.
    pub fn teardown(&mut self) {
        if !self.state.is_terminal() {
            self.close(CloseCause::TornDown);
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Readiness signal: the connection is open
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Whether a sent turn is still waiting for its reply
    pub fn is_awaiting_reply(&self) -> bool {
        !self.gate.is_open()
    }

    /// Whether a non-blank send would be accepted right now
    pub fn can_send(&self) -> bool {
        self.is_connected() && self.gate.is_open()
    }

    /// The outstanding exchange, if any
    pub fn pending(&self) -> Option<&PendingReply> {
        self.gate.pending()
    }

    /// Read-only view of the conversation
    pub fn log(&self) -> &ExchangeLog {
        &self.log
    }

    /// Why the controller closed, once it has
    pub fn close_cause(&self) -> Option<&CloseCause> {
        self.close_cause.as_ref()
    }

    /// Every state entered, oldest first
    pub fn history(&self) -> &[ConnectionState] {
        &self.history
    }

    /// Endpoint given at construction
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn on_frame(&mut self, text: String) {
        if !self.state.is_connected() {
            debug!(state = %self.state, "Frame before open ignored");
            return;
        }

        self.log.push(Message::assistant(text));

        match self.gate.release() {
            Some(pending) => debug!(
                exchange = %pending.id(),
                elapsed_ms = u64::try_from(pending.pending_for().as_millis()).unwrap_or(u64::MAX),
                "Reply received"
            ),
            None => warn!("Unsolicited assistant frame"),
        }
    }

    fn close(&mut self, cause: CloseCause) {
        if self.state.is_terminal() {
            return;
        }

        if let Some(pending) = self.gate.release() {
            info!(exchange = %pending.id(), "Pending reply abandoned");
        }

        self.transport.close();
        self.transition(ConnectionState::Closed);
        info!(cause = %cause, "Session closed");
        self.close_cause = Some(cause);
    }

    fn transition(&mut self, next: ConnectionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        info!(from = %self.state, to = %next, endpoint = %self.endpoint, "Session state changed");
        self.state = next;
        self.history.push(next);
    }
}

impl<T: Transport> Drop for SessionController<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<T: Transport> fmt::Debug for SessionController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .field("entries", &self.log.len())
            .field("awaiting_reply", &self.is_awaiting_reply())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::messages::Role;
    use crate::transport::{RecordingTransport, TransportCall};

    fn connected() -> (SessionController<RecordingTransport>, RecordingTransport) {
        let wire = RecordingTransport::new();
        let mut controller = SessionController::new("ws://test/ws/chat", wire.clone());
        controller.start();
        controller.handle_event(SessionEvent::Opened);
        (controller, wire)
    }

    fn entries(controller: &SessionController<RecordingTransport>) -> Vec<(Role, String)> {
        controller
            .log()
            .iter()
            .map(|m| (m.role(), m.content().to_string()))
            .collect()
    }

    #[test]
    fn test_start_moves_to_connecting() {
        let wire = RecordingTransport::new();
        let mut controller = SessionController::new("ws://test/ws/chat", wire.clone());
        assert_eq!(controller.state(), ConnectionState::Disconnected);

        controller.start();
        assert_eq!(controller.state(), ConnectionState::Connecting);
        assert_eq!(
            wire.calls(),
            vec![TransportCall::Open("ws://test/ws/chat".into())]
        );
    }

    #[test]
    fn test_start_is_idempotent() {
        let wire = RecordingTransport::new();
        let mut controller = SessionController::new("ws://test/ws/chat", wire.clone());
        controller.start();
        controller.start();

        assert_eq!(wire.open_count(), 1);
        assert_eq!(
            controller.history(),
            &[ConnectionState::Disconnected, ConnectionState::Connecting]
        );

        controller.handle_event(SessionEvent::Opened);
        controller.start();
        assert_eq!(wire.open_count(), 1);
        assert_eq!(controller.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_open_failure_closes_immediately() {
        let wire = RecordingTransport::new();
        wire.fail_open(true);
        let mut controller = SessionController::new("ws://test/ws/chat", wire.clone());
        controller.start();

        assert_eq!(controller.state(), ConnectionState::Closed);
        assert!(matches!(
            controller.close_cause(),
            Some(CloseCause::ConnectFailed(_))
        ));
        assert_eq!(wire.close_count(), 1);
    }

    #[test]
    fn test_round_trip() {
        let (mut controller, wire) = connected();

        assert!(controller.send("hello").is_sent());
        assert_eq!(entries(&controller), vec![(Role::User, "hello".into())]);
        assert!(controller.is_awaiting_reply());
        assert_eq!(wire.transmitted(), vec!["hello".to_string()]);

        controller.handle_event(SessionEvent::frame("hi there"));
        assert_eq!(
            entries(&controller),
            vec![
                (Role::User, "hello".into()),
                (Role::Assistant, "hi there".into()),
            ]
        );
        assert!(!controller.is_awaiting_reply());
        assert!(controller.can_send());
    }

    #[test]
    fn test_send_trims_text() {
        let (mut controller, wire) = connected();
        let _ = controller.send("  what is a normal heart rate?\n");
        assert_eq!(
            wire.transmitted(),
            vec!["what is a normal heart rate?".to_string()]
        );
        assert_eq!(
            controller.log().last().map(Message::content),
            Some("what is a normal heart rate?")
        );
    }

    #[test]
    fn test_blank_input_refused() {
        let (mut controller, wire) = connected();
        assert_eq!(
            controller.send("   "),
            SendOutcome::Refused(RefusalReason::EmptyInput)
        );
        assert!(controller.log().is_empty());
        assert!(!controller.is_awaiting_reply());
        assert!(wire.transmitted().is_empty());
    }

    #[test]
    fn test_single_flight() {
        let (mut controller, wire) = connected();
        let _ = controller.send("first");

        for _ in 0..3 {
            assert_eq!(
                controller.send("second"),
                SendOutcome::Refused(RefusalReason::AwaitingReply)
            );
        }
        assert_eq!(controller.log().len(), 1);
        assert_eq!(wire.transmitted(), vec!["first".to_string()]);
    }

    #[test]
    fn test_send_before_connected_refused() {
        let wire = RecordingTransport::new();
        let mut controller = SessionController::new("ws://test/ws/chat", wire.clone());
        assert_eq!(
            controller.send("early"),
            SendOutcome::Refused(RefusalReason::NotConnected)
        );
        controller.start();
        assert_eq!(
            controller.send("early"),
            SendOutcome::Refused(RefusalReason::NotConnected)
        );
        assert!(controller.log().is_empty());
        assert!(wire.transmitted().is_empty());
    }

    #[test]
    fn test_close_during_pending_reply() {
        let (mut controller, _wire) = connected();
        let _ = controller.send("a");
        assert!(controller.is_awaiting_reply());

        controller.handle_event(SessionEvent::closed());

        assert_eq!(controller.state(), ConnectionState::Closed);
        assert!(!controller.is_awaiting_reply());
        assert_eq!(entries(&controller), vec![(Role::User, "a".into())]);
        assert_eq!(controller.close_cause(), Some(&CloseCause::RemoteClosed));
    }

    #[test]
    fn test_error_after_open_is_transport_error() {
        let (mut controller, _wire) = connected();
        controller.handle_event(SessionEvent::Error("reset by peer".into()));
        assert!(matches!(
            controller.close_cause(),
            Some(CloseCause::TransportError(reason)) if reason == "reset by peer"
        ));
        assert_eq!(
            controller.send("anyone?"),
            SendOutcome::Refused(RefusalReason::NotConnected)
        );
    }

    #[test]
    fn test_error_while_connecting_is_connect_failure() {
        let wire = RecordingTransport::new();
        let mut controller = SessionController::new("ws://test/ws/chat", wire);
        controller.start();
        controller.handle_event(SessionEvent::Error("refused".into()));
        assert_eq!(
            controller.history(),
            &[
                ConnectionState::Disconnected,
                ConnectionState::Connecting,
                ConnectionState::Closed
            ]
        );
        assert!(!controller.close_cause().unwrap().was_established());
    }

    #[test]
    fn test_teardown_while_connecting_blocks_late_open() {
        let wire = RecordingTransport::new();
        let mut controller = SessionController::new("ws://test/ws/chat", wire.clone());
        controller.start();
        controller.teardown();
        controller.handle_event(SessionEvent::Opened);

        assert_eq!(controller.state(), ConnectionState::Closed);
        assert_eq!(controller.close_cause(), Some(&CloseCause::TornDown));
        assert_eq!(wire.close_count(), 1);
    }

    #[test]
    fn test_teardown_twice_closes_once() {
        let (mut controller, wire) = connected();
        controller.teardown();
        controller.teardown();
        assert_eq!(wire.close_count(), 1);
    }

    #[test]
    fn test_drop_releases_transport() {
        let (controller, wire) = connected();
        drop(controller);
        assert_eq!(wire.calls().last(), Some(&TransportCall::Close));
        assert_eq!(wire.close_count(), 1);
    }

    #[test]
    fn test_transmit_failure_closes_session() {
        let (mut controller, wire) = connected();
        wire.fail_transmit(true);

        assert!(controller.send("lost").is_sent());
        assert_eq!(controller.state(), ConnectionState::Closed);
        assert!(!controller.is_awaiting_reply());
        assert_eq!(entries(&controller), vec![(Role::User, "lost".into())]);
    }

    #[test]
    fn test_frames_after_close_ignored() {
        let (mut controller, _wire) = connected();
        controller.handle_event(SessionEvent::closed());
        controller.handle_event(SessionEvent::frame("ghost"));
        assert!(controller.log().is_empty());
    }

    #[test]
    fn test_exchange_ids_increase_per_send() {
        let (mut controller, _wire) = connected();
        let SendOutcome::Sent(first) = controller.send("one") else {
            panic!("first send refused");
        };
        assert_eq!(controller.pending().map(PendingReply::id), Some(first));
        controller.handle_event(SessionEvent::frame("reply one"));
        let SendOutcome::Sent(second) = controller.send("two") else {
            panic!("second send refused");
        };
        assert!(second > first);
    }
}
