//! Pending-Reply Gate
//!
//! Single-flight bookkeeping. The wire protocol pairs sends and replies only by
//! order, so at most one send may be unanswered. The gate is "closed" while a
//! [`PendingReply`] is held.
//!
//! [`ExchangeId`]s never go on the wire. They are client-side sequence numbers
//! for logs and for surfaces that want to show how long a reply has taken.

use std::fmt;
use std::time::{Duration, Instant};

/// Client-side sequence number of an accepted send
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExchangeId(u64);

impl ExchangeId {
    /// Raw sequence number, starting at 1
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A send that is waiting for its reply
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingReply {
    id: ExchangeId,
    sent_at: Instant,
}

impl PendingReply {
    /// Which exchange is outstanding
    #[must_use]
    pub fn id(&self) -> ExchangeId {
        self.id
    }

    /// When the send was accepted
    #[must_use]
    pub fn sent_at(&self) -> Instant {
        self.sent_at
    }

    /// Time elapsed since the send
    #[must_use]
    pub fn pending_for(&self) -> Duration {
        self.sent_at.elapsed()
    }
}

/// The gate itself plus the exchange counter
#[derive(Debug, Default)]
pub(crate) struct ReplyGate {
    pending: Option<PendingReply>,
    next_id: u64,
}

impl ReplyGate {
    pub(crate) fn is_open(&self) -> bool {
        self.pending.is_none()
    }

    pub(crate) fn pending(&self) -> Option<&PendingReply> {
        self.pending.as_ref()
    }

    /// Close the gate for a new exchange.
    ///
    /// Callers must check [`ReplyGate::is_open`] first.
    pub(crate) fn hold(&mut self) -> ExchangeId {
        debug_assert!(self.pending.is_none(), "gate already held");
        self.next_id += 1;
        let id = ExchangeId(self.next_id);
        self.pending = Some(PendingReply {
            id,
            sent_at: Instant::now(),
        });
        id
    }

    /// Open the gate, returning the exchange that was outstanding
    pub(crate) fn release(&mut self) -> Option<PendingReply> {
        self.pending.take()
    }
}
