//! Exchange Log
//!
//! Ordered, append-only record of a chat session. Insertion order is
//! chronological order is display order.
//!
//! Surfaces get a shared reference and can only read. Appending is
//! crate-private so the session controller stays the single writer.
//! Because entries are never edited or removed, a renderer can diff by length:
//! remember how many entries it drew and ask for [`ExchangeLog::since`].

use serde::{Serialize, Serializer};

use crate::messages::{Message, Role};

/// Append-only sequence of exchanged messages
///
/// Serializes as a plain array of `{role, content}` entries.
#[derive(Clone, Debug, Default)]
pub struct ExchangeLog {
    entries: Vec<Message>,
    user_count: usize,
}

impl ExchangeLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, message: Message) {
        if message.is_user() {
            self.user_count += 1;
        }
        self.entries.push(message);
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been exchanged yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry
    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.entries.last()
    }

    /// Iterate in chronological order
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.entries.iter()
    }

    /// All entries as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[Message] {
        &self.entries
    }

    /// Entries appended after the first `seen`
    ///
    /// Returns an empty slice when `seen` is at or past the end.
    #[must_use]
    pub fn since(&self, seen: usize) -> &[Message] {
        self.entries.get(seen..).unwrap_or(&[])
    }

    /// Number of user entries
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.user_count
    }

    /// Number of assistant entries
    #[must_use]
    pub fn assistant_count(&self) -> usize {
        self.entries.len() - self.user_count
    }

    /// Whether the latest entry is a user send that has no reply yet
    #[must_use]
    pub fn ends_with_unanswered_send(&self) -> bool {
        matches!(self.last().map(Message::role), Some(Role::User))
    }
}

impl Serialize for ExchangeLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

impl<'a> IntoIterator for &'a ExchangeLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
