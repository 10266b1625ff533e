//! Exchange Messages
//!
//! The unit of conversation: a role-tagged piece of text. A `Message` is
//! created by the session controller when a user send is accepted or when an
//! assistant frame arrives, appended to the exchange log, and never changed
//! again.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who produced a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed by the local user and sent on the wire
    User,
    /// Received from the assistant service as one complete frame
    Assistant,
}

impl Role {
    /// Short label used by text surfaces
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "you",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An immutable entry in the exchange log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub(crate) fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub(crate) fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub(crate) fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Who produced this message
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Message text, verbatim as sent or received
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the local user sent this message
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}
