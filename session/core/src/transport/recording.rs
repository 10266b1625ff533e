//! Recording Transport
//!
//! A transport that goes nowhere. It remembers every call made on it so a
//! test (or a headless harness) can drive a controller with scripted
//! [`SessionEvent`](crate::events::SessionEvent)s and then inspect what would
//! have gone on the wire.
//!
//! Clones share the same record, so keep one clone and hand the other to the
//! controller.
//!
//! ```
//! use insight_core::transport::{RecordingTransport, TransportCall};
//! use insight_core::{SessionController, SessionEvent};
//!
//! let wire = RecordingTransport::new();
//! let mut controller = SessionController::new("ws://test/chat", wire.clone());
//! controller.start();
//! controller.handle_event(SessionEvent::Opened);
//! let _ = controller.send("hello");
//!
//! assert_eq!(wire.transmitted(), vec!["hello".to_string()]);
//! assert_eq!(wire.calls()[0], TransportCall::Open("ws://test/chat".into()));
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use super::traits::{Transport, TransportError};

/// One call observed by a [`RecordingTransport`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportCall {
    /// `open(endpoint)`
    Open(String),
    /// `transmit(text)`
    Transmit(String),
    /// `close()`
    Close,
}

#[derive(Debug, Default)]
struct Record {
    calls: Vec<TransportCall>,
    fail_open: bool,
    fail_transmit: bool,
}

/// In-memory transport that records calls
#[derive(Clone, Debug, Default)]
pub struct RecordingTransport {
    record: Arc<Mutex<Record>>,
}

impl RecordingTransport {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `open` calls fail
    pub fn fail_open(&self, fail: bool) {
        self.record.lock().fail_open = fail;
    }

    /// Make subsequent `transmit` calls fail
    pub fn fail_transmit(&self, fail: bool) {
        self.record.lock().fail_transmit = fail;
    }

    /// Every call in order
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.record.lock().calls.clone()
    }

    /// Texts passed to successful `transmit` calls
    #[must_use]
    pub fn transmitted(&self) -> Vec<String> {
        self.record
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                TransportCall::Transmit(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of `open` calls
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Open(_)))
    }

    /// Number of `close` calls
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Close))
    }

    fn count(&self, pred: impl Fn(&TransportCall) -> bool) -> usize {
        self.record.lock().calls.iter().filter(|c| pred(c)).count()
    }
}

impl Transport for RecordingTransport {
    fn open(&mut self, endpoint: &str) -> Result<(), TransportError> {
        let mut record = self.record.lock();
        record.calls.push(TransportCall::Open(endpoint.to_string()));
        if record.fail_open {
            return Err(TransportError::ConnectionFailed(
                "scripted open failure".to_string(),
            ));
        }
        Ok(())
    }

    fn transmit(&mut self, text: &str) -> Result<(), TransportError> {
        let mut record = self.record.lock();
        if record.fail_transmit {
            return Err(TransportError::SendFailed(
                "scripted transmit failure".to_string(),
            ));
        }
        record.calls.push(TransportCall::Transmit(text.to_string()));
        Ok(())
    }

    fn close(&mut self) {
        self.record.lock().calls.push(TransportCall::Close);
    }
}
