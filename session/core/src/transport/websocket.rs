//! WebSocket Client Transport
//!
//! Carries a chat session over one WebSocket connection using
//! tokio-tungstenite. Outbound turns go out as single text frames; each
//! inbound text frame is one complete assistant reply.
//!
//! `open` spawns one connection task on the current tokio runtime. The task
//! owns the socket; the transport only keeps a command queue and the task
//! handle, so every [`Transport`] method returns without awaiting.
//!
//! # Lifecycle
//!
//! ```text
//! open() ──spawn──> connect (bounded by connect_timeout)
//!                      │ ok                    │ err / timeout
//!                      ▼                       ▼
//!               SessionEvent::Opened    SessionEvent::Error
//!                      │
//!     ┌────────────────┴─────────────────┐
//!     │ select: outbound queue | socket  │
//!     └────────────────┬─────────────────┘
//!                      ▼
//!    Closed { reason } | Error(..) when the loop ends
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::events::SessionEvent;

use super::traits::{Transport, TransportError};

/// Tuning for [`WebSocketTransport`]
#[derive(Clone, Debug)]
pub struct WebSocketOptions {
    /// How long the TCP + WebSocket handshake may take
    pub connect_timeout: Duration,
    /// Capacity of the event channel handed back by [`WebSocketTransport::new`]
    pub event_capacity: usize,
}

impl Default for WebSocketOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(5000),
            event_capacity: 100,
        }
    }
}

/// Commands from the transport handle to the connection task
#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// Single-connection WebSocket client
pub struct WebSocketTransport {
    options: WebSocketOptions,
    events: mpsc::Sender<SessionEvent>,
    outbound: Option<mpsc::Sender<Outbound>>,
    task: Option<JoinHandle<()>>,
    connected: Arc<AtomicBool>,
}

impl WebSocketTransport {
    /// Create a transport and the receiver its events arrive on
    #[must_use]
    pub fn new(options: WebSocketOptions) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (events, event_rx) = mpsc::channel(options.event_capacity.max(1));
        let transport = Self {
            options,
            events,
            outbound: None,
            task: None,
            connected: Arc::new(AtomicBool::new(false)),
        };
        (transport, event_rx)
    }

    /// Whether the handshake completed and the socket is still up
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self, endpoint: &str) -> Result<(), TransportError> {
        if self.task.is_some() {
            return Err(TransportError::ConnectionFailed(
                "connection already opened".to_string(),
            ));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            TransportError::ConnectionFailed(format!("no async runtime available: {e}"))
        })?;

        // One queued turn at a time is the norm; a little slack covers the close command.
        let (outbound_tx, outbound_rx) = mpsc::channel(8);

        let task = runtime.spawn(run_connection(
            endpoint.to_string(),
            self.options.connect_timeout,
            outbound_rx,
            self.events.clone(),
            Arc::clone(&self.connected),
        ));

        self.outbound = Some(outbound_tx);
        self.task = Some(task);

        tracing::debug!(endpoint = %endpoint, "WebSocket connection task spawned");
        Ok(())
    }

    fn transmit(&mut self, text: &str) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::NotOpen)?;

        outbound
            .try_send(Outbound::Text(text.to_string()))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    TransportError::SendFailed("outbound queue full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => TransportError::ConnectionClosed,
            })
    }

    fn close(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        let outbound = self.outbound.take();

        // An established socket gets a proper close frame; anything else is aborted.
        let graceful = self.connected.load(Ordering::SeqCst)
            && outbound.is_some_and(|tx| tx.try_send(Outbound::Close).is_ok());

        if !graceful {
            task.abort();
            self.connected.store(false, Ordering::SeqCst);
        }

        tracing::debug!(graceful, "WebSocket transport closed");
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Body of the connection task
async fn run_connection(
    endpoint: String,
    connect_timeout: Duration,
    mut outbound: mpsc::Receiver<Outbound>,
    events: mpsc::Sender<SessionEvent>,
    connected: Arc<AtomicBool>,
) {
    let connect = tokio_tungstenite::connect_async(endpoint.as_str());
    let stream = match tokio::time::timeout(connect_timeout, connect).await {
        Ok(Ok((stream, _response))) => stream,
        Ok(Err(e)) => {
            let err = TransportError::ConnectionFailed(e.to_string());
            tracing::warn!(endpoint = %endpoint, error = %err, "WebSocket connect failed");
            let _ = events.send(SessionEvent::Error(err.to_string())).await;
            return;
        }
        Err(_) => {
            let err = TransportError::ConnectTimeout(connect_timeout);
            tracing::warn!(endpoint = %endpoint, error = %err, "WebSocket connect timed out");
            let _ = events.send(SessionEvent::Error(err.to_string())).await;
            return;
        }
    };

    connected.store(true, Ordering::SeqCst);
    tracing::info!(endpoint = %endpoint, "Connected to assistant");

    if events.send(SessionEvent::Opened).await.is_err() {
        // Nobody is listening any more; dropping the stream closes the socket.
        connected.store(false, Ordering::SeqCst);
        return;
    }

    let (mut write, mut read) = stream.split();

    let ending = loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = write.send(WsMessage::Text(text)).await {
                        let err = TransportError::WebSocket(e.to_string());
                        tracing::warn!(error = %err, "WebSocket write failed");
                        break SessionEvent::Error(err.to_string());
                    }
                }
                Some(Outbound::Close) | None => {
                    if let Err(e) = write.close().await {
                        tracing::debug!(error = %e, "Close handshake incomplete");
                    }
                    break SessionEvent::closed();
                }
            },
            frame = read.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    if events.send(SessionEvent::FrameReceived(text)).await.is_err() {
                        let _ = write.close().await;
                        break SessionEvent::closed();
                    }
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.into_owned())
                        .filter(|r| !r.is_empty());
                    tracing::info!(reason = ?reason, "Assistant closed the connection");
                    break SessionEvent::Closed { reason };
                }
                Some(Ok(WsMessage::Binary(payload))) => {
                    tracing::debug!(bytes = payload.len(), "Ignoring binary frame");
                }
                // Pings are answered by tungstenite itself on the next read/write.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let err = TransportError::WebSocket(e.to_string());
                    tracing::warn!(error = %err, "WebSocket read failed");
                    break SessionEvent::Error(err.to_string());
                }
                None => break SessionEvent::closed(),
            },
        }
    };

    connected.store(false, Ordering::SeqCst);
    tracing::info!(endpoint = %endpoint, event = ending.kind(), "Disconnected from assistant");
    let _ = events.send(ending).await;
}
