//! Insight Core - Realtime Assistant Session Client for IllnessInsight
//!
//! This crate holds the part of the IllnessInsight client that has actual
//! behaviour: a chat session over one persistent WebSocket connection to the
//! health assistant, plus a thin client for the one-shot prediction
//! endpoints. It has no UI dependencies; surfaces render what it exposes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 Surface (CLI, GUI, headless)                 │
//! │     reads: ConnectionState, ExchangeLog, pending gate        │
//! │     calls: start / send / teardown                           │
//! └───────────────────────────┬──────────────────────────────────┘
//!                             │
//! ┌───────────────────────────┼──────────────────────────────────┐
//! │                    ChatSession (async)                       │
//! │  ┌────────────────────────┴───────────────────────────────┐  │
//! │  │                  SessionController                     │  │
//! │  │  ┌─────────────┐  ┌─────────────┐  ┌────────────────┐  │  │
//! │  │  │ Connection  │  │ ExchangeLog │  │  Reply gate    │  │  │
//! │  │  │   state     │  │ (append-only│  │ (single-flight)│  │  │
//! │  │  └─────────────┘  └─────────────┘  └────────────────┘  │  │
//! │  └────────────────────────┬───────────────────────────────┘  │
//! │               SessionEvent ▲   │ Transport calls             │
//! │                            │   ▼                             │
//! │                    WebSocketTransport                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`SessionController`]: synchronous state machine; the only writer of the log
//! - [`ChatSession`]: drives a controller from a live WebSocket
//! - [`SessionEvent`]: transport outcomes, fed through one entry point
//! - [`ExchangeLog`]: read-only, append-observed conversation record
//! - [`PredictionClient`]: one-shot HTTP routes (predictions, health, stateless chat)
//!
//! # Quick Start
//!
//! ```ignore
//! use insight_core::{ChatSession, ClientConfig, SessionUpdate};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ClientConfig::default();
//!     let mut session = ChatSession::connect(&config.chat);
//!
//!     while let Some(update) = session.next_update().await {
//!         match update {
//!             SessionUpdate::Connected => {
//!                 let _ = session.send("What is a healthy resting heart rate?");
//!             }
//!             SessionUpdate::Reply(message) => println!("{}", message.content()),
//!             SessionUpdate::Closed(_) => break,
//!         }
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`config`]: TOML/env/CLI configuration
//! - [`controller`]: the session state machine
//! - [`events`]: transport events
//! - [`exchange`]: the exchange log
//! - [`messages`]: role-tagged messages
//! - [`pending`]: single-flight reply gate
//! - [`prediction`]: prediction endpoint client
//! - [`session`]: async WebSocket-backed session
//! - [`state`]: connection state and close causes
//! - [`transport`]: transport trait and implementations

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod controller;
pub mod events;
pub mod exchange;
pub mod messages;
pub mod pending;
pub mod prediction;
pub mod session;
pub mod state;
pub mod transport;

// Re-exports for convenience
pub use config::{
    default_config_path, load_config, load_config_from_path, ApiConfig, ChatConfig, ClientConfig,
    ClientToml, ConfigError, ConfigOverrides, ConfigSource,
};
pub use controller::{RefusalReason, SendOutcome, SessionController};
pub use events::SessionEvent;
pub use exchange::ExchangeLog;
pub use messages::{Message, Role};
pub use pending::{ExchangeId, PendingReply};
pub use prediction::{
    ChatResponse, FeatureRecord, HealthStatus, PredictionClient, PredictionError, PredictionKind,
    PredictionResponse,
};
pub use session::{ChatSession, SessionUpdate};
pub use state::{CloseCause, ConnectionState};
pub use transport::{Transport, TransportError};
