//! Prediction Endpoint Client
//!
//! One-shot collaborator of the chat session: post a flat record of named
//! numeric features, get back a binary classification, its probability and a
//! human-readable message. Field schemas are the backend's business, so the
//! record is an untyped name → value map.
//!
//! The same client covers the backend's other request/response routes:
//! `GET /health` and the stateless `POST /chat`, which answers one question
//! without a persistent connection.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ApiConfig;

/// Named numeric inputs for one prediction
pub type FeatureRecord = BTreeMap<String, f64>;

/// Which model to ask
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PredictionKind {
    /// `/predict/heart-disease`
    HeartDisease,
    /// `/predict/diabetes`
    Diabetes,
    /// `/predict/cancer`
    Cancer,
}

impl PredictionKind {
    /// All kinds, in menu order
    pub const ALL: [Self; 3] = [Self::HeartDisease, Self::Diabetes, Self::Cancer];

    /// Path segment after `/predict/`
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::HeartDisease => "heart-disease",
            Self::Diabetes => "diabetes",
            Self::Cancer => "cancer",
        }
    }
}

impl fmt::Display for PredictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for PredictionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == wanted || (wanted == "heart" && *kind == Self::HeartDisease))
            .ok_or_else(|| {
                format!("unknown prediction kind {s:?} (expected heart-disease, diabetes or cancer)")
            })
    }
}

/// Backend answer for one prediction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// 1 = condition indicated, 0 = not indicated
    pub prediction: u8,
    /// Probability of the positive class, in [0, 1]
    pub probability: f64,
    /// Human-readable summary
    pub message: String,
}

impl PredictionResponse {
    /// Whether the positive class was predicted
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.prediction == 1
    }

    /// Probability as a percentage
    #[must_use]
    pub fn probability_percent(&self) -> f64 {
        self.probability * 100.0
    }

    /// Reject answers outside the contract
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::InvalidResponse`] for a class other than 0/1
    /// or a probability outside [0, 1].
    pub fn validate(self) -> Result<Self, PredictionError> {
        if self.prediction > 1 {
            return Err(PredictionError::InvalidResponse(format!(
                "prediction must be 0 or 1, got {}",
                self.prediction
            )));
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(PredictionError::InvalidResponse(format!(
                "probability must be within [0, 1], got {}",
                self.probability
            )));
        }
        Ok(self)
    }
}

/// Body of `POST /chat`
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Answer from the one-shot chat route
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply text, opaque
    pub response: String,
}

/// Backend health report
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    /// `"healthy"` when all is well
    pub status: String,
}

impl HealthStatus {
    /// Whether the backend says it is healthy
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Errors from the prediction endpoints
#[derive(Debug, Error)]
pub enum PredictionError {
    /// Network or decoding failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the backend
    #[error("Backend returned {status}: {detail}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Backend-provided detail, or the raw body
        detail: String,
    },

    /// Answer violated the response contract
    #[error("Invalid prediction response: {0}")]
    InvalidResponse(String),

    /// Endpoint URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Pull a readable message out of an error body
///
/// The backend reports failures as `{"detail": ...}`; anything else is
/// returned as-is.
#[must_use]
pub fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(text),
        }) => text,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// HTTP client for the prediction API
#[derive(Clone, Debug)]
pub struct PredictionClient {
    base_url: String,
    http: reqwest::Client,
}

impl PredictionClient {
    /// Create a client for `config.url`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not valid or the HTTP client cannot be
    /// built.
    pub fn new(config: &ApiConfig) -> Result<Self, PredictionError> {
        url::Url::parse(&config.url)
            .map_err(|e| PredictionError::InvalidUrl(format!("{}: {e}", config.url)))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Full URL for one prediction kind
    #[must_use]
    pub fn endpoint(&self, kind: PredictionKind) -> String {
        format!("{}/predict/{}", self.base_url, kind.slug())
    }

    /// Submit one feature record
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success status, or a
    /// response outside the contract.
    pub async fn predict(
        &self,
        kind: PredictionKind,
        features: &FeatureRecord,
    ) -> Result<PredictionResponse, PredictionError> {
        let url = self.endpoint(kind);
        tracing::debug!(url = %url, fields = features.len(), "Requesting prediction");

        let response = self.http.post(&url).json(features).send().await?;
        let prediction = success(response)
            .await?
            .json::<PredictionResponse>()
            .await?
            .validate()?;
        tracing::info!(
            kind = %kind,
            prediction = prediction.prediction,
            probability = prediction.probability,
            "Prediction received"
        );
        Ok(prediction)
    }

    /// Ask the backend whether it is up
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-success status.
    pub async fn health(&self) -> Result<HealthStatus, PredictionError> {
        let url = format!("{}/health", self.base_url);
        let response = self.http.get(&url).send().await?;
        Ok(success(response).await?.json::<HealthStatus>().await?)
    }

    /// Ask the assistant one question over plain HTTP
    ///
    /// Stateless: the backend starts a fresh conversation for every call.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-success status.
    pub async fn chat(&self, message: &str) -> Result<ChatResponse, PredictionError> {
        let url = format!("{}/chat", self.base_url);
        tracing::debug!(url = %url, chars = message.chars().count(), "Sending chat request");

        let response = self
            .http
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;
        let reply = success(response).await?.json::<ChatResponse>().await?;

        tracing::info!(chars = reply.response.chars().count(), "Chat reply received");
        Ok(reply)
    }
}

/// Pass a 2xx response through; turn anything else into `Status`
async fn success(response: reqwest::Response) -> Result<reqwest::Response, PredictionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PredictionError::Status {
        status: status.as_u16(),
        detail: error_detail(&body),
    })
}
