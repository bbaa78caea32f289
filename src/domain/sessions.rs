//! Estimate session domain types
//!
//! A session is created from a free-text service request and accumulates
//! structured answers until it is ready for scope generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::classify::ServiceIntent;

/// Session lifecycle phase. Monotonic: once ready for scope, a session
/// never returns to awaiting answers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    AwaitingAnswers,
    ReadyForScope,
}

impl From<String> for SessionPhase {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ready_for_scope" => Self::ReadyForScope,
            _ => Self::AwaitingAnswers,
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingAnswers => write!(f, "awaiting_answers"),
            Self::ReadyForScope => write!(f, "ready_for_scope"),
        }
    }
}

/// Estimate session entity
#[derive(Debug, Clone, FromRow)]
pub struct EstimateSession {
    pub id: Uuid,
    pub description: String,
    pub address: Option<String>,
    pub photos: sqlx::types::Json<Vec<String>>,
    pub urgent: bool,
    pub service_intent: String,
    pub service_type: String,
    pub subcategory: String,
    pub confidence: f64,
    pub classifier_reasoning: Option<String>,
    pub classifier_clarifier: Option<String>,
    pub classifier_degraded: Option<String>,
    pub phase: String,
    pub created_at: DateTime<Utc>,
}

impl EstimateSession {
    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from(self.phase.clone())
    }
}

/// Request to create a session from a free-text description
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    pub description: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub photos: Option<Vec<String>>,
    #[serde(default)]
    pub urgent: Option<bool>,
}

/// Response DTO for a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub description: String,
    pub address: Option<String>,
    pub photos: Vec<String>,
    pub urgent: bool,
    pub service_intent: ServiceIntent,
    pub service_type: String,
    pub subcategory: String,
    pub confidence: f64,
    pub clarifier: Option<String>,
    pub classification_degraded: bool,
    pub phase: SessionPhase,
    pub created_at: DateTime<Utc>,
}

impl From<EstimateSession> for SessionResponse {
    fn from(s: EstimateSession) -> Self {
        let phase = s.phase();
        Self {
            id: s.id,
            description: s.description,
            address: s.address,
            photos: s.photos.0,
            urgent: s.urgent,
            service_intent: ServiceIntent::from(s.service_intent),
            service_type: s.service_type,
            subcategory: s.subcategory,
            confidence: s.confidence,
            clarifier: s.classifier_clarifier,
            classification_degraded: s.classifier_degraded.is_some(),
            phase,
            created_at: s.created_at,
        }
    }
}
