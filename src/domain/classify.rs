//! Intent classification domain types
//!
//! These models mirror the JSON contract of the language-understanding
//! oracle so the pipeline can consume its output type-safely. The
//! classification is derived per request and never treated as
//! source-of-truth.

use serde::{Deserialize, Serialize};

/// Whether the request is a repair/service call or a new installation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceIntent {
    #[default]
    Service,
    Installation,
}

impl From<String> for ServiceIntent {
    fn from(s: String) -> Self {
        match s.as_str() {
            "installation" => Self::Installation,
            _ => Self::Service,
        }
    }
}

impl std::fmt::Display for ServiceIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service => write!(f, "service"),
            Self::Installation => write!(f, "installation"),
        }
    }
}

/// Classification of a free-text service request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentClassification {
    pub service_intent: ServiceIntent,
    pub service_type: String,
    pub subcategory: String,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
    /// Suggested disambiguating question when confidence is low.
    #[serde(default)]
    pub clarifier: Option<String>,
}

/// Confidence below this threshold always carries a clarifier question.
pub const CLARIFIER_THRESHOLD: f64 = 0.7;

impl IntentClassification {
    /// The safe default used whenever the oracle cannot produce a usable
    /// classification. The pipeline proceeds with this rather than stalling.
    pub fn fallback() -> Self {
        Self {
            service_intent: ServiceIntent::Service,
            service_type: "General".to_string(),
            subcategory: "General Service".to_string(),
            confidence: 0.5,
            reasoning: None,
            clarifier: Some(
                "Could you tell us a bit more about the work, including what kind of \
                 tradesperson you would expect to hire for it?"
                    .to_string(),
            ),
        }
    }

    /// Clamp confidence into [0, 1] and attach a clarifier question when
    /// confidence is low. Every oracle implementation runs its output
    /// through this before handing it to the pipeline.
    pub fn normalized(mut self) -> Self {
        self.confidence = self.confidence.clamp(0.0, 1.0);
        if self.confidence < CLARIFIER_THRESHOLD && self.clarifier.is_none() {
            self.clarifier = Some(format!(
                "Just to confirm: is this {} work ({})? A few more details would help us \
                 scope it accurately.",
                self.service_type.to_lowercase(),
                self.subcategory.to_lowercase()
            ));
        }
        self
    }
}

/// Why a classification fell back to the default.
///
/// Degradation never changes pipeline control flow; callers use this for
/// logging and telemetry only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    Transport,
    Timeout,
    MalformedResponse,
    EmptyInput,
}

impl std::fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Timeout => write!(f, "timeout"),
            Self::MalformedResponse => write!(f, "malformed_response"),
            Self::EmptyInput => write!(f, "empty_input"),
        }
    }
}

/// A classification together with the reason it was degraded, if any.
#[derive(Debug, Clone)]
pub struct ClassificationOutcome {
    pub classification: IntentClassification,
    pub degraded: Option<DegradedReason>,
}

impl ClassificationOutcome {
    pub fn confident(classification: IntentClassification) -> Self {
        Self {
            classification,
            degraded: None,
        }
    }

    pub fn degraded(reason: DegradedReason) -> Self {
        Self {
            classification: IntentClassification::fallback(),
            degraded: Some(reason),
        }
    }
}
