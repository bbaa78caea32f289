//! Intent classification oracle
//!
//! Maps a free-text service request to a structured classification. Two
//! implementations behind one trait:
//! - `LlmOracle` calls the language-understanding service over HTTP
//! - `KeywordOracle` is a deterministic taxonomy used in development and
//!   tests, so the pipeline's control flow never needs a network call
//!
//! Oracle failures are absorbed here: every path returns a usable
//! classification, degraded to the default when the oracle cannot answer.
//! There is no retry; a timeout degrades synchronously.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::classify::{
    ClassificationOutcome, DegradedReason, IntentClassification, ServiceIntent,
};

/// Instruction sent alongside the raw user text. The oracle returns JSON
/// matching [`IntentClassification`].
const CLASSIFY_INSTRUCTION: &str = "Classify this home/business service request. Decide whether \
    it is a repair (service) or a new installation, name the trade (service_type) and the most \
    specific subcategory, and report your confidence between 0 and 1. Respond with JSON fields: \
    service_intent, service_type, subcategory, confidence, reasoning, clarifier.";

/// Polymorphic oracle seam so the pipeline is testable without the network.
#[async_trait]
pub trait IntentOracle: Send + Sync {
    fn name(&self) -> &'static str;

    /// Classify free text. Never errors: failures degrade to the default
    /// classification with a reason attached for telemetry.
    async fn classify(&self, text: &str, request_id: Option<&str>) -> ClassificationOutcome;

    async fn health_check(&self) -> Result<()>;
}

// =============================================================================
// LLM-backed oracle
// =============================================================================

/// Client for the language-understanding service.
pub struct LlmOracle {
    client: Client,
    base_url: String,
    token: String,
}

impl LlmOracle {
    pub fn new(base_url: &str, token: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = base_url, "Intent oracle client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn request_classification(
        &self,
        text: &str,
        request_id: Option<&str>,
    ) -> Result<IntentClassification, DegradedReason> {
        #[derive(Serialize)]
        struct Request<'a> {
            instruction: &'static str,
            text: &'a str,
        }

        #[derive(Deserialize)]
        struct Response {
            classification: IntentClassification,
        }

        let url = format!("{}/v1/intent/classify", self.base_url);

        let mut req = self
            .client
            .post(&url)
            .header("X-Internal-Token", &self.token)
            .header("Content-Type", "application/json");

        if let Some(rid) = request_id {
            req = req.header("x-request-id", rid);
        }

        debug!(url = %url, "Oracle classify request");

        let response = req
            .json(&Request {
                instruction: CLASSIFY_INSTRUCTION,
                text,
            })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Oracle request failed");
                if e.is_timeout() {
                    DegradedReason::Timeout
                } else {
                    DegradedReason::Transport
                }
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Oracle returned error status");
            return Err(DegradedReason::Transport);
        }

        response
            .json::<Response>()
            .await
            .map(|r| r.classification)
            .map_err(|e| {
                warn!(error = %e, "Failed to parse oracle response");
                DegradedReason::MalformedResponse
            })
    }
}

#[async_trait]
impl IntentOracle for LlmOracle {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn classify(&self, text: &str, request_id: Option<&str>) -> ClassificationOutcome {
        if text.trim().is_empty() {
            return ClassificationOutcome::degraded(DegradedReason::EmptyInput);
        }

        match self.request_classification(text, request_id).await {
            Ok(classification) => ClassificationOutcome::confident(classification.normalized()),
            Err(reason) => ClassificationOutcome::degraded(reason),
        }
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("Oracle health check failed")?
            .error_for_status()
            .context("Oracle unhealthy")?;

        Ok(())
    }
}

// =============================================================================
// Deterministic keyword oracle
// =============================================================================

struct ServiceTypeRule {
    service_type: &'static str,
    type_keywords: &'static [&'static str],
    subcategories: &'static [(&'static str, &'static [&'static str])],
    default_subcategory: &'static str,
}

const TAXONOMY: &[ServiceTypeRule] = &[
    ServiceTypeRule {
        service_type: "Plumbing",
        type_keywords: &[
            "plumb", "pipe", "sink", "toilet", "faucet", "drain", "water heater", "sewer",
        ],
        subcategories: &[
            ("Leak Repair", &["leak", "drip", "burst"]),
            ("Drain Cleaning", &["drain", "clog", "backed up"]),
            ("Faucet & Fixture", &["faucet", "fixture", "tap"]),
            ("Water Heater", &["water heater", "hot water"]),
            ("Toilet Repair", &["toilet"]),
        ],
        default_subcategory: "General Plumbing",
    },
    ServiceTypeRule {
        service_type: "Electrical",
        type_keywords: &[
            "electric", "outlet", "breaker", "panel", "wiring", "light switch", "ceiling fan",
        ],
        subcategories: &[
            ("Outlet & Switch", &["outlet", "switch"]),
            ("Panel Upgrade", &["panel", "breaker"]),
            ("Lighting", &["light", "fan", "chandelier"]),
            ("Wiring", &["wiring", "rewire"]),
        ],
        default_subcategory: "General Electrical",
    },
    ServiceTypeRule {
        service_type: "HVAC",
        type_keywords: &[
            "hvac", "furnace", "air condition", "a/c", "ac unit", "heat pump", "thermostat",
            "duct",
        ],
        subcategories: &[
            ("Cooling Repair", &["air condition", "a/c", "ac unit", "cool"]),
            ("Heating Repair", &["furnace", "heat pump", "heating", "no heat"]),
            ("Thermostat", &["thermostat"]),
            ("Ductwork", &["duct"]),
        ],
        default_subcategory: "General HVAC",
    },
    ServiceTypeRule {
        service_type: "Roofing",
        type_keywords: &["roof", "shingle", "gutter", "flashing"],
        subcategories: &[
            ("Roof Leak Repair", &["leak", "drip"]),
            ("Shingle Replacement", &["shingle"]),
            ("Gutter Service", &["gutter", "downspout"]),
        ],
        default_subcategory: "General Roofing",
    },
    ServiceTypeRule {
        service_type: "Carpentry",
        type_keywords: &[
            "deck", "railing", "cabinet", "door", "trim", "fence", "stairs", "carpenter",
        ],
        subcategories: &[
            ("Deck Repair", &["deck", "railing"]),
            ("Cabinet & Trim", &["cabinet", "trim"]),
            ("Door & Window", &["door", "window"]),
            ("Fence Repair", &["fence", "gate"]),
        ],
        default_subcategory: "General Carpentry",
    },
    ServiceTypeRule {
        service_type: "Painting",
        type_keywords: &["paint", "stain", "primer"],
        subcategories: &[
            ("Exterior Painting", &["exterior", "siding", "outside"]),
            ("Interior Painting", &["interior", "bedroom", "wall", "ceiling"]),
        ],
        default_subcategory: "General Painting",
    },
    ServiceTypeRule {
        service_type: "Landscaping",
        type_keywords: &[
            "lawn", "landscap", "tree", "sprinkler", "irrigation", "mow", "hedge", "yard",
        ],
        subcategories: &[
            ("Tree Service", &["tree", "stump", "branch"]),
            ("Irrigation", &["sprinkler", "irrigation"]),
            ("Lawn Care", &["lawn", "mow", "grass"]),
        ],
        default_subcategory: "General Landscaping",
    },
    ServiceTypeRule {
        service_type: "Cleaning",
        type_keywords: &["clean", "pressure wash", "power wash", "carpet", "janitorial"],
        subcategories: &[
            ("Pressure Washing", &["pressure wash", "power wash"]),
            ("Carpet Cleaning", &["carpet"]),
            ("Deep Cleaning", &["deep clean", "move out", "move-out"]),
        ],
        default_subcategory: "General Cleaning",
    },
    ServiceTypeRule {
        service_type: "Appliance Repair",
        type_keywords: &[
            "dishwasher", "refrigerator", "fridge", "washer", "dryer", "oven", "stove",
            "appliance", "microwave",
        ],
        subcategories: &[
            ("Kitchen Appliance", &["dishwasher", "refrigerator", "fridge", "oven", "stove", "microwave"]),
            ("Laundry Appliance", &["washer", "dryer"]),
        ],
        default_subcategory: "General Appliance",
    },
    ServiceTypeRule {
        service_type: "Pest Control",
        type_keywords: &["pest", "termite", "rodent", "mice", "rats", "ants", "roach", "wasp"],
        subcategories: &[
            ("Rodent Control", &["rodent", "mice", "rats"]),
            ("Insect Treatment", &["ants", "roach", "wasp", "termite"]),
        ],
        default_subcategory: "General Pest Control",
    },
];

const INSTALLATION_KEYWORDS: &[&str] = &[
    "install", "replace", "new ", "mount", "add a", "upgrade", "put in",
];

/// Deterministic keyword-taxonomy oracle. Used for development and tests;
/// selected via `ORACLE_PROVIDER=keyword`.
pub struct KeywordOracle;

impl KeywordOracle {
    fn classify_text(text: &str) -> IntentClassification {
        let lower = text.to_lowercase();

        let service_intent = if INSTALLATION_KEYWORDS.iter().any(|k| lower.contains(k)) {
            ServiceIntent::Installation
        } else {
            ServiceIntent::Service
        };

        for rule in TAXONOMY {
            let type_hit = rule.type_keywords.iter().find(|k| lower.contains(*k));
            let Some(type_keyword) = type_hit else {
                continue;
            };

            let subcategory_hit = rule
                .subcategories
                .iter()
                .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)));

            let (subcategory, confidence, reasoning) = match subcategory_hit {
                Some((subcat, _)) => (
                    *subcat,
                    0.9,
                    format!("matched '{}' for {} / {}", type_keyword, rule.service_type, subcat),
                ),
                None => (
                    rule.default_subcategory,
                    0.75,
                    format!("matched '{}' for {}", type_keyword, rule.service_type),
                ),
            };

            return IntentClassification {
                service_intent,
                service_type: rule.service_type.to_string(),
                subcategory: subcategory.to_string(),
                confidence,
                reasoning: Some(reasoning),
                clarifier: None,
            }
            .normalized();
        }

        // No taxonomy hit: the safe default, normalized so it carries a
        // clarifier.
        IntentClassification {
            service_intent,
            ..IntentClassification::fallback()
        }
        .normalized()
    }
}

#[async_trait]
impl IntentOracle for KeywordOracle {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn classify(&self, text: &str, _request_id: Option<&str>) -> ClassificationOutcome {
        if text.trim().is_empty() {
            return ClassificationOutcome::degraded(DegradedReason::EmptyInput);
        }
        ClassificationOutcome::confident(Self::classify_text(text))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plumber_leak_request_classifies_as_plumbing_leak() {
        let outcome = KeywordOracle
            .classify(
                "I need a plumber to fix a leaking pipe under my kitchen sink",
                None,
            )
            .await;

        assert!(outcome.degraded.is_none());
        let c = outcome.classification;
        assert_eq!(c.service_intent, ServiceIntent::Service);
        assert_eq!(c.service_type, "Plumbing");
        assert!(c.subcategory.to_lowercase().contains("leak"));
        assert!(c.confidence > 0.6);
    }

    #[tokio::test]
    async fn install_keywords_flip_intent_to_installation() {
        let outcome = KeywordOracle
            .classify("Install a new ceiling fan in the living room", None)
            .await;

        let c = outcome.classification;
        assert_eq!(c.service_intent, ServiceIntent::Installation);
        assert_eq!(c.service_type, "Electrical");
    }

    #[tokio::test]
    async fn unknown_text_falls_back_to_default_with_clarifier() {
        let outcome = KeywordOracle
            .classify("something is wrong with my place", None)
            .await;

        // The oracle answered, so the outcome is not degraded, but the
        // classification is the low-confidence default with a clarifier.
        assert!(outcome.degraded.is_none());
        let c = outcome.classification;
        assert_eq!(c.service_type, "General");
        assert_eq!(c.subcategory, "General Service");
        assert!(c.confidence < 0.7);
        assert!(c.clarifier.is_some());
    }

    #[tokio::test]
    async fn empty_input_is_degraded() {
        let outcome = KeywordOracle.classify("   ", None).await;
        assert_eq!(outcome.degraded, Some(DegradedReason::EmptyInput));
        assert_eq!(outcome.classification.service_type, "General");
        assert!(outcome.classification.clarifier.is_some());
    }

    #[test]
    fn low_confidence_always_carries_clarifier() {
        let c = IntentClassification {
            service_intent: ServiceIntent::Service,
            service_type: "Plumbing".to_string(),
            subcategory: "Leak Repair".to_string(),
            confidence: 0.4,
            reasoning: None,
            clarifier: None,
        }
        .normalized();
        assert!(c.clarifier.is_some());

        let confident = IntentClassification {
            service_intent: ServiceIntent::Service,
            service_type: "Plumbing".to_string(),
            subcategory: "Leak Repair".to_string(),
            confidence: 0.95,
            reasoning: None,
            clarifier: None,
        }
        .normalized();
        assert!(confident.clarifier.is_none());
    }

    #[test]
    fn confidence_is_clamped_to_unit_interval() {
        let c = IntentClassification {
            service_intent: ServiceIntent::Service,
            service_type: "Plumbing".to_string(),
            subcategory: "Leak Repair".to_string(),
            confidence: 1.7,
            reasoning: None,
            clarifier: None,
        }
        .normalized();
        assert!((c.confidence - 1.0).abs() < f64::EPSILON);
    }
}
