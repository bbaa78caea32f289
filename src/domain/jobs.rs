//! Completed job domain types
//!
//! A completed job is appended once per session when actual outcomes are
//! known. Its accuracy score and tags are computed at insert time and never
//! recomputed: the table is the append-only precedent corpus.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// Database row for a completed job. Monetary columns are NUMERIC dollars;
/// conversion to integer cents happens in [`CompletedJob::from`].
#[derive(Debug, Clone, FromRow)]
pub struct CompletedJobRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub service_type: String,
    pub subcategory: String,
    pub original_scope: sqlx::types::Json<serde_json::Value>,
    pub structured_answers: sqlx::types::Json<HashMap<String, String>>,
    pub estimated_man_hours: Option<f64>,
    pub estimated_cost: Option<rust_decimal::Decimal>,
    pub actual_man_hours: Option<f64>,
    pub actual_cost: Option<rust_decimal::Decimal>,
    pub customer_rating: Option<i32>,
    pub issues_encountered: Option<String>,
    pub accuracy_score: Option<f64>,
    pub tags: sqlx::types::Json<Vec<String>>,
    pub completed_at: DateTime<Utc>,
}

fn decimal_to_cents(d: rust_decimal::Decimal) -> i64 {
    (d * rust_decimal::Decimal::from(100))
        .round()
        .to_i64()
        .unwrap_or(0)
}

/// Completed job with money in integer cents, as used by the estimator.
#[derive(Debug, Clone)]
pub struct CompletedJob {
    pub id: Uuid,
    pub session_id: Uuid,
    pub service_type: String,
    pub subcategory: String,
    pub original_scope: serde_json::Value,
    pub structured_answers: HashMap<String, String>,
    pub estimated_man_hours: Option<f64>,
    pub estimated_cost_cents: Option<i64>,
    pub actual_man_hours: Option<f64>,
    pub actual_cost_cents: Option<i64>,
    pub customer_rating: Option<i32>,
    pub issues_encountered: Option<String>,
    pub accuracy_score: Option<f64>,
    pub tags: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

impl From<CompletedJobRow> for CompletedJob {
    fn from(r: CompletedJobRow) -> Self {
        Self {
            id: r.id,
            session_id: r.session_id,
            service_type: r.service_type,
            subcategory: r.subcategory,
            original_scope: r.original_scope.0,
            structured_answers: r.structured_answers.0,
            estimated_man_hours: r.estimated_man_hours,
            estimated_cost_cents: r.estimated_cost.map(decimal_to_cents),
            actual_man_hours: r.actual_man_hours,
            actual_cost_cents: r.actual_cost.map(decimal_to_cents),
            customer_rating: r.customer_rating,
            issues_encountered: r.issues_encountered,
            accuracy_score: r.accuracy_score,
            tags: r.tags.0,
            completed_at: r.completed_at,
        }
    }
}

/// Request to record job completion with actual outcomes
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteJobRequest {
    #[serde(default)]
    pub actual_man_hours: Option<f64>,
    /// Actual cost in integer cents.
    #[serde(default)]
    pub actual_cost_cents: Option<i64>,
    #[serde(default)]
    pub customer_rating: Option<i32>,
    #[serde(default)]
    pub issues_encountered: Option<String>,
}

/// Response DTO for a completed job
#[derive(Debug, Clone, Serialize)]
pub struct CompletedJobResponse {
    pub id: Uuid,
    pub session_id: Uuid,
    pub service_type: String,
    pub subcategory: String,
    pub estimated_man_hours: Option<f64>,
    pub estimated_cost_cents: Option<i64>,
    pub actual_man_hours: Option<f64>,
    pub actual_cost_cents: Option<i64>,
    pub customer_rating: Option<i32>,
    pub accuracy_score: Option<f64>,
    pub tags: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

impl From<CompletedJob> for CompletedJobResponse {
    fn from(j: CompletedJob) -> Self {
        Self {
            id: j.id,
            session_id: j.session_id,
            service_type: j.service_type,
            subcategory: j.subcategory,
            estimated_man_hours: j.estimated_man_hours,
            estimated_cost_cents: j.estimated_cost_cents,
            actual_man_hours: j.actual_man_hours,
            actual_cost_cents: j.actual_cost_cents,
            customer_rating: j.customer_rating,
            accuracy_score: j.accuracy_score,
            tags: j.tags,
            completed_at: j.completed_at,
        }
    }
}
