//! Completed job routes
//!
//! Completion closes the learning loop: the estimate snapshot, the actual
//! outcomes, and the accuracy score computed from them are appended to the
//! precedent corpus. One completed job per session; the insert is
//! append-only and the score is never recomputed.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::{Created, DataResponse};
use crate::app::AppState;
use crate::domain::jobs::{
    CompleteJobRequest, CompletedJob, CompletedJobResponse, CompletedJobRow,
};
use crate::error::{ApiError, ApiResult};
use crate::estimator::accuracy::{calculate_accuracy_score, generate_job_tags};
use crate::estimator::orchestrator::{self, EstimateInput};
use crate::estimator::precedent;
use crate::routes::questions::{fetch_answers, fetch_questions};
use crate::routes::scope::{fetch_precedent_pool, fetch_standards};
use crate::routes::sessions::fetch_session;
use crate::services::cache::keys;

fn cents_to_decimal(cents: i64) -> rust_decimal::Decimal {
    rust_decimal::Decimal::from(cents) / rust_decimal::Decimal::from(100)
}

/// Record job completion with actual outcomes.
///
/// POST /sessions/:session_id/complete
pub async fn complete_job(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<CompleteJobRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(rating) = req.customer_rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::bad_request("customer_rating must be 1 to 5"));
        }
    }

    let session = fetch_session(&state, session_id).await?;

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM completed_jobs WHERE session_id = $1")
            .bind(session_id)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(ApiError::conflict(format!(
            "Session {} already has a completed job",
            session_id
        )));
    }

    // Rebuild the estimate the customer saw. Generation is deterministic
    // over the same answers, standards, and precedents.
    let questions = fetch_questions(&state, &session).await?;
    let answers = fetch_answers(&state, session_id).await?;
    let standards = fetch_standards(&state, &session).await?;
    let pool = fetch_precedent_pool(&state, &session).await?;
    let mut precedents = precedent::rank_precedents(pool, &answers);
    precedents.truncate(10);

    let scope = orchestrator::generate_scope(&EstimateInput {
        session: &session,
        questions: &questions,
        answers: &answers,
        standards: &standards,
        precedents: &precedents,
        urgency_fee_percent: state.settings.urgency_fee_percent,
    });

    // A zero estimate is meaningful to the scorer (bundled pricing, missed
    // scope), so it is recorded as 0 rather than absent
    let estimated_hours = Some(scope.estimated_man_hours);
    let estimated_cost_cents = Some(scope.cost.total_cents);

    let accuracy = calculate_accuracy_score(
        estimated_hours,
        req.actual_man_hours,
        estimated_cost_cents,
        req.actual_cost_cents,
    );

    let narrative = format!(
        "{} {}",
        session.description,
        req.issues_encountered.as_deref().unwrap_or_default()
    );
    let tags = generate_job_tags(
        estimated_hours,
        req.actual_man_hours,
        accuracy,
        &narrative,
    );

    let structured_answers: std::collections::HashMap<String, String> = answers
        .iter()
        .map(|(id, value)| (id.to_string(), value.clone()))
        .collect();

    let row: CompletedJobRow = sqlx::query_as(
        r#"
        INSERT INTO completed_jobs
            (session_id, service_type, subcategory, original_scope, structured_answers,
             estimated_man_hours, estimated_cost, actual_man_hours, actual_cost,
             customer_rating, issues_encountered, accuracy_score, tags)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(session_id)
    .bind(&session.service_type)
    .bind(&session.subcategory)
    .bind(sqlx::types::Json(
        serde_json::to_value(&scope).unwrap_or_default(),
    ))
    .bind(sqlx::types::Json(structured_answers))
    .bind(estimated_hours)
    .bind(estimated_cost_cents.map(cents_to_decimal))
    .bind(req.actual_man_hours)
    .bind(req.actual_cost_cents.map(cents_to_decimal))
    .bind(req.customer_rating)
    .bind(&req.issues_encountered)
    .bind(accuracy)
    .bind(sqlx::types::Json(tags))
    .fetch_one(&state.db)
    .await?;

    let job = CompletedJob::from(row);

    tracing::info!(
        session_id = %session_id,
        job_id = %job.id,
        accuracy_score = ?job.accuracy_score,
        tags = ?job.tags,
        "Job completed and added to precedent corpus"
    );

    // The estimate snapshot is frozen in the job record; drop the cache copy
    if let Err(e) = state.cache.delete(&keys::session_scope(session_id)).await {
        tracing::warn!(error = %e, "Failed to drop cached scope");
    }

    Ok(Created(DataResponse::new(CompletedJobResponse::from(job))))
}

#[derive(Debug, Deserialize, Default)]
pub struct CompletedJobQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

/// List completed jobs, newest first.
///
/// GET /jobs
pub async fn list_completed_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CompletedJobQuery>,
) -> ApiResult<impl IntoResponse> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM completed_jobs
        WHERE ($1::text IS NULL OR service_type = $1)
        AND ($2::text IS NULL OR subcategory = $2)
        "#,
    )
    .bind(&query.service_type)
    .bind(&query.subcategory)
    .fetch_one(&state.db)
    .await?;

    let rows: Vec<CompletedJobRow> = sqlx::query_as(
        r#"
        SELECT * FROM completed_jobs
        WHERE ($1::text IS NULL OR service_type = $1)
        AND ($2::text IS NULL OR subcategory = $2)
        ORDER BY completed_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(&query.service_type)
    .bind(&query.subcategory)
    .bind(query.pagination.limit() as i64)
    .bind(query.pagination.offset() as i64)
    .fetch_all(&state.db)
    .await?;

    let jobs: Vec<CompletedJobResponse> = rows
        .into_iter()
        .map(CompletedJob::from)
        .map(CompletedJobResponse::from)
        .collect();

    Ok(Paginated::new(jobs, &query.pagination, total as u64))
}
