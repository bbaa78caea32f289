//! Scope generation route
//!
//! Pulls the session's answers, the production standards and completed-job
//! precedents for its classification, and runs the estimation orchestrator.
//! The result is cached per session and regenerated after any new answer.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::domain::jobs::{CompletedJob, CompletedJobRow};
use crate::domain::scope::ScopeResponse;
use crate::domain::sessions::EstimateSession;
use crate::domain::standards::ProductionStandard;
use crate::error::ApiResult;
use crate::estimator::orchestrator::{self, EstimateInput};
use crate::estimator::precedent;
use crate::routes::questions::{fetch_answers, fetch_questions};
use crate::routes::sessions::fetch_session;
use crate::services::cache::keys;

/// How many recent completed jobs to consider, and how many ranked
/// precedents feed the cost basis.
const PRECEDENT_FETCH_LIMIT: i64 = 25;
const PRECEDENT_USE_LIMIT: usize = 10;

pub async fn fetch_standards(
    state: &AppState,
    session: &EstimateSession,
) -> ApiResult<Vec<ProductionStandard>> {
    let standards = sqlx::query_as::<_, ProductionStandard>(
        r#"
        SELECT * FROM production_standards
        WHERE service_type = $1 AND subcategory = $2
        ORDER BY id
        "#,
    )
    .bind(&session.service_type)
    .bind(&session.subcategory)
    .fetch_all(&state.db)
    .await?;
    Ok(standards)
}

pub async fn fetch_precedent_pool(
    state: &AppState,
    session: &EstimateSession,
) -> ApiResult<Vec<CompletedJob>> {
    let rows = sqlx::query_as::<_, CompletedJobRow>(
        r#"
        SELECT * FROM completed_jobs
        WHERE service_type = $1 AND subcategory = $2
        ORDER BY completed_at DESC
        LIMIT $3
        "#,
    )
    .bind(&session.service_type)
    .bind(&session.subcategory)
    .bind(PRECEDENT_FETCH_LIMIT)
    .fetch_all(&state.db)
    .await?;
    Ok(rows.into_iter().map(CompletedJob::from).collect())
}

/// Generate (or re-serve) the structured scope for a session.
///
/// POST /sessions/:session_id/scope
pub async fn generate_scope(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let session = fetch_session(&state, session_id).await?;

    let cache_key = keys::session_scope(session_id);
    if let Some(cached) = state.cache.get::<ScopeResponse>(&cache_key).await {
        tracing::debug!(session_id = %session_id, "Returning cached scope");
        return Ok(Json(DataResponse::new(ScopeResponse {
            cached: true,
            ..cached
        })));
    }

    let questions = fetch_questions(&state, &session).await?;
    let answers = fetch_answers(&state, session_id).await?;
    let standards = fetch_standards(&state, &session).await?;

    let pool = fetch_precedent_pool(&state, &session).await?;
    let mut precedents = precedent::rank_precedents(pool, &answers);
    precedents.truncate(PRECEDENT_USE_LIMIT);

    let scope = orchestrator::generate_scope(&EstimateInput {
        session: &session,
        questions: &questions,
        answers: &answers,
        standards: &standards,
        precedents: &precedents,
        urgency_fee_percent: state.settings.urgency_fee_percent,
    });

    tracing::info!(
        session_id = %session_id,
        line_items = scope.line_items.len(),
        total_cents = scope.cost.total_cents,
        data_sources = ?scope.diagnostics.data_sources_used,
        "Scope generated"
    );

    let response = ScopeResponse {
        session_id,
        scope,
        cached: false,
    };

    if let Err(e) = state.cache.set(&cache_key, &response).await {
        tracing::warn!(error = %e, "Failed to cache scope");
    }

    Ok(Json(DataResponse::new(response)))
}
