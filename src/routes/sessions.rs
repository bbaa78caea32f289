//! Estimate session routes
//!
//! A session is created from a free-text request. Classification runs at
//! creation time; oracle failures degrade to the default classification and
//! the session is created regardless.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{Created, DataResponse};
use crate::app::AppState;
use crate::domain::sessions::{CreateSessionRequest, EstimateSession, SessionResponse};
use crate::error::{ApiError, ApiResult};
use crate::middleware::request_id::RequestIdExt;

/// Create a session from a free-text description.
///
/// POST /sessions
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.description.trim().is_empty() {
        return Err(ApiError::bad_request("Description must not be empty"));
    }

    let request_id = headers.request_id();

    let outcome = state.oracle.classify(&req.description, request_id).await;
    if let Some(reason) = outcome.degraded {
        tracing::warn!(
            oracle = state.oracle.name(),
            reason = %reason,
            "Classification degraded to default"
        );
    }
    let classification = outcome.classification;

    tracing::info!(
        service_type = %classification.service_type,
        subcategory = %classification.subcategory,
        confidence = classification.confidence,
        urgent = req.urgent.unwrap_or(false),
        "Creating estimate session"
    );

    let session: EstimateSession = sqlx::query_as(
        r#"
        INSERT INTO estimate_sessions
            (description, address, photos, urgent, service_intent, service_type,
             subcategory, confidence, classifier_reasoning, classifier_clarifier,
             classifier_degraded)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(req.description.trim())
    .bind(&req.address)
    .bind(sqlx::types::Json(req.photos.unwrap_or_default()))
    .bind(req.urgent.unwrap_or(false))
    .bind(classification.service_intent.to_string())
    .bind(&classification.service_type)
    .bind(&classification.subcategory)
    .bind(classification.confidence)
    .bind(&classification.reasoning)
    .bind(&classification.clarifier)
    .bind(outcome.degraded.map(|r| r.to_string()))
    .fetch_one(&state.db)
    .await?;

    Ok(Created(DataResponse::new(SessionResponse::from(session))))
}

/// Get a session by ID.
///
/// GET /sessions/:session_id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let session = fetch_session(&state, session_id).await?;
    Ok(Json(DataResponse::new(SessionResponse::from(session))))
}

/// Shared session lookup used by the question, scope, and completion routes.
pub async fn fetch_session(state: &AppState, session_id: Uuid) -> ApiResult<EstimateSession> {
    sqlx::query_as::<_, EstimateSession>(
        "SELECT * FROM estimate_sessions WHERE id = $1",
    )
    .bind(session_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Session {} not found", session_id)))
}
