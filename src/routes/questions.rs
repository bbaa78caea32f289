//! Clarifying question routes
//!
//! The next-question poll walks the dynamic questions for the session's
//! classification in sequence order, honoring conditional predicates.
//! Submitting an answer supersedes any earlier answer to the same question
//! and invalidates the cached scope.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::domain::questions::{
    DynamicQuestion, NextQuestionResponse, QuestionResponse, SubmitAnswerRequest,
};
use crate::domain::sessions::{EstimateSession, SessionPhase};
use crate::error::{ApiError, ApiResult};
use crate::estimator;
use crate::routes::sessions::fetch_session;
use crate::services::cache::keys;

/// Load the question set for a session's classification, in selector order.
pub async fn fetch_questions(
    state: &AppState,
    session: &EstimateSession,
) -> ApiResult<Vec<DynamicQuestion>> {
    let questions = sqlx::query_as::<_, DynamicQuestion>(
        r#"
        SELECT * FROM dynamic_questions
        WHERE service_type = $1 AND subcategory = $2
        ORDER BY sequence, id
        "#,
    )
    .bind(&session.service_type)
    .bind(&session.subcategory)
    .fetch_all(&state.db)
    .await?;
    Ok(questions)
}

/// Load the session's accumulated answers keyed by question id.
pub async fn fetch_answers(
    state: &AppState,
    session_id: Uuid,
) -> ApiResult<HashMap<i64, String>> {
    let rows: Vec<(i64, String)> = sqlx::query_as(
        "SELECT question_id, value FROM session_answers WHERE session_id = $1",
    )
    .bind(session_id)
    .fetch_all(&state.db)
    .await?;
    Ok(rows.into_iter().collect())
}

/// Get the next clarifying question, or the ready marker once no eligible
/// question remains.
///
/// GET /sessions/:session_id/questions/next
pub async fn next_question(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let session = fetch_session(&state, session_id).await?;
    let answers = fetch_answers(&state, session_id).await?;

    // The ready phase is terminal; don't re-open the question flow
    if session.phase() == SessionPhase::ReadyForScope {
        return Ok(Json(DataResponse::new(NextQuestionResponse {
            phase: SessionPhase::ReadyForScope,
            question: None,
            answered_count: answers.len(),
        })));
    }

    let questions = fetch_questions(&state, &session).await?;

    match estimator::questions::next_question(&questions, &answers) {
        Some(question) => Ok(Json(DataResponse::new(NextQuestionResponse {
            phase: SessionPhase::AwaitingAnswers,
            question: Some(QuestionResponse::from(question.clone())),
            answered_count: answers.len(),
        }))),
        None => {
            sqlx::query("UPDATE estimate_sessions SET phase = $1 WHERE id = $2")
                .bind(SessionPhase::ReadyForScope.to_string())
                .bind(session_id)
                .execute(&state.db)
                .await?;

            tracing::info!(session_id = %session_id, "Session ready for scope");

            Ok(Json(DataResponse::new(NextQuestionResponse {
                phase: SessionPhase::ReadyForScope,
                question: None,
                answered_count: answers.len(),
            })))
        }
    }
}

/// Submit an answer to a dynamic question.
///
/// POST /sessions/:session_id/answers
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SubmitAnswerRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.value.trim().is_empty() {
        return Err(ApiError::bad_request("Answer value must not be empty"));
    }

    let session = fetch_session(&state, session_id).await?;

    // The question must belong to the session's classification
    let question: Option<DynamicQuestion> = sqlx::query_as(
        "SELECT * FROM dynamic_questions WHERE id = $1 AND service_type = $2 AND subcategory = $3",
    )
    .bind(req.question_id)
    .bind(&session.service_type)
    .bind(&session.subcategory)
    .fetch_optional(&state.db)
    .await?;

    let Some(question) = question else {
        return Err(ApiError::bad_request(format!(
            "Question {} does not apply to this session",
            req.question_id
        )));
    };

    // Later answers supersede earlier ones
    sqlx::query(
        r#"
        INSERT INTO session_answers (session_id, question_id, value)
        VALUES ($1, $2, $3)
        ON CONFLICT (session_id, question_id)
        DO UPDATE SET value = EXCLUDED.value, created_at = now()
        "#,
    )
    .bind(session_id)
    .bind(req.question_id)
    .bind(req.value.trim())
    .execute(&state.db)
    .await?;

    // A new answer changes the estimate basis; drop derived caches
    if let Err(e) = state
        .cache
        .delete_pattern(&keys::session_pattern(session_id))
        .await
    {
        tracing::warn!(error = %e, "Failed to invalidate session cache");
    }

    tracing::info!(
        session_id = %session_id,
        question_id = question.id,
        "Answer recorded"
    );

    Ok(Json(MessageResponse::with_code(
        "Answer recorded",
        "ANSWER_RECORDED",
    )))
}
