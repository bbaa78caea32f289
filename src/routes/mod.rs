pub mod health;
pub mod jobs;
pub mod questions;
pub mod scope;
pub mod sessions;
pub mod standards;

use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Estimate sessions
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/:session_id", get(sessions::get_session))
        // Clarifying questions
        .route(
            "/sessions/:session_id/questions/next",
            get(questions::next_question),
        )
        .route(
            "/sessions/:session_id/answers",
            post(questions::submit_answer),
        )
        // Scope generation
        .route("/sessions/:session_id/scope", post(scope::generate_scope))
        // Job completion and the precedent corpus
        .route("/sessions/:session_id/complete", post(jobs::complete_job))
        .route("/jobs", get(jobs::list_completed_jobs))
        // Reference data
        .route("/standards", get(standards::list_standards))
}
