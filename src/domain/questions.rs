//! Clarifying question domain types
//!
//! Dynamic questions are reference data keyed by (service_type, subcategory)
//! and ordered by `sequence`. A question may carry a conditional predicate
//! that gates its eligibility on answers already given.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

/// How a question expects to be answered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    #[default]
    Text,
    Choice,
}

impl From<String> for ResponseType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "choice" => Self::Choice,
            _ => Self::Text,
        }
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Choice => write!(f, "choice"),
        }
    }
}

/// Predicate gating a conditional question on prior answers.
///
/// Stored as tagged JSON rather than a free-text expression so it can be
/// evaluated directly instead of parsed at runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionalPredicate {
    /// True when the referenced answer contains the substring
    /// (case-insensitive).
    AnswerContains { question_id: i64, substring: String },
    /// True when the referenced answer equals the value (case-insensitive).
    AnswerEquals { question_id: i64, value: String },
    /// True when the referenced question has any answer.
    Answered { question_id: i64 },
}

impl ConditionalPredicate {
    /// Evaluate against the accumulated answers, keyed by question id.
    pub fn evaluate(&self, answers: &HashMap<i64, String>) -> bool {
        match self {
            Self::AnswerContains {
                question_id,
                substring,
            } => answers
                .get(question_id)
                .map(|v| v.to_lowercase().contains(&substring.to_lowercase()))
                .unwrap_or(false),
            Self::AnswerEquals { question_id, value } => answers
                .get(question_id)
                .map(|v| v.eq_ignore_ascii_case(value))
                .unwrap_or(false),
            Self::Answered { question_id } => answers.contains_key(question_id),
        }
    }
}

/// Dynamic clarifying question entity
#[derive(Debug, Clone, FromRow)]
pub struct DynamicQuestion {
    pub id: i64,
    pub service_type: String,
    pub subcategory: String,
    pub question_text: String,
    pub response_type: String,
    pub options: sqlx::types::Json<Vec<String>>,
    pub sequence: i32,
    pub required_for_scope: bool,
    pub conditional_tag: Option<sqlx::types::Json<ConditionalPredicate>>,
}

/// Request to submit an answer. A later answer to the same question
/// supersedes the earlier one.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: i64,
    pub value: String,
}

/// Response DTO for a question offered to the caller
#[derive(Debug, Clone, Serialize)]
pub struct QuestionResponse {
    pub id: i64,
    pub question_text: String,
    pub response_type: ResponseType,
    pub options: Vec<String>,
    pub sequence: i32,
    pub required_for_scope: bool,
}

impl From<DynamicQuestion> for QuestionResponse {
    fn from(q: DynamicQuestion) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text,
            response_type: ResponseType::from(q.response_type),
            options: q.options.0,
            sequence: q.sequence,
            required_for_scope: q.required_for_scope,
        }
    }
}

/// Response for the next-question poll: either a question to ask or a
/// ready marker once no eligible question remains.
#[derive(Debug, Clone, Serialize)]
pub struct NextQuestionResponse {
    pub phase: super::sessions::SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionResponse>,
    pub answered_count: usize,
}
