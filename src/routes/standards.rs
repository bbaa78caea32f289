//! Production standard reference routes

use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::app::AppState;
use crate::domain::standards::{ProductionStandard, ProductionStandardResponse};
use crate::error::ApiResult;

#[derive(Debug, Deserialize, Default)]
pub struct StandardsQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

/// List production standards.
///
/// GET /standards
pub async fn list_standards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StandardsQuery>,
) -> ApiResult<impl IntoResponse> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM production_standards
        WHERE ($1::text IS NULL OR service_type = $1)
        AND ($2::text IS NULL OR subcategory = $2)
        "#,
    )
    .bind(&query.service_type)
    .bind(&query.subcategory)
    .fetch_one(&state.db)
    .await?;

    let rows: Vec<ProductionStandard> = sqlx::query_as(
        r#"
        SELECT * FROM production_standards
        WHERE ($1::text IS NULL OR service_type = $1)
        AND ($2::text IS NULL OR subcategory = $2)
        ORDER BY service_type, subcategory, id
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(&query.service_type)
    .bind(&query.subcategory)
    .bind(query.pagination.limit() as i64)
    .bind(query.pagination.offset() as i64)
    .fetch_all(&state.db)
    .await?;

    let standards: Vec<ProductionStandardResponse> = rows
        .into_iter()
        .map(ProductionStandardResponse::from)
        .collect();

    Ok(Paginated::new(standards, &query.pagination, total as u64))
}
