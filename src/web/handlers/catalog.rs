//! Batch catalog handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::catalog::CatalogPage;
use crate::errors::AppResult;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct BatchesQuery {
    /// Page number; `0` fetches every page
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn list_batches(
    State(state): State<AppState>,
    Query(query): Query<BatchesQuery>,
) -> AppResult<Json<CatalogPage>> {
    let limit = query.limit.unwrap_or(state.catalog.default_page_size());
    let page = match query.page.unwrap_or(1) {
        0 => state.catalog.list_all(limit).await?,
        page => state.catalog.list(page, limit).await?,
    };
    Ok(Json(page))
}

pub async fn get_batch_details(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> AppResult<Json<CatalogPage>> {
    Ok(Json(state.catalog.details(&batch_id).await?))
}
