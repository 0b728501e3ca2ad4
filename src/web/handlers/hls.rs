//! Standalone HLS lookup

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::required;
use crate::errors::AppResult;
use crate::resolver::HlsResolver;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct HlsQuery {
    pub parentid: Option<String>,
    pub childid: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HlsResponse {
    pub success: bool,
    pub data: Value,
    pub hls_url: String,
    pub hls_key: Option<String>,
}

pub async fn get_hls(
    State(state): State<AppState>,
    Query(query): Query<HlsQuery>,
) -> AppResult<Json<HlsResponse>> {
    let parent_id = required("parentid", query.parentid)?;
    let child_id = required("childid", query.childid)?;

    let lookup = HlsResolver::new(state.api.as_ref())
        .lookup(
            &parent_id,
            &child_id,
            query.authorization.as_deref(),
            &state.config.resolution.hls_key_name,
        )
        .await?;

    Ok(Json(HlsResponse {
        success: true,
        data: lookup.data,
        hls_url: lookup.hls_url,
        hls_key: lookup.hls_key,
    }))
}
