//! Token inspection handlers

use axum::{
    Json,
    extract::{Path, Query},
};
use serde::{Deserialize, Serialize};

use super::required;
use crate::errors::AppResult;
use crate::token::{self, TokenInspection};

#[derive(Debug, Serialize)]
pub struct JwtResponse {
    pub success: bool,
    #[serde(flatten)]
    pub inspection: TokenInspection,
}

#[derive(Debug, Deserialize)]
pub struct JwtQuery {
    pub token: Option<String>,
}

pub async fn decode_jwt_path(Path(token): Path<String>) -> AppResult<Json<JwtResponse>> {
    respond(&token)
}

pub async fn decode_jwt_query(Query(query): Query<JwtQuery>) -> AppResult<Json<JwtResponse>> {
    respond(&required("token", query.token)?)
}

fn respond(token: &str) -> AppResult<Json<JwtResponse>> {
    Ok(Json(JwtResponse {
        success: true,
        inspection: token::inspect(token)?,
    }))
}
