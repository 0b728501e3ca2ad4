//! Video resolution handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::required;
use crate::errors::AppResult;
use crate::models::{DrmKey, ManifestReference, ResolvedVideo};
use crate::web::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuery {
    pub batch_id: Option<String>,
    pub subject_id: Option<String>,
    pub child_id: Option<String>,
}

/// Body of `GET /api/video`; `drm` and `hls_url` are omitted when absent
#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub success: bool,
    pub data: Value,
    pub stream_url: String,
    pub url_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drm: Option<DrmKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hls_url: Option<String>,
}

impl From<ResolvedVideo> for VideoResponse {
    fn from(video: ResolvedVideo) -> Self {
        let drm = video.drm().cloned();
        let hls_url = video.hls_url().map(str::to_string);
        Self {
            success: true,
            stream_url: video.manifest_location.full_url(),
            url_type: video.manifest_location.url_type,
            data: video.details,
            drm,
            hls_url,
        }
    }
}

/// Resolve stream URL, DRM key and HLS URL for one video
pub async fn get_video(
    State(state): State<AppState>,
    Query(query): Query<VideoQuery>,
) -> AppResult<Json<VideoResponse>> {
    let reference = ManifestReference::new(
        required("batchId", query.batch_id)?,
        required("subjectId", query.subject_id)?,
        required("childId", query.child_id)?,
    )?;

    let video = state.resolver.resolve(&reference).await?;
    Ok(Json(VideoResponse::from(video)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundledQuery {
    pub batch_id: Option<String>,
    pub child_id: Option<String>,
}

/// Body of `GET /api/video-url-details`; `proxy_url` is null when generation failed
#[derive(Debug, Serialize)]
pub struct BundledVideoResponse {
    pub success: bool,
    pub video_url: String,
    pub url_type: String,
    pub drm: DrmKey,
    pub proxy_url: Option<String>,
}

/// Video URL, DRM key and proxy URL from the bundled service
pub async fn get_bundled_video(
    State(state): State<AppState>,
    Query(query): Query<BundledQuery>,
) -> AppResult<Json<BundledVideoResponse>> {
    let batch_id = required("batchId", query.batch_id)?;
    let child_id = required("childId", query.child_id)?;

    let video = state.resolver.resolve_bundled(&batch_id, &child_id).await?;
    Ok(Json(BundledVideoResponse {
        success: true,
        video_url: video.video_url,
        url_type: state.config.resolution.fallback_url_type.clone(),
        drm: video.drm,
        proxy_url: video.proxy_url,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VideoDetailsQuery {
    pub parentid: Option<String>,
    pub childid: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideoDetailsResponse {
    pub success: bool,
    pub data: Value,
    pub errors: Option<Value>,
}

/// Pass-through of the video-details upstream
pub async fn get_video_url_details(
    State(state): State<AppState>,
    Query(query): Query<VideoDetailsQuery>,
) -> AppResult<Json<VideoDetailsResponse>> {
    let parent_id = required("parentid", query.parentid)?;
    let child_id = required("childid", query.childid)?;

    let body = state.api.video_url_details(&parent_id, &child_id).await?;
    Ok(Json(VideoDetailsResponse {
        success: body.get("success").and_then(Value::as_bool).unwrap_or(true),
        data: body.get("data").cloned().unwrap_or_else(|| body.clone()),
        errors: None,
    }))
}
