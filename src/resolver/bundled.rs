//! Resolution through the bundled service
//!
//! The bundled service answers the video URL, the KID and the content key
//! itself, so no manifest is fetched here. Every step but the proxy (HLS)
//! URL is required.

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

use super::hls::HlsResolver;
use super::keys::strip_hyphens;
use super::within_deadline;
use crate::errors::{AppError, AppResult};
use crate::models::DrmKey;
use crate::upstream::{UpstreamApi, UpstreamName};
use crate::utils::url::UrlUtils;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundledVideo {
    pub video_url: String,
    pub drm: DrmKey,
    pub proxy_url: Option<String>,
}

pub struct BundledResolver<'a> {
    api: &'a dyn UpstreamApi,
    asset_timeout: Duration,
}

impl<'a> BundledResolver<'a> {
    pub fn new(api: &'a dyn UpstreamApi, asset_timeout: Duration) -> Self {
        Self { api, asset_timeout }
    }

    pub async fn resolve(&self, batch_id: &str, child_id: &str) -> AppResult<BundledVideo> {
        let video = self.api.bundle_video(batch_id, child_id).await?;
        require_success(&video, UpstreamName::BundleVideo, "failed to fetch video url")?;
        let video_url = text_at(&video, "/data/video_url")
            .ok_or_else(|| AppError::not_found("video url", format!("{batch_id}/{child_id}")))?
            .to_string();
        info!(
            "Bundled video URL found: {}",
            UrlUtils::obfuscate_credentials(&video_url)
        );

        let kid_body = self.api.bundle_kid(&video_url).await?;
        require_success(&kid_body, UpstreamName::BundleKid, "failed to fetch KID")?;
        let kid = text_at(&kid_body, "/kid")
            .ok_or_else(|| AppError::not_found("KID", format!("{batch_id}/{child_id}")))?
            .to_string();

        let key_body = self.api.bundle_key(&kid).await?;
        require_success(&key_body, UpstreamName::BundleKey, "failed to fetch DRM key")?;
        let key = text_at(&key_body, "/key")
            .ok_or_else(|| AppError::not_found("DRM key", kid.clone()))?
            .to_string();
        let key_id = text_at(&key_body, "/keyid").unwrap_or(&kid);
        info!("Bundled DRM key resolved");

        let hls_resolver = HlsResolver::new(self.api);
        let proxy_url =
            within_deadline("Proxy URL generation", self.asset_timeout, hls_resolver.generate(&video_url))
                .await;

        Ok(BundledVideo {
            drm: DrmKey {
                kid: strip_hyphens(key_id),
                key,
            },
            video_url,
            proxy_url,
        })
    }
}

/// Only an explicit `success: true` counts
fn require_success(body: &Value, upstream: UpstreamName, message: &str) -> AppResult<()> {
    if body.get("success").and_then(Value::as_bool) == Some(true) {
        Ok(())
    } else {
        Err(AppError::bad_upstream(upstream, message))
    }
}

fn text_at<'v>(body: &'v Value, pointer: &str) -> Option<&'v str> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
