//! Best-effort HLS URL generation

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};
use crate::models::{HlsResult, ManifestReference, UpstreamEnvelope};
use crate::upstream::{HlsKeyRequest, UpstreamApi, UpstreamName};
use crate::utils::url::UrlUtils;

/// Result of a standalone HLS lookup by parent and child id
#[derive(Debug, Clone)]
pub struct HlsLookup {
    /// Video-details `data` object
    pub data: Value,
    pub hls_url: String,
    /// Encryption key text, when an authorization token was supplied and the key fetch succeeded
    pub hls_key: Option<String>,
}

pub struct HlsResolver<'a> {
    api: &'a dyn UpstreamApi,
}

impl<'a> HlsResolver<'a> {
    pub fn new(api: &'a dyn UpstreamApi) -> Self {
        Self { api }
    }

    /// Generate from the video-details URL, then from `full_url` if that produced nothing
    pub async fn resolve(&self, reference: &ManifestReference, full_url: &str) -> HlsResult {
        if let Some(hls_url) = self.from_video_details(reference).await {
            info!("HLS URL generated from video details");
            return HlsResult {
                hls_url: Some(hls_url),
            };
        }

        debug!("Generating HLS URL from the located manifest URL");
        let hls_url = self.generate(full_url).await;
        if hls_url.is_some() {
            info!("HLS URL generated from manifest URL");
        } else {
            warn!("HLS URL generation failed");
        }
        HlsResult { hls_url }
    }

    /// Video details, HLS URL and (optionally) the HLS encryption key
    ///
    /// Unlike [`resolve`](Self::resolve) every step except the key fetch is
    /// required and its failure is returned.
    pub async fn lookup(
        &self,
        parent_id: &str,
        child_id: &str,
        authorization: Option<&str>,
        key_file: &str,
    ) -> AppResult<HlsLookup> {
        let envelope = UpstreamEnvelope::from_value(self.api.video_url_details(parent_id, child_id).await?);
        if !envelope.succeeded() {
            return Err(AppError::bad_upstream(
                UpstreamName::VideoDetails,
                "failed to fetch video url details",
            ));
        }
        let (video_url, signed) = envelope
            .manifest_url()
            .ok_or_else(|| AppError::not_found("video url", format!("{parent_id}/{child_id}")))?;

        let hls_url = self.api.generate_hls(&format!("{video_url}{signed}")).await?;
        info!("HLS URL generated for {}/{}", parent_id, child_id);

        let video_key = UrlUtils::extract_video_key(&video_url);
        let hls_key = match (authorization.filter(|a| !a.is_empty()), video_key) {
            (Some(authorization), Some(video_key)) => {
                let params = UrlUtils::parse_signed_query(&signed);
                let param = |name: &str| params.get(name).cloned().unwrap_or_default();
                let request = HlsKeyRequest {
                    video_key,
                    key: key_file.to_string(),
                    url_prefix: param("URLPrefix"),
                    expires: param("Expires"),
                    key_name: param("KeyName"),
                    signature: param("Signature"),
                    authorization: authorization.to_string(),
                };
                match self.api.hls_key(&request).await {
                    Ok(key) => Some(key),
                    Err(e) => {
                        warn!("Failed to fetch HLS key: {}", e);
                        None
                    }
                }
            }
            (None, _) => None,
            (Some(_), None) => {
                debug!("No video key in {}, skipping HLS key fetch", UrlUtils::obfuscate_credentials(&video_url));
                None
            }
        };

        Ok(HlsLookup {
            data: envelope.data,
            hls_url,
            hls_key,
        })
    }

    async fn from_video_details(&self, reference: &ManifestReference) -> Option<String> {
        let value = match self
            .api
            .video_url_details(&reference.batch_id, &reference.child_id)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                warn!("Video details lookup for HLS failed: {}", e);
                return None;
            }
        };

        let envelope = UpstreamEnvelope::from_value(value);
        if !envelope.succeeded() {
            debug!("Video details reported failure, skipping HLS attempt");
            return None;
        }
        let (url, signed) = envelope.manifest_url()?;
        self.generate(&format!("{url}{signed}")).await
    }

    pub(crate) async fn generate(&self, video_url: &str) -> Option<String> {
        match self.api.generate_hls(video_url).await {
            Ok(hls_url) if !hls_url.trim().is_empty() => Some(hls_url.trim().to_string()),
            Ok(_) => {
                debug!("HLS generator returned an empty body");
                None
            }
            Err(e) => {
                warn!("HLS generation failed: {}", e);
                None
            }
        }
    }
}
