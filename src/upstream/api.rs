//! Typed upstream operations
//!
//! The resolver and the web handlers only ever talk to upstreams through
//! [`UpstreamApi`]; [`HttpUpstreamApi`] is the production implementation.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

use super::{UpstreamClient, UpstreamTargets};
use crate::errors::UpstreamResult;
use crate::models::ManifestReference;
use crate::utils::url::UrlUtils;

/// Parameters of one HLS key request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HlsKeyRequest {
    pub video_key: String,
    /// Key file name inside the playlist, e.g. `enc.key`
    pub key: String,
    pub url_prefix: String,
    pub expires: String,
    /// Signing key name from the signed URL
    pub key_name: String,
    pub signature: String,
    pub authorization: String,
}

#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// Primary manifest lookup, answers `{success, data: {url, signedUrl, urlType}}`
    async fn video_url(&self, reference: &ManifestReference) -> UpstreamResult<Value>;

    /// Video-details lookup, answers `{success, data: {url, signedUrl, ...}}`
    async fn video_url_details(&self, parent_id: &str, child_id: &str) -> UpstreamResult<Value>;

    /// Clear keys for a hyphen-free KID, answers `{clearKeys: {kid: key}}`
    async fn clear_keys(&self, kid: &str) -> UpstreamResult<Value>;

    /// Raw manifest text, possibly wrapped in a base64 data URI
    async fn manifest_text(&self, url: &str) -> UpstreamResult<String>;

    /// HLS playlist URL for a DASH manifest URL
    async fn generate_hls(&self, video_url: &str) -> UpstreamResult<String>;

    /// HLS encryption key bytes as text
    async fn hls_key(&self, request: &HlsKeyRequest) -> UpstreamResult<String>;

    async fn batches(&self, page: u32, limit: u32) -> UpstreamResult<Value>;

    async fn batch_details(&self, batch_id: &str) -> UpstreamResult<Value>;

    /// Raw status of a primary manifest lookup, redirects not followed
    async fn probe_manifest(&self, reference: &ManifestReference) -> UpstreamResult<u16>;

    /// Bundled service video lookup, answers `{success, data: {video_url}}`
    async fn bundle_video(&self, batch_id: &str, child_id: &str) -> UpstreamResult<Value>;

    /// Bundled service KID for a manifest URL, answers `{success, kid}`
    async fn bundle_kid(&self, mpd_url: &str) -> UpstreamResult<Value>;

    /// Bundled service content key, answers `{success, key, keyid}`
    async fn bundle_key(&self, kid: &str) -> UpstreamResult<Value>;
}

/// reqwest-backed [`UpstreamApi`]
#[derive(Debug, Clone)]
pub struct HttpUpstreamApi {
    client: UpstreamClient,
    targets: Arc<UpstreamTargets>,
}

impl HttpUpstreamApi {
    pub fn new(client: UpstreamClient, targets: Arc<UpstreamTargets>) -> Self {
        Self { client, targets }
    }
}

fn reference_query(reference: &ManifestReference) -> [(&'static str, &str); 3] {
    [
        ("batchId", reference.batch_id.as_str()),
        ("subjectId", reference.subject_id.as_str()),
        ("childId", reference.child_id.as_str()),
    ]
}

#[async_trait]
impl UpstreamApi for HttpUpstreamApi {
    async fn video_url(&self, reference: &ManifestReference) -> UpstreamResult<Value> {
        self.client
            .get_json(&self.targets.manifest, &reference_query(reference))
            .await
    }

    async fn video_url_details(&self, parent_id: &str, child_id: &str) -> UpstreamResult<Value> {
        self.client
            .get_json(
                &self.targets.video_details,
                &[("parentid", parent_id), ("childid", child_id)],
            )
            .await
    }

    async fn clear_keys(&self, kid: &str) -> UpstreamResult<Value> {
        self.client
            .get_json(&self.targets.key_server, &[("kid", kid)])
            .await
    }

    async fn manifest_text(&self, url: &str) -> UpstreamResult<String> {
        debug!("Fetching manifest from {}", UrlUtils::obfuscate_credentials(url));
        self.client.get_text_at(&self.targets.manifest_cdn, url).await
    }

    async fn generate_hls(&self, video_url: &str) -> UpstreamResult<String> {
        let text = self
            .client
            .post_json_for_text(&self.targets.hls_generator, &json!({ "url": video_url }))
            .await?;
        Ok(text.trim().to_string())
    }

    async fn hls_key(&self, request: &HlsKeyRequest) -> UpstreamResult<String> {
        let query = [
            ("videoKey", request.video_key.as_str()),
            ("key", request.key.as_str()),
            ("URLPrefix", request.url_prefix.as_str()),
            ("Expires", request.expires.as_str()),
            ("KeyName", request.key_name.as_str()),
            ("Signature", request.signature.as_str()),
            ("authorization", request.authorization.as_str()),
        ];
        self.client
            .get_following_redirect_once(&self.targets.hls_key, &query)
            .await
    }

    async fn batches(&self, page: u32, limit: u32) -> UpstreamResult<Value> {
        let url = self.targets.catalog.endpoint_with_segments(&["batches"]);
        let (page, limit) = (page.to_string(), limit.to_string());
        self.client
            .get_json_at(
                &self.targets.catalog,
                url.as_str(),
                &[("page", page.as_str()), ("limit", limit.as_str())],
            )
            .await
    }

    async fn batch_details(&self, batch_id: &str) -> UpstreamResult<Value> {
        let url = self.targets.catalog.endpoint_with_segments(&["batch", batch_id]);
        self.client
            .get_json_at(&self.targets.catalog, url.as_str(), &[])
            .await
    }

    async fn probe_manifest(&self, reference: &ManifestReference) -> UpstreamResult<u16> {
        self.client
            .probe_status(&self.targets.manifest, &reference_query(reference))
            .await
    }

    async fn bundle_video(&self, batch_id: &str, child_id: &str) -> UpstreamResult<Value> {
        self.client
            .get_json(
                &self.targets.bundle_video,
                &[("batchId", batch_id), ("childId", child_id)],
            )
            .await
    }

    async fn bundle_kid(&self, mpd_url: &str) -> UpstreamResult<Value> {
        self.client
            .post_json(&self.targets.bundle_kid, &json!({ "mpdUrl": mpd_url }))
            .await
    }

    async fn bundle_key(&self, kid: &str) -> UpstreamResult<Value> {
        self.client
            .get_json(&self.targets.bundle_key, &[("kid", kid)])
            .await
    }
}
