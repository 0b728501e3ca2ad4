//! In-memory [`UpstreamApi`] for resolver unit tests

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::errors::{UpstreamError, UpstreamResult};
use crate::models::ManifestReference;
use crate::upstream::{HlsKeyRequest, UpstreamApi, UpstreamName};

/// Canned responses plus a log of every call made
pub(crate) struct FakeApi {
    pub primary: UpstreamResult<Value>,
    pub details: UpstreamResult<Value>,
    pub manifest: UpstreamResult<String>,
    /// Responses keyed by hyphen-free KID; unknown KIDs get an empty key map
    pub clear_keys: HashMap<String, UpstreamResult<Value>>,
    /// HLS URLs keyed by source URL; unknown URLs fail with HTTP 500
    pub hls: HashMap<String, String>,
    /// Delay before every HLS generator answer
    pub hls_delay: Duration,
    pub bundle_video: UpstreamResult<Value>,
    pub bundle_kid: UpstreamResult<Value>,
    pub bundle_key: UpstreamResult<Value>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            primary: Ok(json!({
                "success": true,
                "data": {
                    "url": "https://cdn.example/x/master.mpd",
                    "signedUrl": "?Sig=1",
                    "urlType": "foo"
                }
            })),
            details: Ok(json!({
                "success": true,
                "data": {"url": "https://cdn2/y/master.mpd", "signedUrl": ""}
            })),
            manifest: Ok(r#"<MPD><ContentProtection kid="aa-bb-cc"/></MPD>"#.to_string()),
            clear_keys: HashMap::from([(
                "aabbcc".to_string(),
                Ok(json!({"clearKeys": {"aabbcc": "deadbeef"}})),
            )]),
            hls: HashMap::new(),
            hls_delay: Duration::ZERO,
            bundle_video: Ok(json!({
                "success": true,
                "data": {"video_url": "https://cdn.example/z/master.mpd"}
            })),
            bundle_kid: Ok(json!({"success": true, "kid": "aa-bb-cc"})),
            bundle_key: Ok(json!({"success": true, "key": "deadbeef", "keyid": "aa-bb-cc"})),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose name is `operation` (ignoring any `:argument` suffix)
    pub fn calls_to(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split(':').next() == Some(operation))
            .count()
    }
}

#[async_trait]
impl UpstreamApi for FakeApi {
    async fn video_url(&self, _reference: &ManifestReference) -> UpstreamResult<Value> {
        self.record("video_url".into());
        self.primary.clone()
    }

    async fn video_url_details(&self, _parent_id: &str, _child_id: &str) -> UpstreamResult<Value> {
        self.record("video_url_details".into());
        self.details.clone()
    }

    async fn clear_keys(&self, kid: &str) -> UpstreamResult<Value> {
        self.record(format!("clear_keys:{kid}"));
        self.clear_keys
            .get(kid)
            .cloned()
            .unwrap_or_else(|| Ok(json!({"clearKeys": {}})))
    }

    async fn manifest_text(&self, _url: &str) -> UpstreamResult<String> {
        self.record("manifest_text".into());
        self.manifest.clone()
    }

    async fn generate_hls(&self, video_url: &str) -> UpstreamResult<String> {
        self.record(format!("generate_hls:{video_url}"));
        if !self.hls_delay.is_zero() {
            tokio::time::sleep(self.hls_delay).await;
        }
        self.hls
            .get(video_url)
            .cloned()
            .ok_or(UpstreamError::status(UpstreamName::HlsGenerator, 500))
    }

    async fn hls_key(&self, _request: &HlsKeyRequest) -> UpstreamResult<String> {
        self.record("hls_key".into());
        Ok("a2V5".into())
    }

    async fn batches(&self, page: u32, _limit: u32) -> UpstreamResult<Value> {
        self.record(format!("batches:{page}"));
        Ok(json!({"success": true, "data": []}))
    }

    async fn batch_details(&self, batch_id: &str) -> UpstreamResult<Value> {
        self.record(format!("batch_details:{batch_id}"));
        Ok(json!({"success": true, "data": {"_id": batch_id}}))
    }

    async fn probe_manifest(&self, _reference: &ManifestReference) -> UpstreamResult<u16> {
        self.record("probe_manifest".into());
        Ok(200)
    }

    async fn bundle_video(&self, _batch_id: &str, _child_id: &str) -> UpstreamResult<Value> {
        self.record("bundle_video".into());
        self.bundle_video.clone()
    }

    async fn bundle_kid(&self, mpd_url: &str) -> UpstreamResult<Value> {
        self.record(format!("bundle_kid:{mpd_url}"));
        self.bundle_kid.clone()
    }

    async fn bundle_key(&self, kid: &str) -> UpstreamResult<Value> {
        self.record(format!("bundle_key:{kid}"));
        self.bundle_key.clone()
    }
}
