//! Request-scoped domain types for video resolution
//!
//! Everything here is created fresh per resolution and dropped with the
//! response; nothing is shared between requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, AppResult};

/// Caller-supplied identifiers of one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestReference {
    pub batch_id: String,
    pub subject_id: String,
    pub child_id: String,
}

impl ManifestReference {
    /// Build a reference, rejecting blank identifiers
    pub fn new<B, S, C>(batch_id: B, subject_id: S, child_id: C) -> AppResult<Self>
    where
        B: Into<String>,
        S: Into<String>,
        C: Into<String>,
    {
        let reference = Self {
            batch_id: batch_id.into(),
            subject_id: subject_id.into(),
            child_id: child_id.into(),
        };

        for (field, value) in [
            ("batchId", &reference.batch_id),
            ("subjectId", &reference.subject_id),
            ("childId", &reference.child_id),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{field} must not be empty")));
            }
        }

        Ok(reference)
    }
}

/// Where the manifest lives, as reported by whichever upstream located it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestLocation {
    pub base_url: String,
    pub signed_suffix: String,
    pub url_type: String,
    pub is_live: bool,
}

impl ManifestLocation {
    /// Base URL with the signed query suffix appended
    pub fn full_url(&self) -> String {
        format!("{}{}", self.base_url, self.signed_suffix)
    }
}

/// A matched content key; `kid` is always hyphen-free
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrmKey {
    pub kid: String,
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HlsResult {
    pub hls_url: Option<String>,
}

/// DRM and HLS results, which only exist for on-demand streams
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamAssets {
    Live,
    OnDemand {
        drm: Option<DrmKey>,
        hls: HlsResult,
    },
}

/// One failed manifest location attempt, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub reason: String,
}

/// Outcome of a full resolution
#[derive(Debug, Clone)]
pub struct ResolvedVideo {
    pub manifest_location: ManifestLocation,
    /// Upstream `data` object (synthesised when the fallback located the manifest)
    pub details: Value,
    pub assets: StreamAssets,
    /// Name of the strategy that produced `manifest_location`
    pub located_by: &'static str,
    pub failed_attempts: Vec<StrategyFailure>,
}

impl ResolvedVideo {
    pub fn is_live(&self) -> bool {
        matches!(self.assets, StreamAssets::Live)
    }

    pub fn drm(&self) -> Option<&DrmKey> {
        match &self.assets {
            StreamAssets::OnDemand { drm, .. } => drm.as_ref(),
            StreamAssets::Live => None,
        }
    }

    pub fn hls(&self) -> Option<&HlsResult> {
        match &self.assets {
            StreamAssets::OnDemand { hls, .. } => Some(hls),
            StreamAssets::Live => None,
        }
    }

    pub fn hls_url(&self) -> Option<&str> {
        self.hls().and_then(|hls| hls.hls_url.as_deref())
    }
}

/// The `{success, data}` wrapper most upstreams answer with
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamEnvelope {
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Value,
}

impl UpstreamEnvelope {
    /// Interpret a decoded JSON body; a non-object body becomes an empty envelope
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Explicit `success: true` only
    pub fn succeeded(&self) -> bool {
        self.success == Some(true)
    }

    /// String field of `data`, ignoring empty strings
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Manifest base URL and signed suffix, if the upstream reported one
    pub fn manifest_url(&self) -> Option<(String, String)> {
        let url = self.data_str("url")?;
        let signed = self.data_str("signedUrl").unwrap_or_default();
        Some((url.to_string(), signed.to_string()))
    }
}
