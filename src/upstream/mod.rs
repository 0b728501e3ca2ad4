//! Upstream services the resolver depends on but does not control
//!
//! - [`targets`]: immutable per-upstream records (endpoint, headers, timeout)
//! - [`client`]: reqwest-backed transport with status mapping and decode fallbacks
//! - [`api`]: the typed operations the rest of the crate calls, behind [`UpstreamApi`]

use serde::Serialize;
use std::fmt;

pub mod api;
pub mod client;
pub mod targets;

pub use api::{HlsKeyRequest, HttpUpstreamApi, UpstreamApi};
pub use client::UpstreamClient;
pub use targets::{UpstreamTarget, UpstreamTargets};

/// Named upstream targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamName {
    /// Primary manifest location service
    Manifest,
    /// DRM key-issuing service
    KeyServer,
    /// External video-url-details service, the manifest fallback
    VideoDetails,
    /// DASH to HLS URL generator
    HlsGenerator,
    /// HLS encryption key service
    HlsKey,
    /// CDN serving manifest bytes
    ManifestCdn,
    /// Batch catalog service
    Catalog,
    /// Bundled resolution service, video URL lookup
    BundleVideo,
    /// Bundled resolution service, KID lookup by manifest URL
    BundleKid,
    /// Bundled resolution service, content key lookup by KID
    BundleKey,
}

impl UpstreamName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::KeyServer => "key_server",
            Self::VideoDetails => "video_details",
            Self::HlsGenerator => "hls_generator",
            Self::HlsKey => "hls_key",
            Self::ManifestCdn => "manifest_cdn",
            Self::Catalog => "catalog",
            Self::BundleVideo => "bundle_video",
            Self::BundleKid => "bundle_kid",
            Self::BundleKey => "bundle_key",
        }
    }
}

impl fmt::Display for UpstreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
