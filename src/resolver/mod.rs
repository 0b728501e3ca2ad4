//! Video resolution
//!
//! [`VideoResolver::resolve`] turns a [`ManifestReference`] into a
//! [`ResolvedVideo`]:
//!
//! 1. locate the manifest through the ordered [`LocateStrategy`] list
//! 2. classify the stream as live or on-demand
//! 3. for on-demand streams, resolve the DRM key and the HLS URL concurrently
//!
//! Only step 1 can fail the request. DRM and HLS failures are logged and
//! leave the corresponding field empty, and each of them is cut off at
//! `resolution.asset_timeout`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ResolutionConfig;
use crate::errors::AppResult;
use crate::manifest::{decode_manifest, extract_kids};
use crate::models::{DrmKey, ManifestLocation, ManifestReference, ResolvedVideo, StreamAssets};
use crate::upstream::UpstreamApi;

pub mod bundled;
pub mod hls;
pub mod keys;
pub mod live;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use bundled::{BundledResolver, BundledVideo};
pub use hls::HlsResolver;
pub use keys::KeyResolver;
pub use live::LiveStreamDetector;
pub use strategy::{LocateStrategy, LocatedManifest, StrategyRunner};

pub struct VideoResolver {
    api: Arc<dyn UpstreamApi>,
    resolution: ResolutionConfig,
    live: LiveStreamDetector,
}

impl VideoResolver {
    pub fn new(api: Arc<dyn UpstreamApi>, resolution: ResolutionConfig) -> Self {
        let live = LiveStreamDetector::new(&resolution.live_markers);
        Self {
            api,
            resolution,
            live,
        }
    }

    pub async fn resolve(&self, reference: &ManifestReference) -> AppResult<ResolvedVideo> {
        let located = StrategyRunner::new(self.api.as_ref(), &self.resolution)
            .locate(reference)
            .await?;
        info!(
            strategy = located.strategy.name(),
            failed_attempts = located.failed_attempts.len(),
            "Manifest located"
        );

        let full_url = format!("{}{}", located.base_url, located.signed_suffix);
        let is_live = self.live.is_live(&full_url, &located.base_url);
        let manifest_location = ManifestLocation {
            base_url: located.base_url,
            signed_suffix: located.signed_suffix,
            url_type: located.url_type,
            is_live,
        };

        let assets = if is_live {
            info!("Live stream detected, skipping DRM and HLS resolution");
            StreamAssets::Live
        } else {
            let deadline = self.resolution.asset_timeout;
            let hls_resolver = HlsResolver::new(self.api.as_ref());
            let (drm, hls) = tokio::join!(
                within_deadline("DRM key resolution", deadline, self.resolve_drm(&full_url)),
                within_deadline(
                    "HLS generation",
                    deadline,
                    hls_resolver.resolve(reference, &full_url)
                )
            );
            StreamAssets::OnDemand { drm, hls }
        };

        Ok(ResolvedVideo {
            manifest_location,
            details: located.details,
            assets,
            located_by: located.strategy.name(),
            failed_attempts: located.failed_attempts,
        })
    }

    /// Video URL, DRM key and proxy URL from the bundled service
    pub async fn resolve_bundled(&self, batch_id: &str, child_id: &str) -> AppResult<BundledVideo> {
        BundledResolver::new(self.api.as_ref(), self.resolution.asset_timeout)
            .resolve(batch_id, child_id)
            .await
    }

    async fn resolve_drm(&self, full_url: &str) -> Option<DrmKey> {
        let raw = match self.api.manifest_text(full_url).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to fetch manifest for KID extraction: {}", e);
                return None;
            }
        };

        let candidates = extract_kids(&decode_manifest(raw));
        if candidates.is_empty() {
            info!("No KID candidates found in manifest");
            return None;
        }
        info!(count = candidates.len(), "KID candidates found");
        debug!("KID candidates: {:?}", candidates);

        KeyResolver::new(self.api.as_ref()).resolve(&candidates).await
    }
}

/// Run a best-effort step, yielding its empty value once `deadline` passes
pub(crate) async fn within_deadline<T, F>(step: &str, deadline: Duration, future: F) -> T
where
    T: Default,
    F: Future<Output = T>,
{
    match tokio::time::timeout(deadline, future).await {
        Ok(value) => value,
        Err(_) => {
            warn!(
                "{} did not finish within {}, leaving it empty",
                step,
                humantime::format_duration(deadline)
            );
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, UpstreamError};
    use crate::resolver::testing::FakeApi;
    use crate::upstream::UpstreamName;
    use serde_json::json;
    use std::collections::HashMap;

    fn reference() -> ManifestReference {
        ManifestReference::new("batch", "subject", "child").unwrap()
    }

    fn resolver(api: Arc<FakeApi>) -> VideoResolver {
        VideoResolver::new(api, ResolutionConfig::default())
    }

    #[tokio::test]
    async fn on_demand_resolution_finds_key() {
        let api = Arc::new(FakeApi::default());
        let video = resolver(api.clone()).resolve(&reference()).await.unwrap();

        assert_eq!(
            video.manifest_location.full_url(),
            "https://cdn.example/x/master.mpd?Sig=1"
        );
        assert!(!video.is_live());
        assert_eq!(
            video.drm(),
            Some(&DrmKey {
                kid: "aabbcc".into(),
                key: "deadbeef".into()
            })
        );
        assert_eq!(video.located_by, "primary_manifest");
    }

    #[tokio::test]
    async fn live_stream_skips_drm_and_hls() {
        let api = Arc::new(FakeApi {
            primary: Ok(json!({
                "success": true,
                "data": {"url": "https://d1.cloudfront.net/live/master.mpd", "signedUrl": "?Sig=1"}
            })),
            ..FakeApi::default()
        });
        let video = resolver(api.clone()).resolve(&reference()).await.unwrap();

        assert!(video.is_live());
        assert!(video.drm().is_none());
        assert!(video.hls().is_none());
        assert_eq!(api.calls(), vec!["video_url"]);
    }

    #[tokio::test]
    async fn first_matching_candidate_wins() {
        let api = Arc::new(FakeApi {
            manifest: Ok(concat!(
                "<cenc:default_KID>1111-2222</cenc:default_KID>",
                r#"<x kid="3333-4444"/>"#
            )
            .to_string()),
            clear_keys: HashMap::from([
                ("11112222".to_string(), Ok(json!({"clearKeys": {"11112222": "first"}}))),
                ("33334444".to_string(), Ok(json!({"clearKeys": {"33334444": "second"}}))),
            ]),
            ..FakeApi::default()
        });
        let video = resolver(api.clone()).resolve(&reference()).await.unwrap();

        assert_eq!(video.drm().unwrap().key, "first");
        assert_eq!(api.calls_to("clear_keys"), 1);
    }

    #[tokio::test]
    async fn key_server_failure_moves_to_next_candidate() {
        let api = Arc::new(FakeApi {
            manifest: Ok(r#"<x kid="aa-11"/><x kid="bb-22"/>"#.to_string()),
            clear_keys: HashMap::from([
                ("aa11".to_string(), Err(UpstreamError::status(UpstreamName::KeyServer, 403))),
                ("bb22".to_string(), Ok(json!({"clearKeys": {"bb-22": "k"}}))),
            ]),
            ..FakeApi::default()
        });
        let video = resolver(api).resolve(&reference()).await.unwrap();

        assert_eq!(
            video.drm(),
            Some(&DrmKey {
                kid: "bb22".into(),
                key: "k".into()
            })
        );
    }

    #[tokio::test]
    async fn manifest_fetch_failure_leaves_drm_empty() {
        let api = Arc::new(FakeApi {
            manifest: Err(UpstreamError::Timeout {
                upstream: UpstreamName::ManifestCdn,
            }),
            ..FakeApi::default()
        });
        let video = resolver(api.clone()).resolve(&reference()).await.unwrap();

        assert!(video.drm().is_none());
        assert_eq!(api.calls_to("clear_keys"), 0);
        assert!(video.hls().is_some());
    }

    #[tokio::test]
    async fn slow_hls_generation_is_cut_off_at_the_asset_deadline() {
        let api = Arc::new(FakeApi {
            hls: HashMap::from([(
                "https://cdn2/y/master.mpd".to_string(),
                "https://hls/late.m3u8".to_string(),
            )]),
            hls_delay: Duration::from_secs(30),
            ..FakeApi::default()
        });
        let resolution = ResolutionConfig {
            asset_timeout: Duration::from_millis(100),
            ..ResolutionConfig::default()
        };

        let started = std::time::Instant::now();
        let video = VideoResolver::new(api, resolution)
            .resolve(&reference())
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(video.hls_url().is_none());
        assert_eq!(video.drm().unwrap().key, "deadbeef");
    }

    #[tokio::test]
    async fn location_failure_fails_the_request() {
        let api = Arc::new(FakeApi {
            primary: Err(UpstreamError::status(UpstreamName::Manifest, 500)),
            details: Err(UpstreamError::Timeout {
                upstream: UpstreamName::VideoDetails,
            }),
            ..FakeApi::default()
        });
        let err = resolver(api).resolve(&reference()).await.unwrap_err();
        assert!(matches!(err, AppError::ManifestUnavailable { .. }));
    }
}
