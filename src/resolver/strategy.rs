//! Ordered manifest location strategies
//!
//! Each strategy either locates the manifest or fails. Failures that are
//! HTTP-level (error status or timeout) are recorded and hand over to the
//! next strategy; anything else ends the search immediately.

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::config::ResolutionConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{ManifestReference, StrategyFailure, UpstreamEnvelope};
use crate::upstream::{UpstreamApi, UpstreamName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateStrategy {
    /// Primary manifest service, queried with the full reference
    PrimaryManifest,
    /// Video-details service, queried with batch id as parent and child id
    VideoDetails,
}

impl LocateStrategy {
    pub const ORDER: [LocateStrategy; 2] = [LocateStrategy::PrimaryManifest, LocateStrategy::VideoDetails];

    pub fn name(&self) -> &'static str {
        match self {
            Self::PrimaryManifest => "primary_manifest",
            Self::VideoDetails => "video_details",
        }
    }
}

/// Manifest location found by one strategy
#[derive(Debug, Clone)]
pub struct LocatedManifest {
    pub base_url: String,
    pub signed_suffix: String,
    pub url_type: String,
    pub details: Value,
    pub strategy: LocateStrategy,
    /// Fallback-eligible failures of the strategies tried before this one
    pub failed_attempts: Vec<StrategyFailure>,
}

pub struct StrategyRunner<'a> {
    api: &'a dyn UpstreamApi,
    resolution: &'a ResolutionConfig,
    strategies: &'a [LocateStrategy],
}

impl<'a> StrategyRunner<'a> {
    pub fn new(api: &'a dyn UpstreamApi, resolution: &'a ResolutionConfig) -> Self {
        Self {
            api,
            resolution,
            strategies: &LocateStrategy::ORDER,
        }
    }

    /// Try each strategy in order and return the first location found
    pub async fn locate(&self, reference: &ManifestReference) -> AppResult<LocatedManifest> {
        let mut failures = Vec::new();

        for (index, strategy) in self.strategies.iter().enumerate() {
            if index > 0 {
                info!(strategy = strategy.name(), "Attempting manifest location fallback");
            }

            match self.attempt(*strategy, reference).await {
                Ok(mut located) => {
                    located.failed_attempts = failures;
                    return Ok(located);
                }
                Err(e) if e.is_fallback_eligible() => {
                    warn!(strategy = strategy.name(), error = %e, "Manifest location strategy failed");
                    failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::ManifestUnavailable { attempts: failures })
    }

    async fn attempt(
        &self,
        strategy: LocateStrategy,
        reference: &ManifestReference,
    ) -> AppResult<LocatedManifest> {
        match strategy {
            LocateStrategy::PrimaryManifest => self.primary_manifest(reference).await,
            LocateStrategy::VideoDetails => self.video_details(reference).await,
        }
    }

    async fn primary_manifest(&self, reference: &ManifestReference) -> AppResult<LocatedManifest> {
        let envelope = UpstreamEnvelope::from_value(self.api.video_url(reference).await?);
        if !envelope.succeeded() {
            return Err(AppError::bad_upstream(
                UpstreamName::Manifest,
                "failed to fetch video url",
            ));
        }

        let (base_url, signed_suffix) = envelope
            .manifest_url()
            .ok_or_else(|| AppError::not_found("video url", reference_id(reference)))?;
        let url_type = envelope
            .data_str("urlType")
            .unwrap_or(&self.resolution.fallback_url_type)
            .to_string();

        Ok(LocatedManifest {
            base_url,
            signed_suffix,
            url_type,
            details: envelope.data,
            strategy: LocateStrategy::PrimaryManifest,
            failed_attempts: Vec::new(),
        })
    }

    async fn video_details(&self, reference: &ManifestReference) -> AppResult<LocatedManifest> {
        let value = self
            .api
            .video_url_details(&reference.batch_id, &reference.child_id)
            .await?;
        let envelope = UpstreamEnvelope::from_value(value);
        if !envelope.succeeded() {
            return Err(AppError::bad_upstream(
                UpstreamName::VideoDetails,
                "video details service reported failure",
            ));
        }

        let (base_url, signed_suffix) = envelope
            .manifest_url()
            .ok_or_else(|| AppError::not_found("video url", reference_id(reference)))?;

        let url_type = self.resolution.fallback_url_type.clone();
        if let Some(reported) = envelope.data_str("urlType") {
            if reported != url_type {
                warn!(
                    "Video details reported urlType '{}', using configured '{}'",
                    reported, url_type
                );
            }
        }

        let schedule_info = envelope
            .data
            .get("scheduleInfo")
            .cloned()
            .unwrap_or_else(|| json!({}));
        let details = json!({
            "url": base_url,
            "signedUrl": signed_suffix,
            "urlType": url_type,
            "scheduleInfo": schedule_info,
            "videoContainer": self.resolution.fallback_video_container,
            "isCmaf": false,
            "serverTime": chrono::Utc::now().timestamp_millis(),
            "cdnType": "Gcp",
        });

        Ok(LocatedManifest {
            base_url,
            signed_suffix,
            url_type,
            details,
            strategy: LocateStrategy::VideoDetails,
            failed_attempts: Vec::new(),
        })
    }
}

fn reference_id(reference: &ManifestReference) -> String {
    format!(
        "{}/{}/{}",
        reference.batch_id, reference.subject_id, reference.child_id
    )
}
