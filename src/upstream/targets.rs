//! Per-upstream configuration records
//!
//! Each upstream gets its own header set, built once at startup and never
//! mutated, so headers cannot leak from one target to another.

use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER};
use std::time::Duration;
use url::Url;

use super::UpstreamName;
use crate::config::{CredentialsConfig, UpstreamTargetConfig, UpstreamsConfig};
use crate::errors::{AppError, AppResult};
use crate::utils::url::UrlUtils;

#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    name: UpstreamName,
    endpoint: Url,
    headers: HeaderMap,
    timeout: Duration,
}

impl UpstreamTarget {
    /// Build a target, validating its endpoint and header names/values
    pub fn from_config(
        name: UpstreamName,
        config: &UpstreamTargetConfig,
        cookie: Option<&str>,
    ) -> AppResult<Self> {
        let endpoint = UrlUtils::join_endpoint(&config.base_url, &config.path).map_err(|e| {
            AppError::configuration(format!(
                "upstream '{name}' has invalid endpoint '{}{}': {e}",
                config.base_url, config.path
            ))
        })?;

        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                AppError::configuration(format!("upstream '{name}' header name '{key}': {e}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                AppError::configuration(format!("upstream '{name}' header '{key}' value: {e}"))
            })?;
            headers.insert(header_name, header_value);
        }

        if config.send_credentials {
            let cookie = cookie.ok_or_else(|| {
                AppError::configuration(format!("upstream '{name}' requires credentials"))
            })?;
            let mut value = HeaderValue::from_str(cookie).map_err(|e| {
                AppError::configuration(format!("credentials are not a valid cookie: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        if name == UpstreamName::ManifestCdn {
            let origin = endpoint.origin().ascii_serialization();
            if !headers.contains_key(ORIGIN) {
                if let Ok(value) = HeaderValue::from_str(&origin) {
                    headers.insert(ORIGIN, value);
                }
            }
            if !headers.contains_key(REFERER) {
                if let Ok(value) = HeaderValue::from_str(&format!("{origin}/")) {
                    headers.insert(REFERER, value);
                }
            }
        }

        Ok(Self {
            name,
            endpoint,
            headers,
            timeout: config.timeout,
        })
    }

    pub fn name(&self) -> UpstreamName {
        self.name
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Endpoint with extra path segments appended (each one percent-encoded)
    pub fn endpoint_with_segments(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// All upstream targets, shared read-only across requests
#[derive(Debug, Clone)]
pub struct UpstreamTargets {
    pub manifest: UpstreamTarget,
    pub key_server: UpstreamTarget,
    pub video_details: UpstreamTarget,
    pub hls_generator: UpstreamTarget,
    pub hls_key: UpstreamTarget,
    pub manifest_cdn: UpstreamTarget,
    pub catalog: UpstreamTarget,
    pub bundle_video: UpstreamTarget,
    pub bundle_kid: UpstreamTarget,
    pub bundle_key: UpstreamTarget,
}

impl UpstreamTargets {
    pub fn from_config(
        upstreams: &UpstreamsConfig,
        credentials: &CredentialsConfig,
    ) -> AppResult<Self> {
        let cookie = credentials.cookie_header();
        let cookie = cookie.as_deref();
        let build = |name, config| UpstreamTarget::from_config(name, config, cookie);

        Ok(Self {
            manifest: build(UpstreamName::Manifest, &upstreams.manifest)?,
            key_server: build(UpstreamName::KeyServer, &upstreams.key_server)?,
            video_details: build(UpstreamName::VideoDetails, &upstreams.video_details)?,
            hls_generator: build(UpstreamName::HlsGenerator, &upstreams.hls_generator)?,
            hls_key: build(UpstreamName::HlsKey, &upstreams.hls_key)?,
            manifest_cdn: build(UpstreamName::ManifestCdn, &upstreams.manifest_cdn)?,
            catalog: build(UpstreamName::Catalog, &upstreams.catalog)?,
            bundle_video: build(UpstreamName::BundleVideo, &upstreams.bundle_video)?,
            bundle_kid: build(UpstreamName::BundleKid, &upstreams.bundle_kid)?,
            bundle_key: build(UpstreamName::BundleKey, &upstreams.bundle_key)?,
        })
    }
}
