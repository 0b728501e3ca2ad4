use anyhow::{Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

use crate::models::ManifestReference;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub web: WebConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    pub upstreams: UpstreamsConfig,
    #[serde(default)]
    pub resolution: ResolutionConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a whole inbound request, upstream calls included
    #[serde(with = "duration_serde::duration", default = "default_request_timeout")]
    pub request_timeout: Duration,
}

/// Session material forwarded as a cookie to credentialed upstreams
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub anon_id: Option<String>,
    /// Extra cookie fragment appended verbatim
    pub perf_cookie: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamsConfig {
    pub manifest: UpstreamTargetConfig,
    pub key_server: UpstreamTargetConfig,
    pub video_details: UpstreamTargetConfig,
    pub hls_generator: UpstreamTargetConfig,
    pub hls_key: UpstreamTargetConfig,
    /// Headers used when downloading manifest bytes; `base_url` is sent as origin/referer
    pub manifest_cdn: UpstreamTargetConfig,
    pub catalog: UpstreamTargetConfig,
    /// Bundled resolution service: video URL, KID lookup and key lookup
    pub bundle_video: UpstreamTargetConfig,
    pub bundle_kid: UpstreamTargetConfig,
    pub bundle_key: UpstreamTargetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamTargetConfig {
    pub base_url: String,
    #[serde(default)]
    pub path: String,
    #[serde(with = "duration_serde::duration", default = "default_upstream_timeout")]
    pub timeout: Duration,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub send_credentials: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Case-insensitive URL fragments that mark a stream as live
    #[serde(default = "default_live_markers")]
    pub live_markers: Vec<String>,
    #[serde(default = "default_fallback_url_type")]
    pub fallback_url_type: String,
    #[serde(default = "default_fallback_video_container")]
    pub fallback_video_container: String,
    #[serde(default = "default_hls_key_name")]
    pub hls_key_name: String,
    /// Deadline for each best-effort step (DRM key, HLS URL) once the manifest is located
    #[serde(with = "duration_serde::duration", default = "default_asset_timeout")]
    pub asset_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_catalog_max_pages")]
    pub max_pages: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Reference used to probe the manifest upstream from `/health`
    pub probe_reference: Option<ManifestReference>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout() -> Duration {
    parse_default_duration(DEFAULT_REQUEST_TIMEOUT)
}

fn default_upstream_timeout() -> Duration {
    parse_default_duration(DEFAULT_UPSTREAM_TIMEOUT)
}

fn default_live_markers() -> Vec<String> {
    vec![DEFAULT_LIVE_MARKER.to_string()]
}

fn default_fallback_url_type() -> String {
    DEFAULT_FALLBACK_URL_TYPE.to_string()
}

fn default_fallback_video_container() -> String {
    DEFAULT_FALLBACK_VIDEO_CONTAINER.to_string()
}

fn default_hls_key_name() -> String {
    DEFAULT_HLS_KEY_NAME.to_string()
}

fn default_asset_timeout() -> Duration {
    parse_default_duration(DEFAULT_ASSET_TIMEOUT)
}

fn default_catalog_page_size() -> u32 {
    DEFAULT_CATALOG_PAGE_SIZE
}

fn default_catalog_max_pages() -> u32 {
    DEFAULT_CATALOG_MAX_PAGES
}

fn parse_default_duration(value: &str) -> Duration {
    humantime::parse_duration(value).unwrap_or(Duration::from_secs(15))
}

fn desktop_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("accept".to_string(), DEFAULT_ACCEPT.to_string()),
        ("accept-language".to_string(), DESKTOP_ACCEPT_LANGUAGE.to_string()),
        ("user-agent".to_string(), DESKTOP_USER_AGENT.to_string()),
    ])
}

fn mobile_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("accept".to_string(), DEFAULT_ACCEPT.to_string()),
        ("accept-language".to_string(), MOBILE_ACCEPT_LANGUAGE.to_string()),
        ("user-agent".to_string(), MOBILE_USER_AGENT.to_string()),
    ])
}

impl UpstreamTargetConfig {
    fn new(base_url: &str, path: &str, headers: BTreeMap<String, String>) -> Self {
        Self {
            base_url: base_url.to_string(),
            path: path.to_string(),
            timeout: default_upstream_timeout(),
            headers,
            send_credentials: false,
        }
    }

    fn with_credentials(mut self) -> Self {
        self.send_credentials = true;
        self
    }

    fn with_timeout(mut self, timeout: &str) -> Self {
        self.timeout = parse_default_duration(timeout);
        self
    }
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            manifest: UpstreamTargetConfig::new(
                DEFAULT_MANIFEST_BASE_URL,
                DEFAULT_MANIFEST_PATH,
                desktop_headers(),
            )
            .with_credentials(),
            key_server: UpstreamTargetConfig::new(
                DEFAULT_MANIFEST_BASE_URL,
                DEFAULT_KEY_SERVER_PATH,
                desktop_headers(),
            )
            .with_credentials(),
            video_details: UpstreamTargetConfig::new(
                DEFAULT_VIDEO_DETAILS_BASE_URL,
                DEFAULT_VIDEO_DETAILS_PATH,
                mobile_headers(),
            ),
            hls_generator: UpstreamTargetConfig::new(
                DEFAULT_HLS_GENERATOR_BASE_URL,
                DEFAULT_HLS_GENERATOR_PATH,
                mobile_headers(),
            )
            .with_timeout(DEFAULT_HLS_GENERATOR_TIMEOUT),
            hls_key: UpstreamTargetConfig::new(
                DEFAULT_HLS_KEY_BASE_URL,
                DEFAULT_HLS_KEY_PATH,
                mobile_headers(),
            ),
            manifest_cdn: UpstreamTargetConfig::new(DEFAULT_MANIFEST_BASE_URL, "", desktop_headers()),
            catalog: UpstreamTargetConfig::new(DEFAULT_CATALOG_BASE_URL, DEFAULT_CATALOG_PATH, desktop_headers()),
            bundle_video: UpstreamTargetConfig::new(
                DEFAULT_BUNDLE_BASE_URL,
                DEFAULT_BUNDLE_VIDEO_PATH,
                mobile_headers(),
            ),
            bundle_kid: UpstreamTargetConfig::new(
                DEFAULT_BUNDLE_BASE_URL,
                DEFAULT_BUNDLE_KID_PATH,
                mobile_headers(),
            ),
            bundle_key: UpstreamTargetConfig::new(
                DEFAULT_BUNDLE_BASE_URL,
                DEFAULT_BUNDLE_KEY_PATH,
                mobile_headers(),
            ),
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            live_markers: default_live_markers(),
            fallback_url_type: default_fallback_url_type(),
            fallback_video_container: default_fallback_video_container(),
            hls_key_name: default_hls_key_name(),
            asset_timeout: default_asset_timeout(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_catalog_page_size(),
            max_pages: default_catalog_max_pages(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig {
                host: default_host(),
                port: default_port(),
                request_timeout: default_request_timeout(),
            },
            credentials: CredentialsConfig::default(),
            upstreams: UpstreamsConfig::default(),
            resolution: ResolutionConfig::default(),
            catalog: CatalogConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

impl CredentialsConfig {
    /// Cookie header value, or `None` unless all required parts are present
    pub fn cookie_header(&self) -> Option<String> {
        let access_token = non_empty(&self.access_token)?;
        let refresh_token = non_empty(&self.refresh_token)?;
        let anon_id = non_empty(&self.anon_id)?;

        let mut cookie =
            format!("anon_id={anon_id}; accessToken={access_token}; refreshToken={refresh_token}");
        if let Some(perf_cookie) = non_empty(&self.perf_cookie) {
            cookie.push_str("; ");
            cookie.push_str(perf_cookie);
        }
        Some(cookie)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl UpstreamsConfig {
    /// All targets with their configuration names
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &UpstreamTargetConfig)> {
        [
            ("manifest", &self.manifest),
            ("key_server", &self.key_server),
            ("video_details", &self.video_details),
            ("hls_generator", &self.hls_generator),
            ("hls_key", &self.hls_key),
            ("manifest_cdn", &self.manifest_cdn),
            ("catalog", &self.catalog),
            ("bundle_video", &self.bundle_video),
            ("bundle_kid", &self.bundle_kid),
            ("bundle_key", &self.bundle_key),
        ]
        .into_iter()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from_file(&config_file)
    }

    /// Load defaults, then the TOML file, then environment overrides.
    ///
    /// A default file is written when `config_file` does not exist. Credentials
    /// may also come from the bare `ACCESS_TOKEN`, `REFRESH_TOKEN`, `ANON_ID`
    /// and `PERF_COOKIE` variables.
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if !std::path::Path::new(config_file).exists() {
            let contents = toml::to_string_pretty(&Self::default())?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
        }

        let config = Self::figment()
            .merge(Toml::file(config_file))
            .merge(Self::environment())
            .extract()?;
        Ok(config)
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
    }

    fn environment() -> Figment {
        Figment::new()
            .merge(
                Env::raw()
                    .only(&["access_token", "refresh_token", "anon_id", "perf_cookie"])
                    .map(|key| format!("credentials.{}", key.as_str().to_ascii_lowercase()).into()),
            )
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject configurations that cannot serve requests
    pub fn validate(&self) -> Result<()> {
        let needs_credentials = self.upstreams.iter().any(|(_, target)| target.send_credentials);
        if needs_credentials && self.credentials.cookie_header().is_none() {
            bail!(
                "Missing required credentials: access_token, refresh_token and anon_id must be set \
                 (config [credentials] or ACCESS_TOKEN/REFRESH_TOKEN/ANON_ID)"
            );
        }

        for (name, target) in self.upstreams.iter() {
            if target.base_url.trim().is_empty() {
                bail!("Upstream '{}' has no base_url", name);
            }
        }

        if self.resolution.live_markers.iter().any(|m| m.trim().is_empty()) {
            bail!("resolution.live_markers must not contain empty entries");
        }

        let slowest = self.slowest_resolution();
        if self.web.request_timeout <= slowest {
            bail!(
                "web.request_timeout ({}) must exceed the slowest resolution path ({})",
                humantime::format_duration(self.web.request_timeout),
                humantime::format_duration(slowest)
            );
        }

        Ok(())
    }

    /// Worst case for a resolution whose best-effort steps all run to their deadline
    fn slowest_resolution(&self) -> Duration {
        let upstreams = &self.upstreams;
        let asset_timeout = self.resolution.asset_timeout;
        let located = upstreams.manifest.timeout + upstreams.video_details.timeout + asset_timeout;
        let bundled = upstreams.bundle_video.timeout
            + upstreams.bundle_kid.timeout
            + upstreams.bundle_key.timeout
            + asset_timeout;
        located.max(bundled)
    }
}
