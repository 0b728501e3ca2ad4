/// Configuration default values
///
/// All default values for configuration options live here so they can be
/// changed in one place.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_REQUEST_TIMEOUT: &str = "90s";

// Upstream defaults
pub const DEFAULT_UPSTREAM_TIMEOUT: &str = "15s";
pub const DEFAULT_MANIFEST_BASE_URL: &str = "https://manifest.example.com";
pub const DEFAULT_MANIFEST_PATH: &str = "/api/get-video-url";
pub const DEFAULT_KEY_SERVER_PATH: &str = "/api/get-otp";
pub const DEFAULT_VIDEO_DETAILS_BASE_URL: &str = "https://video-details.example.com";
pub const DEFAULT_VIDEO_DETAILS_PATH: &str = "/video-url-details";
pub const DEFAULT_HLS_GENERATOR_BASE_URL: &str = "https://hls-generator.example.com";
pub const DEFAULT_HLS_GENERATOR_PATH: &str = "/generate";
pub const DEFAULT_HLS_GENERATOR_TIMEOUT: &str = "30s";
pub const DEFAULT_HLS_KEY_BASE_URL: &str = "https://hls-key.example.com";
pub const DEFAULT_HLS_KEY_PATH: &str = "/v1/videos/get-hls-key";
pub const DEFAULT_BUNDLE_BASE_URL: &str = "https://bundle.example.com";
pub const DEFAULT_BUNDLE_VIDEO_PATH: &str = "/api/videosuper";
pub const DEFAULT_BUNDLE_KID_PATH: &str = "/api/kid";
pub const DEFAULT_BUNDLE_KEY_PATH: &str = "/api/otp";
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://catalog.example.com";
pub const DEFAULT_CATALOG_PATH: &str = "/api";

// Header profiles sent to upstreams
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Mobile Safari/537.36";
pub const DEFAULT_ACCEPT: &str = "*/*";
pub const DESKTOP_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
pub const MOBILE_ACCEPT_LANGUAGE: &str = "en-GB,en-US;q=0.9,en;q=0.8";

// Resolution defaults
pub const DEFAULT_LIVE_MARKER: &str = "cloudfront.net";
pub const DEFAULT_FALLBACK_URL_TYPE: &str = "penpencilvdo";
pub const DEFAULT_FALLBACK_VIDEO_CONTAINER: &str = "DASH";
pub const DEFAULT_HLS_KEY_NAME: &str = "enc.key";
pub const DEFAULT_ASSET_TIMEOUT: &str = "25s";

// Catalog defaults
pub const DEFAULT_CATALOG_PAGE_SIZE: u32 = 692;
pub const DEFAULT_CATALOG_MAX_PAGES: u32 = 50;

// Environment
pub const ENV_PREFIX: &str = "STREAM_RESOLVER_";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
