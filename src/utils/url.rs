//! URL utilities for consistent URL handling
//!
//! Helpers for building upstream endpoints, hiding secrets in logged URLs,
//! and picking apart signed CDN URLs.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use url::Url;

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Join a base URL and a path into an endpoint
    ///
    /// Trailing slashes on the base and a missing leading slash on the path
    /// are both tolerated.
    ///
    /// ```rust
    /// use stream_resolver::utils::url::UrlUtils;
    ///
    /// let url = UrlUtils::join_endpoint("https://example.com/", "api/get").unwrap();
    /// assert_eq!(url.as_str(), "https://example.com/api/get");
    /// ```
    pub fn join_endpoint(base_url: &str, path: &str) -> Result<Url, url::ParseError> {
        let base = base_url.trim().trim_end_matches('/');
        let path = path.trim();
        if path.is_empty() {
            Url::parse(base)
        } else if path.starts_with('/') {
            Url::parse(&format!("{base}{path}"))
        } else {
            Url::parse(&format!("{base}/{path}"))
        }
    }

    /// Obfuscate credentials and signatures in URLs (or error messages containing URLs)
    ///
    /// ```rust
    /// use stream_resolver::utils::url::UrlUtils;
    ///
    /// let url = "https://cdn.example/master.mpd?Expires=1&Signature=abc";
    /// assert_eq!(
    ///     UrlUtils::obfuscate_credentials(url),
    ///     "https://cdn.example/master.mpd?Expires=1&Signature=****"
    /// );
    /// ```
    pub fn obfuscate_credentials(url: &str) -> String {
        let mut obfuscated = url.to_string();

        if let Ok(mut parsed) = Url::parse(url) {
            if !parsed.username().is_empty() || parsed.password().is_some() {
                let _ = parsed.set_username("****");
                let _ = parsed.set_password(Some("****"));
                obfuscated = parsed.to_string();
            }
        }

        sensitive_param_regex()
            .replace_all(&obfuscated, "${1}****")
            .to_string()
    }

    /// Parse the `?k=v&...` suffix of a signed URL into its parameters
    ///
    /// Values are percent-decoded. A suffix without a leading `?` yields an
    /// empty map.
    pub fn parse_signed_query(signed_suffix: &str) -> HashMap<String, String> {
        let Some(query) = signed_suffix.strip_prefix('?') else {
            return HashMap::new();
        };

        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// First UUID-shaped path segment (36 characters, hyphenated)
    pub fn extract_video_key(url: &str) -> Option<String> {
        if !url.contains('/') {
            return None;
        }
        url.split('/')
            .find(|part| part.len() == 36 && part.contains('-'))
            .map(str::to_string)
    }
}

fn sensitive_param_regex() -> &'static Regex {
    static SENSITIVE: OnceLock<Regex> = OnceLock::new();
    SENSITIVE.get_or_init(|| {
        Regex::new(
            r"(?i)([?&;](?:username|password|user|pass|pwd|passwd|token|accesstoken|refreshtoken|authorization|signature)=)[^&;\s]*",
        )
        .expect("sensitive parameter pattern is valid")
    })
}
