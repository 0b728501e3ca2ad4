//! DRM key lookup for KID candidates

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::models::DrmKey;
use crate::upstream::UpstreamApi;

pub(crate) fn strip_hyphens(kid: &str) -> String {
    kid.replace('-', "")
}

/// Queries the key server for each candidate until one matches
pub struct KeyResolver<'a> {
    api: &'a dyn UpstreamApi,
}

impl<'a> KeyResolver<'a> {
    pub fn new(api: &'a dyn UpstreamApi) -> Self {
        Self { api }
    }

    /// First candidate the key server holds a key for
    ///
    /// Key server failures for one candidate are logged and the next
    /// candidate is tried.
    pub async fn resolve(&self, candidates: &[String]) -> Option<DrmKey> {
        for candidate in candidates {
            let stripped = strip_hyphens(candidate);
            debug!("Trying KID {}", candidate);

            let response = match self.api.clear_keys(&stripped).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Key lookup for KID {} failed: {}", candidate, e);
                    continue;
                }
            };

            let Some(clear_keys) = response.get("clearKeys").and_then(Value::as_object) else {
                debug!("Key server returned no clearKeys for KID {}", candidate);
                continue;
            };

            if let Some(key) = match_key(clear_keys, candidate, &stripped) {
                info!(kid = %stripped, "Resolved DRM key");
                return Some(DrmKey { kid: stripped, key });
            }
        }

        info!("No DRM key found for {} KID candidate(s)", candidates.len());
        None
    }
}

/// Exact match on the raw or hyphen-free candidate, then any entry whose
/// hyphen-free form equals the hyphen-free candidate
fn match_key(clear_keys: &Map<String, Value>, candidate: &str, stripped: &str) -> Option<String> {
    let exact = clear_keys
        .get(candidate)
        .or_else(|| clear_keys.get(stripped))
        .and_then(Value::as_str);
    if let Some(key) = exact {
        return Some(key.to_string());
    }

    clear_keys
        .iter()
        .find(|(kid, _)| strip_hyphens(kid) == stripped)
        .and_then(|(_, key)| key.as_str())
        .map(str::to_string)
}
