//! Live stream classification

/// Classifies a manifest as live when its URL contains a configured marker
#[derive(Debug, Clone)]
pub struct LiveStreamDetector {
    markers: Vec<String>,
}

impl LiveStreamDetector {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let markers = markers
            .into_iter()
            .map(|marker| marker.as_ref().trim().to_lowercase())
            .filter(|marker| !marker.is_empty())
            .collect();
        Self { markers }
    }

    /// Case-insensitive marker match against the full URL or the bare base URL
    pub fn is_live(&self, full_url: &str, base_url: &str) -> bool {
        let full_url = full_url.to_lowercase();
        let base_url = base_url.to_lowercase();
        self.markers
            .iter()
            .any(|marker| full_url.contains(marker) || base_url.contains(marker))
    }
}
