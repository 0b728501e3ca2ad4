//! Key ID candidate extraction
//!
//! Packagers put the default KID in different places, so several patterns
//! are applied in a fixed priority order and their matches are flattened into
//! one list with duplicates removed (first occurrence wins).

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Extraction patterns, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KidPattern {
    /// `<cenc:default_KID>...</cenc:default_KID>`
    DefaultKidTag,
    /// `kid="..."`
    KidAttribute,
    /// `schemeIdUri="urn:uuid:..."`
    SchemeIdUri,
    /// Any 8-4-4-4-12 hex UUID, matched on the lower-cased text
    BareUuid,
}

impl KidPattern {
    pub const PRIORITY: [KidPattern; 4] = [
        KidPattern::DefaultKidTag,
        KidPattern::KidAttribute,
        KidPattern::SchemeIdUri,
        KidPattern::BareUuid,
    ];

    fn regex(self) -> &'static Regex {
        static DEFAULT_KID_TAG: OnceLock<Regex> = OnceLock::new();
        static KID_ATTRIBUTE: OnceLock<Regex> = OnceLock::new();
        static SCHEME_ID_URI: OnceLock<Regex> = OnceLock::new();
        static BARE_UUID: OnceLock<Regex> = OnceLock::new();

        let (cell, pattern) = match self {
            Self::DefaultKidTag => (
                &DEFAULT_KID_TAG,
                r"<cenc:default_KID>([^<]+)</cenc:default_KID>",
            ),
            Self::KidAttribute => (&KID_ATTRIBUTE, r#"kid="([^"]+)""#),
            Self::SchemeIdUri => (&SCHEME_ID_URI, r#"schemeIdUri="urn:uuid:([^"]+)""#),
            Self::BareUuid => (
                &BARE_UUID,
                r"([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})",
            ),
        };
        cell.get_or_init(|| Regex::new(pattern).expect("KID pattern is valid"))
    }

    /// All matches of this pattern, in document order
    pub fn candidates(self, manifest: &str) -> Vec<String> {
        let lowered;
        let haystack = if self == Self::BareUuid {
            lowered = manifest.to_lowercase();
            lowered.as_str()
        } else {
            manifest
        };

        self.regex()
            .captures_iter(haystack)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|kid| !kid.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Ordered, de-duplicated KID candidates found in a manifest
///
/// An empty list is a normal result for unencrypted content.
pub fn extract_kids(manifest: &str) -> Vec<String> {
    dedupe_preserving_order(
        KidPattern::PRIORITY
            .iter()
            .flat_map(|pattern| pattern.candidates(manifest)),
    )
}

fn dedupe_preserving_order<I: IntoIterator<Item = String>>(candidates: I) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|kid| seen.insert(kid.clone()))
        .collect()
}
