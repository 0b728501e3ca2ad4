//! Unwrap manifests served as `data:application/octet-stream;base64,...`

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::{debug, warn};

use crate::utils::text::{TextEncoding, decode_text};

/// Prefix marking a base64-wrapped manifest
pub const BASE64_DATA_URI_PREFIX: &str = "data:application/octet-stream;base64,";

/// Decode a raw manifest payload into manifest text
///
/// Text without the data-URI prefix is returned unchanged. A payload whose
/// base64 part cannot be decoded is also returned unchanged, so this never
/// fails.
pub fn decode_manifest(raw: String) -> String {
    let Some(encoded) = raw.strip_prefix(BASE64_DATA_URI_PREFIX) else {
        return raw;
    };

    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    match STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => {
            let (text, encoding) = decode_text(&bytes);
            debug!(
                "Decoded base64 manifest payload ({} bytes, {:?})",
                bytes.len(),
                encoding
            );
            if encoding == TextEncoding::Latin1 {
                debug!("Manifest payload is not valid UTF-8, decoded as Latin-1");
            }
            text
        }
        Err(e) => {
            warn!("Failed to decode base64 manifest payload: {}", e);
            raw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_unchanged() {
        let mpd = "<MPD><ContentProtection kid=\"x\"/></MPD>".to_string();
        assert_eq!(decode_manifest(mpd.clone()), mpd);
    }

    #[test]
    fn base64_payload_is_unwrapped() {
        let mpd = "<MPD kid=\"aa-bb\"/>";
        let raw = format!("{BASE64_DATA_URI_PREFIX}{}", STANDARD.encode(mpd));
        assert_eq!(decode_manifest(raw), mpd);
    }

    #[test]
    fn latin1_payload_is_decoded() {
        let raw = format!("{BASE64_DATA_URI_PREFIX}{}", STANDARD.encode(b"caf\xe9"));
        assert_eq!(decode_manifest(raw), "café");
    }

    #[test]
    fn invalid_base64_returns_original() {
        let raw = format!("{BASE64_DATA_URI_PREFIX}@@not base64@@");
        assert_eq!(decode_manifest(raw.clone()), raw);
    }
}
