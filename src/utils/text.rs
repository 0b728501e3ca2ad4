//! Byte-to-text decoding for upstreams that mislabel their encoding
//!
//! UTF-8 is tried first (a leading byte order mark is dropped), then
//! Latin-1. Latin-1 maps every byte to a code point, so decoding as a whole
//! never fails.

/// Encoding that successfully decoded a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

const UTF8_BOM: &str = "\u{feff}";

/// Strict UTF-8 decoding with the byte order mark removed
pub fn decode_utf8(bytes: &[u8]) -> Option<&str> {
    std::str::from_utf8(bytes)
        .ok()
        .map(|text| text.strip_prefix(UTF8_BOM).unwrap_or(text))
}

/// ISO-8859-1: byte `n` becomes code point `U+00nn`
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decode with the UTF-8 then Latin-1 chain, reporting which one applied
pub fn decode_text(bytes: &[u8]) -> (String, TextEncoding) {
    match decode_utf8(bytes) {
        Some(text) => (text.to_string(), TextEncoding::Utf8),
        None => (decode_latin1(bytes), TextEncoding::Latin1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_is_preferred() {
        let (text, encoding) = decode_text("caf\u{e9}".as_bytes());
        assert_eq!(text, "café");
        assert_eq!(encoding, TextEncoding::Utf8);
    }

    #[test]
    fn bom_is_stripped() {
        let bytes = b"\xef\xbb\xbf{\"a\":1}";
        assert_eq!(decode_utf8(bytes), Some("{\"a\":1}"));
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        let (text, encoding) = decode_text(b"caf\xe9");
        assert_eq!(text, "café");
        assert_eq!(encoding, TextEncoding::Latin1);
    }
}
