//! Utility functions for the stream resolver
//!
//! - `utils::url` for URL credential obfuscation, signed query parsing and
//!   video key extraction
//! - `utils::text` for byte-to-text decoding with encoding fallbacks

pub mod text;
pub mod url;

pub use text::{TextEncoding, decode_text};
pub use url::UrlUtils;
