//! Manifest text handling: unwrapping data-URI payloads and scanning for key IDs

pub mod decoder;
pub mod kid;

pub use decoder::decode_manifest;
pub use kid::{KidPattern, extract_kids};
