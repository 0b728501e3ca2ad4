//! Stream resolver
//!
//! Resolves a video reference into a playable manifest URL, a DRM content
//! key and an HLS URL by coordinating several third-party upstreams, and
//! exposes the result over HTTP.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod health;
pub mod manifest;
pub mod models;
pub mod resolver;
pub mod token;
pub mod upstream;
pub mod utils;
pub mod web;
