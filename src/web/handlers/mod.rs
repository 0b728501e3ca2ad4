//! HTTP request handlers organised by domain
//!
//! Handlers stay thin: validate query input, delegate to the resolver or a
//! service, and shape the JSON body.

pub mod catalog;
pub mod health;
pub mod hls;
pub mod jwt;
pub mod video;

/// Reject a missing or blank query parameter with a validation error
pub(crate) fn required(name: &str, value: Option<String>) -> crate::errors::AppResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(crate::errors::AppError::validation(format!(
            "{name} is required"
        ))),
    }
}
