//! Centralized error handling for the stream resolver
//!
//! # Error Categories
//!
//! - **Upstream Errors**: non-2xx statuses, timeouts, transport and decode failures
//! - **Bad Upstream / Not Found**: upstream answered but without the data we need
//! - **Manifest Unavailable**: every manifest location strategy failed
//! - **Validation Errors**: invalid caller input
//!
//! # Usage
//!
//! ```rust
//! use stream_resolver::errors::{AppError, AppResult};
//!
//! fn example_function(id: &str) -> AppResult<String> {
//!     if id.is_empty() {
//!         return Err(AppError::validation("id must not be empty"));
//!     }
//!     Ok(id.to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for upstream client Results
pub type UpstreamResult<T> = Result<T, UpstreamError>;
