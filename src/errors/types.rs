//! Error type definitions for the stream resolver
//!
//! Upstream failures are kept in their own enum so callers can decide, from
//! the variant alone, whether a failure is eligible for fallback to another
//! upstream.

use thiserror::Error;

use crate::models::StrategyFailure;
use crate::upstream::UpstreamName;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Failure talking to a named upstream
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Upstream answered, but reported failure in its payload
    #[error("Bad upstream response from {upstream}: {message}")]
    BadUpstream {
        upstream: UpstreamName,
        message: String,
    },

    /// Expected field or resource absent from an otherwise successful response
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Every manifest location strategy failed
    #[error("Manifest location unavailable after {} attempt(s)", attempts.len())]
    ManifestUnavailable { attempts: Vec<StrategyFailure> },

    /// Invalid caller input
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Errors raised by the upstream client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Upstream returned a non-2xx status
    #[error("{upstream} returned HTTP {status}")]
    Status { upstream: UpstreamName, status: u16 },

    /// No response within the target's timeout
    #[error("{upstream} timed out")]
    Timeout { upstream: UpstreamName },

    /// Connection, TLS or protocol failure before a status was received
    #[error("{upstream} request failed: {message}")]
    Transport {
        upstream: UpstreamName,
        message: String,
    },

    /// Body could not be decoded after every encoding fallback
    #[error("{upstream} response could not be decoded: {message}")]
    Decode {
        upstream: UpstreamName,
        message: String,
    },

    /// Redirect without a usable location
    #[error("{upstream} redirect could not be followed: {message}")]
    Redirect {
        upstream: UpstreamName,
        message: String,
    },
}

impl UpstreamError {
    pub fn upstream(&self) -> UpstreamName {
        match self {
            Self::Status { upstream, .. }
            | Self::Timeout { upstream }
            | Self::Transport { upstream, .. }
            | Self::Decode { upstream, .. }
            | Self::Redirect { upstream, .. } => *upstream,
        }
    }

    /// HTTP-level failures: an error status or no answer within the timeout.
    ///
    /// Connection, decode and redirect failures are never treated as a
    /// reason to fall back.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Timeout { .. })
    }

    pub fn status(upstream: UpstreamName, status: u16) -> Self {
        Self::Status { upstream, status }
    }

    pub fn decode<M: Into<String>>(upstream: UpstreamName, message: M) -> Self {
        Self::Decode {
            upstream,
            message: message.into(),
        }
    }

    /// Map a reqwest failure onto the upstream taxonomy
    pub fn from_reqwest(upstream: UpstreamName, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout { upstream }
        } else if let Some(status) = error.status() {
            Self::Status {
                upstream,
                status: status.as_u16(),
            }
        } else if error.is_decode() {
            Self::Decode {
                upstream,
                message: error.to_string(),
            }
        } else {
            Self::Transport {
                upstream,
                message: crate::utils::url::UrlUtils::obfuscate_credentials(&error.to_string()),
            }
        }
    }
}

/// Convenience methods for creating common error types
impl AppError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn bad_upstream<M: Into<String>>(upstream: UpstreamName, message: M) -> Self {
        Self::BadUpstream {
            upstream,
            message: message.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether a manifest location strategy failing with this error may hand over to the next one
    pub fn is_fallback_eligible(&self) -> bool {
        match self {
            Self::Upstream(error) => error.is_fallback_eligible(),
            _ => false,
        }
    }
}
