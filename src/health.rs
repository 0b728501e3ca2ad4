//! Service health derived from a probe of the primary manifest upstream

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::errors::UpstreamError;
use crate::models::ManifestReference;
use crate::upstream::UpstreamApi;

/// Outcome of one upstream probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Online,
    /// 307, which the manifest service uses to bounce to its login flow
    OnlineRedirect,
    Error(u16),
    Offline,
    NotConfigured,
}

impl ProbeStatus {
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Self::Online,
            307 => Self::OnlineRedirect,
            other => Self::Error(other),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Online => "online".to_string(),
            Self::OnlineRedirect => "online_redirect".to_string(),
            Self::Error(status) => format!("error_{status}"),
            Self::Offline => "offline".to_string(),
            Self::NotConfigured => "not_configured".to_string(),
        }
    }

    /// Whether this outcome means the upstream is unusable
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Offline | Self::Error(401) | Self::Error(403) | Self::Error(404) | Self::Error(500)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub manifest_upstream: String,
    pub all_apis_failed: bool,
    pub description: &'static str,
}

/// Probe the manifest upstream once and summarise the result
pub async fn check(api: &dyn UpstreamApi, probe_reference: Option<&ManifestReference>) -> HealthReport {
    let probe = match probe_reference {
        None => ProbeStatus::NotConfigured,
        Some(reference) => match api.probe_manifest(reference).await {
            Ok(status) => ProbeStatus::from_status(status),
            Err(UpstreamError::Status { status, .. }) => ProbeStatus::from_status(status),
            Err(e) => {
                debug!("Manifest upstream probe failed: {}", e);
                ProbeStatus::Offline
            }
        },
    };

    let failed = probe.is_failure();
    HealthReport {
        status: if failed { "offline" } else { "healthy" },
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        manifest_upstream: probe.label(),
        all_apis_failed: failed,
        description: if failed {
            "Manifest upstream is offline"
        } else {
            "Service is running with the manifest upstream reachable"
        },
    }
}
