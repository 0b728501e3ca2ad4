//! Shared fixtures: a configuration whose upstreams all point at one mock server

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

use stream_resolver::config::{Config, CredentialsConfig};
use stream_resolver::upstream::{HttpUpstreamApi, UpstreamClient, UpstreamTargets};

pub const COOKIE: &str = "anon_id=anon; accessToken=access; refreshToken=refresh";

pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.credentials = CredentialsConfig {
        access_token: Some("access".into()),
        refresh_token: Some("refresh".into()),
        anon_id: Some("anon".into()),
        perf_cookie: None,
    };

    let base_url = server.uri();
    let upstreams = &mut config.upstreams;
    for target in [
        &mut upstreams.manifest,
        &mut upstreams.key_server,
        &mut upstreams.video_details,
        &mut upstreams.hls_generator,
        &mut upstreams.hls_key,
        &mut upstreams.manifest_cdn,
        &mut upstreams.catalog,
        &mut upstreams.bundle_video,
        &mut upstreams.bundle_kid,
        &mut upstreams.bundle_key,
    ] {
        target.base_url = base_url.clone();
        target.timeout = Duration::from_secs(2);
    }
    config
}

pub fn api_for(config: &Config) -> Arc<HttpUpstreamApi> {
    let targets = UpstreamTargets::from_config(&config.upstreams, &config.credentials)
        .expect("test upstream targets are valid");
    Arc::new(HttpUpstreamApi::new(
        UpstreamClient::new().expect("http client builds"),
        Arc::new(targets),
    ))
}
