//! Transport behaviour of the HTTP upstream implementation

mod common;

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use common::{COOKIE, api_for, config_for};
use stream_resolver::errors::UpstreamError;
use stream_resolver::models::ManifestReference;
use stream_resolver::upstream::{HlsKeyRequest, UpstreamApi, UpstreamName};

async fn requests_to(server: &MockServer, request_path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == request_path)
        .collect()
}

fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|value| value.to_str().ok())
}

fn key_request() -> HlsKeyRequest {
    HlsKeyRequest {
        video_key: "1a2b3c4d-0000-1111-2222-333344445555".into(),
        key: "enc.key".into(),
        url_prefix: "aHR0cHM6".into(),
        expires: "1700000000".into(),
        key_name: "signing-key".into(),
        signature: "c2ln".into(),
        authorization: "token".into(),
    }
}

#[tokio::test]
async fn credentials_only_reach_credentialed_upstreams() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {}})))
        .mount(&server)
        .await;

    let api = api_for(&config_for(&server));
    let reference = ManifestReference::new("b", "s", "c").unwrap();
    api.video_url(&reference).await.unwrap();
    api.video_url_details("b", "c").await.unwrap();
    api.clear_keys("aabbcc").await.unwrap();
    api.batches(1, 10).await.unwrap();

    let manifest = requests_to(&server, "/api/get-video-url").await;
    assert_eq!(header(&manifest[0], "cookie"), Some(COOKIE));

    let key_server = requests_to(&server, "/api/get-otp").await;
    assert_eq!(header(&key_server[0], "cookie"), Some(COOKIE));

    let details = requests_to(&server, "/video-url-details").await;
    assert_eq!(header(&details[0], "cookie"), None);

    let catalog = requests_to(&server, "/api/batches").await;
    assert_eq!(header(&catalog[0], "cookie"), None);
    assert_eq!(catalog[0].url.query(), Some("page=1&limit=10"));
}

#[tokio::test]
async fn manifest_fetch_carries_origin_and_referer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/x/master.mpd"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<MPD/>"))
        .mount(&server)
        .await;

    let api = api_for(&config_for(&server));
    let text = api
        .manifest_text(&format!("{}/x/master.mpd?Sig=1", server.uri()))
        .await
        .unwrap();
    assert_eq!(text, "<MPD/>");

    let requests = requests_to(&server, "/x/master.mpd").await;
    let origin = server.uri();
    assert_eq!(header(&requests[0], "origin"), Some(origin.as_str()));
    assert_eq!(header(&requests[0], "referer"), Some(format!("{origin}/").as_str()));
    assert_eq!(header(&requests[0], "cookie"), None);
}

#[tokio::test]
async fn latin1_and_bom_bodies_are_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/batches"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"{\"data\":[{\"name\":\"caf\xe9\"}]}".to_vec(), "application/json"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/batch/b1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            [b"\xef\xbb\xbf".as_slice(), br#"{"data":{"_id":"b1"}}"#].concat(),
            "application/json",
        ))
        .mount(&server)
        .await;

    let api = api_for(&config_for(&server));
    let page = api.batches(1, 10).await.unwrap();
    assert_eq!(page["data"][0]["name"], "café");

    let details = api.batch_details("b1").await.unwrap();
    assert_eq!(details["data"]["_id"], "b1");
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/get-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let api = api_for(&config_for(&server));
    let err = api.clear_keys("aabbcc").await.unwrap_err();
    assert!(matches!(
        err,
        UpstreamError::Decode {
            upstream: UpstreamName::KeyServer,
            ..
        }
    ));
}

#[tokio::test]
async fn error_status_is_reported_with_its_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video-url-details"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let api = api_for(&config_for(&server));
    let err = api.video_url_details("b", "c").await.unwrap_err();
    assert_eq!(err, UpstreamError::status(UpstreamName::VideoDetails, 403));
    assert!(err.is_fallback_eligible());
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/batches"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.upstreams.catalog.timeout = Duration::from_millis(100);
    let api = api_for(&config);

    let err = api.batches(1, 10).await.unwrap_err();
    assert_eq!(
        err,
        UpstreamError::Timeout {
            upstream: UpstreamName::Catalog
        }
    );
}

#[tokio::test]
async fn hls_key_follows_one_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/videos/get-hls-key"))
        .and(query_param("videoKey", "1a2b3c4d-0000-1111-2222-333344445555"))
        .and(query_param("key", "enc.key"))
        .and(query_param("KeyName", "signing-key"))
        .and(query_param("authorization", "token"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/keys/abc"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/keys/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a2V5"))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&config_for(&server));
    assert_eq!(api.hls_key(&key_request()).await.unwrap(), "a2V5");

    let redirected = requests_to(&server, "/keys/abc").await;
    assert_eq!(header(&redirected[0], "user-agent"), None);
}

#[tokio::test]
async fn hls_key_redirect_is_not_chained() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/videos/get-hls-key"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/hop"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hop"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/final"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/final"))
        .respond_with(ResponseTemplate::new(200).set_body_string("never"))
        .expect(0)
        .mount(&server)
        .await;

    let api = api_for(&config_for(&server));
    let err = api.hls_key(&key_request()).await.unwrap_err();
    assert_eq!(err, UpstreamError::status(UpstreamName::HlsKey, 301));
}

#[tokio::test]
async fn redirect_without_location_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/videos/get-hls-key"))
        .respond_with(ResponseTemplate::new(302))
        .mount(&server)
        .await;

    let api = api_for(&config_for(&server));
    let err = api.hls_key(&key_request()).await.unwrap_err();
    assert!(matches!(
        err,
        UpstreamError::Redirect {
            upstream: UpstreamName::HlsKey,
            ..
        }
    ));
}

#[tokio::test]
async fn manifest_probe_reports_redirect_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/get-video-url"))
        .respond_with(ResponseTemplate::new(307).insert_header("location", "/login"))
        .mount(&server)
        .await;

    let api = api_for(&config_for(&server));
    let reference = ManifestReference::new("b", "s", "c").unwrap();
    assert_eq!(api.probe_manifest(&reference).await.unwrap(), 307);
    assert!(requests_to(&server, "/login").await.is_empty());
}
