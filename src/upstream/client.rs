//! HTTP transport for upstream targets
//!
//! Every request carries exactly the headers and timeout of the target it is
//! aimed at. Non-2xx statuses become [`UpstreamError::Status`] and bodies are
//! decoded through the UTF-8 then Latin-1 chain before JSON parsing.

use reqwest::redirect::Policy;
use reqwest::{Client, Method, RequestBuilder, Response, header::LOCATION};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{UpstreamName, UpstreamTarget};
use crate::errors::{AppError, AppResult, UpstreamError, UpstreamResult};
use crate::utils::text::{TextEncoding, decode_latin1, decode_text, decode_utf8};
use crate::utils::url::UrlUtils;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared reqwest clients, one that follows redirects and one that does not
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    no_redirect: Client,
}

impl UpstreamClient {
    pub fn new() -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {e}")))?;
        let no_redirect = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .redirect(Policy::none())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            no_redirect,
        })
    }

    fn request(&self, client: &Client, method: Method, target: &UpstreamTarget, url: &str) -> RequestBuilder {
        client
            .request(method, url)
            .headers(target.headers().clone())
            .timeout(target.timeout())
    }

    async fn send(target: &UpstreamTarget, builder: RequestBuilder) -> UpstreamResult<Response> {
        let name = target.name();
        let response = builder
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(name, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(
                "{} answered {} for {}",
                name,
                status,
                UrlUtils::obfuscate_credentials(response.url().as_str())
            );
            return Err(UpstreamError::status(name, status.as_u16()));
        }
        Ok(response)
    }

    async fn body(name: UpstreamName, response: Response) -> UpstreamResult<Vec<u8>> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::from_reqwest(name, e))?;
        debug!("{} returned {} bytes", name, bytes.len());
        Ok(bytes.to_vec())
    }

    /// GET the target endpoint with query parameters and decode a JSON body
    pub async fn get_json(&self, target: &UpstreamTarget, query: &[(&str, &str)]) -> UpstreamResult<Value> {
        self.get_json_at(target, target.endpoint().as_str(), query).await
    }

    /// GET an explicit URL using the target's headers and decode a JSON body
    pub async fn get_json_at(
        &self,
        target: &UpstreamTarget,
        url: &str,
        query: &[(&str, &str)],
    ) -> UpstreamResult<Value> {
        let builder = self.request(&self.client, Method::GET, target, url).query(query);
        let response = Self::send(target, builder).await?;
        let bytes = Self::body(target.name(), response).await?;
        decode_json(target.name(), &bytes)
    }

    /// GET an explicit URL using the target's headers and decode the body as text
    pub async fn get_text_at(&self, target: &UpstreamTarget, url: &str) -> UpstreamResult<String> {
        let builder = self.request(&self.client, Method::GET, target, url);
        let response = Self::send(target, builder).await?;
        let bytes = Self::body(target.name(), response).await?;
        Ok(into_text(target.name(), &bytes))
    }

    /// POST a JSON body to the target endpoint and decode a JSON body
    pub async fn post_json(&self, target: &UpstreamTarget, body: &Value) -> UpstreamResult<Value> {
        let builder = self
            .request(&self.client, Method::POST, target, target.endpoint().as_str())
            .json(body);
        let response = Self::send(target, builder).await?;
        let bytes = Self::body(target.name(), response).await?;
        decode_json(target.name(), &bytes)
    }

    /// POST a JSON body to the target endpoint and return the response as text
    pub async fn post_json_for_text(&self, target: &UpstreamTarget, body: &Value) -> UpstreamResult<String> {
        let builder = self
            .request(&self.client, Method::POST, target, target.endpoint().as_str())
            .json(body);
        let response = Self::send(target, builder).await?;
        let bytes = Self::body(target.name(), response).await?;
        Ok(into_text(target.name(), &bytes))
    }

    /// GET the target endpoint, following at most one redirect
    ///
    /// The redirected request is a plain GET without the target's headers.
    pub async fn get_following_redirect_once(
        &self,
        target: &UpstreamTarget,
        query: &[(&str, &str)],
    ) -> UpstreamResult<String> {
        let name = target.name();
        let response = self
            .request(&self.no_redirect, Method::GET, target, target.endpoint().as_str())
            .query(query)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(name, e))?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| UpstreamError::Redirect {
                    upstream: name,
                    message: format!("HTTP {status} without a Location header"),
                })?;
            let next = response.url().join(location).map_err(|e| UpstreamError::Redirect {
                upstream: name,
                message: format!("invalid Location header: {e}"),
            })?;

            debug!(
                "{} redirected ({}) to {}",
                name,
                status,
                UrlUtils::obfuscate_credentials(next.as_str())
            );

            let builder = self.no_redirect.get(next).timeout(target.timeout());
            let response = Self::send(target, builder).await?;
            let bytes = Self::body(name, response).await?;
            return Ok(into_text(name, &bytes));
        }

        if !status.is_success() {
            return Err(UpstreamError::status(name, status.as_u16()));
        }
        let bytes = Self::body(name, response).await?;
        Ok(into_text(name, &bytes))
    }

    /// GET the target endpoint without following redirects and report the raw status
    pub async fn probe_status(&self, target: &UpstreamTarget, query: &[(&str, &str)]) -> UpstreamResult<u16> {
        let response = self
            .request(&self.no_redirect, Method::GET, target, target.endpoint().as_str())
            .query(query)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(target.name(), e))?;
        Ok(response.status().as_u16())
    }
}

fn into_text(name: UpstreamName, bytes: &[u8]) -> String {
    let (text, encoding) = decode_text(bytes);
    if encoding == TextEncoding::Latin1 {
        debug!("{} body is not valid UTF-8, decoded as Latin-1", name);
    }
    text
}

/// Parse a JSON body, retrying with explicit UTF-8 (BOM stripped) and then Latin-1
pub fn decode_json(name: UpstreamName, bytes: &[u8]) -> UpstreamResult<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(UpstreamError::decode(name, "empty response body"));
    }

    let direct_error = match serde_json::from_slice(bytes) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    debug!("{} body is not plain JSON ({}), retrying with explicit decoding", name, direct_error);

    if let Some(text) = decode_utf8(bytes) {
        if let Ok(value) = serde_json::from_str(text) {
            return Ok(value);
        }
    }

    match serde_json::from_str(&decode_latin1(bytes)) {
        Ok(value) => {
            debug!("{} JSON decoded as Latin-1", name);
            Ok(value)
        }
        Err(e) => {
            warn!("{} returned a body that is not JSON in any supported encoding", name);
            Err(UpstreamError::decode(name, e.to_string()))
        }
    }
}
