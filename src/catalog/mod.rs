//! Batch catalog proxy
//!
//! Thin layer over the catalog upstream: single pages, a bounded fetch-all
//! loop, and batch details with upstream 404s surfaced as not found.

use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::CatalogConfig;
use crate::errors::{AppError, AppResult, UpstreamError};
use crate::upstream::UpstreamApi;

/// One catalog response in the shape the API returns it
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub success: bool,
    pub data: Value,
    pub pagination: Option<Value>,
}

pub struct CatalogService {
    api: Arc<dyn UpstreamApi>,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(api: Arc<dyn UpstreamApi>, config: CatalogConfig) -> Self {
        Self { api, config }
    }

    pub fn default_page_size(&self) -> u32 {
        self.config.default_page_size
    }

    /// A single upstream page
    pub async fn list(&self, page: u32, limit: u32) -> AppResult<CatalogPage> {
        let body = self.api.batches(page, limit).await?;

        let pagination = match body.get("pagination") {
            Some(pagination) => Some(pagination.clone()),
            None if body.get("total").is_some() || body.get("page").is_some() => Some(json!({
                "page": page,
                "limit": limit,
                "total": body.get("total").cloned().unwrap_or(json!(0)),
                "pages": body.get("pages").cloned().unwrap_or(json!(0)),
            })),
            None => None,
        };

        Ok(CatalogPage {
            success: success_flag(&body),
            data: body.get("data").cloned().unwrap_or_else(|| body.clone()),
            pagination,
        })
    }

    /// Every page, until the upstream runs dry or `max_pages` is reached
    ///
    /// A failure on the first page is returned; later failures end the loop
    /// and whatever was collected so far is returned.
    pub async fn list_all(&self, page_size: u32) -> AppResult<CatalogPage> {
        let page_size = page_size.max(1);
        let mut batches: Vec<Value> = Vec::new();
        let mut pages_fetched = 0u32;
        let mut last_page_size = 0usize;

        for page in 1..=self.config.max_pages {
            let body = match self.api.batches(page, page_size).await {
                Ok(body) => body,
                Err(e) if page == 1 => return Err(e.into()),
                Err(e) => {
                    warn!("Stopping batch pagination at page {}: {}", page, e);
                    break;
                }
            };

            if !success_flag(&body) {
                warn!("Catalog reported failure on page {}", page);
                break;
            }

            let page_batches = page_items(&body);
            if page_batches.is_empty() {
                debug!("No more batches after page {}", page - 1);
                break;
            }

            pages_fetched += 1;
            last_page_size = page_batches.len();
            batches.extend(page_batches);
            debug!("Fetched page {} ({} batches, {} total)", page, last_page_size, batches.len());

            if last_page_size < page_size as usize {
                break;
            }
            if page == self.config.max_pages {
                warn!("Reached the {} page limit while fetching batches", self.config.max_pages);
            }
        }

        info!("Fetched {} batches across {} page(s)", batches.len(), pages_fetched);
        let total = batches.len();
        Ok(CatalogPage {
            success: true,
            data: json!({
                "batches": batches,
                "total_count": total,
                "pages_fetched": pages_fetched,
            }),
            pagination: Some(json!({
                "total_batches": total,
                "pages_fetched": pages_fetched,
                "last_page_size": last_page_size,
            })),
        })
    }

    pub async fn details(&self, batch_id: &str) -> AppResult<CatalogPage> {
        let body = self.api.batch_details(batch_id).await.map_err(|e| match e {
            UpstreamError::Status { status: 404, .. } => AppError::not_found("batch", batch_id),
            other => other.into(),
        })?;

        Ok(CatalogPage {
            success: success_flag(&body),
            data: body.get("data").cloned().unwrap_or_else(|| body.clone()),
            pagination: None,
        })
    }
}

/// Catalog responses without a `success` flag count as successful
fn success_flag(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool).unwrap_or(true)
}

/// Batches on a page: `data` itself when it is a list, else `data.batches`
fn page_items(body: &Value) -> Vec<Value> {
    match body.get("data") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(data)) => data
            .get("batches")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
