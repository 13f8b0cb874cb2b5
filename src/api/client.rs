//! HTTP client for the remote catalog store.
//!
//! This module provides the `ApiClient` struct for fetching the catalog
//! version token and the product/category collections over HTTP.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::{CategoriesPayload, Category, Product, ProductsPayload, VersionResponse};

use super::{ApiError, CatalogRemote};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
/// 3 retries with exponential backoff usually succeeds without excessive delay.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
/// 1 second is polite to the server while not making users wait too long.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// HTTP client for the catalog API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit
    /// (should retry), or Err for other failures.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            // Rate limited - signal to retry
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// GET a JSON body with 429 retry and exponential backoff.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::UnexpectedResponse(format!("{}: {}", url, e)))
    }

    /// GET a raw body with 429 retry and exponential backoff.
    async fn get_text(&self, url: &str) -> Result<String, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self.client.get(url).send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return Ok(response.text().await?);
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url, retry = retries, backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    /// Fetch a catalog collection and normalize its shape.
    ///
    /// The remote answers either a bare array or a wrapped object; a body
    /// matching neither is treated as an empty collection rather than an
    /// error, so one malformed payload cannot fail the whole sync pass.
    async fn get_collection<P, T>(&self, path: &str, unwrap: fn(P) -> Vec<T>) -> Result<Vec<T>, ApiError>
    where
        P: DeserializeOwned,
    {
        let url = self.url(path);
        let body = self.get_text(&url).await?;
        match serde_json::from_str::<P>(&body) {
            Ok(payload) => Ok(unwrap(payload)),
            Err(e) => {
                warn!(url, error = %e, "Malformed catalog payload, treating as empty");
                Ok(Vec::new())
            }
        }
    }
}

impl CatalogRemote for ApiClient {
    async fn version(&self) -> Result<String, ApiError> {
        let resp: VersionResponse = self.get_json(&self.url("/version/cache")).await?;
        debug!(
            version = %resp.version,
            last_updated = resp.last_updated.as_deref().unwrap_or("unknown"),
            "Fetched remote version token"
        );
        Ok(resp.version)
    }

    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_collection("/catalog/products", ProductsPayload::into_products)
            .await
    }

    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_collection("/catalog/categories", CategoriesPayload::into_categories)
            .await
    }
}
