//! Product data API client.
//!
//! Storefront pages pull products and collections from this API at build
//! time. The orchestrator never calls it during a build; it only hands the
//! settings to each store through its environment file. The client here backs
//! the `api` preflight command.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Upper bound on records requested per call, matching what pages ask for.
pub const MAX_COUNT: u32 = 20;

/// Environment variable names used to pass the settings to a build.
pub const BASE_URL_VAR: &str = "API_BASE_URL";
pub const API_KEY_VAR: &str = "API_KEY";

/// Connection settings for the data API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
  pub base_url: String,
  pub api_key: String,
}

impl ApiConfig {
  /// Add the settings to a store's variables without replacing ones it already sets.
  pub fn inject_into(&self, vars: &mut IndexMap<String, String>) {
    vars
      .entry(BASE_URL_VAR.to_string())
      .or_insert_with(|| self.base_url.clone());
    vars.entry(API_KEY_VAR.to_string()).or_insert_with(|| self.api_key.clone());
  }
}

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("request to {endpoint} failed: {source}")]
  Request {
    endpoint: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("API error {status} from {endpoint}")]
  Status { endpoint: String, status: u16 },

  #[error("invalid response from {endpoint}: {source}")]
  Decode {
    endpoint: String,
    #[source]
    source: reqwest::Error,
  },
}

/// Async client for the products and collections endpoints.
#[derive(Debug, Clone)]
pub struct DataApiClient {
  config: ApiConfig,
  http: reqwest::Client,
}

impl DataApiClient {
  pub fn new(config: ApiConfig) -> Self {
    Self {
      config,
      http: reqwest::Client::new(),
    }
  }

  pub async fn get_products(&self, count: u32) -> Result<Vec<Value>, ApiError> {
    self.fetch_records("/api/products", count).await
  }

  pub async fn get_collections(&self, count: u32) -> Result<Vec<Value>, ApiError> {
    self.fetch_records("/api/collections", count).await
  }

  async fn fetch_records(&self, path: &str, count: u32) -> Result<Vec<Value>, ApiError> {
    if count == 0 {
      return Ok(Vec::new());
    }
    let count = count.min(MAX_COUNT);

    let endpoint = format!("{}{}?count={}", self.config.base_url.trim_end_matches('/'), path, count);
    debug!(endpoint = %endpoint, "fetching records");

    let response = self
      .http
      .get(&endpoint)
      .header("apikey", &self.config.api_key)
      .send()
      .await
      .map_err(|e| ApiError::Request {
        endpoint: endpoint.clone(),
        source: e,
      })?;

    let status = response.status();
    if !status.is_success() {
      return Err(ApiError::Status {
        endpoint,
        status: status.as_u16(),
      });
    }

    response
      .json::<Vec<Value>>()
      .await
      .map_err(|e| ApiError::Decode { endpoint, source: e })
  }
}
