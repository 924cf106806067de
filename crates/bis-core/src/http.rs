//! Shared HTTP helpers for source clients

use crate::error::{BisError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Default user agent sent to every source
pub const DEFAULT_USER_AGENT: &str = "bis-adapters/0.1";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Build an HTTP client with the standard timeout and the given user agent
pub fn http_client(user_agent: &str) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(user_agent)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// GET a URL and return the body as text, failing on non-success statuses
pub async fn get_text(client: &Client, url: &str) -> Result<String> {
    debug!(url, "GET");
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(BisError::Status(response.status().as_u16()));
    }
    Ok(response.text().await?)
}

/// GET a URL and parse the body as JSON
pub async fn get_json(client: &Client, url: &str) -> Result<serde_json::Value> {
    let body = get_text(client, url).await?;
    Ok(serde_json::from_str(&body)?)
}

/// GET `url` with a credential-bearing query string and parse the body as JSON.
///
/// Only `url` is logged, and transport errors are stripped of the request URL
/// so the query never reaches logs or error messages.
pub async fn get_json_with_secret_query(
    client: &Client,
    url: &str,
    secret_query: &str,
) -> Result<serde_json::Value> {
    debug!(url, "GET");
    let response = client
        .get(format!("{}?{}", url, secret_query))
        .send()
        .await
        .map_err(|e| BisError::Http(e.without_url()))?;
    if !response.status().is_success() {
        return Err(BisError::Status(response.status().as_u16()));
    }
    let body = response
        .text()
        .await
        .map_err(|e| BisError::Http(e.without_url()))?;
    Ok(serde_json::from_str(&body)?)
}

/// Strip a trailing slash so paths can be appended with `format!`
pub fn trim_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
