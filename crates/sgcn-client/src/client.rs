//! SGCN national list search

use bis_core::http::{get_text, http_client, trim_base, DEFAULT_USER_AGENT};
use bis_core::{BisError, Envelope};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Envelope returned by SGCN searches; data is the matching species properties
pub type SgcnEnvelope = Envelope<Map<String, Value>>;

/// Identifiers and per-year flags not carried into results
const DROPPED_PROPERTIES: &[&str] = &["gid", "sgcn2005", "sgcn2015"];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: Source,
}

#[derive(Debug, Deserialize)]
struct Source {
    #[serde(default)]
    properties: Map<String, Value>,
}

pub struct SgcnClient {
    http: Client,
    base_url: String,
}

impl SgcnClient {
    pub const DEFAULT_BASE_URL: &'static str =
        "https://api.sciencebase.gov/bis-api/api/v1/swap/nationallist";

    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: http_client(DEFAULT_USER_AGENT),
            base_url: trim_base(base_url),
        }
    }

    pub fn search_url(&self, scientific_name: &str) -> String {
        format!(
            "{}?scientificname={}",
            self.base_url,
            urlencoding::encode(scientific_name)
        )
    }

    async fn query(&self, url: &str) -> bis_core::Result<SearchResponse> {
        let body = get_text(&self.http, url).await?;
        serde_json::from_str(&body).map_err(BisError::from)
    }

    /// Find the national list entry whose scientific name matches exactly
    pub async fn search(&self, scientific_name: &str, name_source: Option<&str>) -> SgcnEnvelope {
        let url = self.search_url(scientific_name);
        let mut envelope =
            Envelope::not_matched().with_parameter("Scientific Name", scientific_name);
        if let Some(source) = name_source {
            envelope = envelope.with_parameter("Name Source", source);
        }
        envelope.record_call("National List Search", &url);

        let response = match self.query(&url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "SGCN search failed");
                return envelope.error(e.to_string());
            }
        };

        let species = response.hits.hits.into_iter().map(|h| h.source.properties).find(|p| {
            p.get("scientificname").and_then(Value::as_str) == Some(scientific_name)
        });

        match species {
            Some(mut properties) => {
                for key in DROPPED_PROPERTIES {
                    properties.remove(*key);
                }
                debug!(scientific_name, "SGCN name matched");
                envelope.succeed("Name Match", properties)
            }
            None => envelope,
        }
    }
}

impl Default for SgcnClient {
    fn default() -> Self {
        Self::new()
    }
}
