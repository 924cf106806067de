//! IUCN Red List species search

use bis_core::http::{get_json_with_secret_query, http_client, trim_base, DEFAULT_USER_AGENT};
use bis_core::Envelope;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

/// Envelope returned by species lookups; data is the Red List response body
pub type IucnEnvelope = Envelope<Value>;

pub struct IucnClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl IucnClient {
    pub const DEFAULT_BASE_URL: &'static str = "http://apiv3.iucnredlist.org/api/v3";

    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: &str, token: Option<String>) -> Self {
        Self {
            http: http_client(DEFAULT_USER_AGENT),
            base_url: trim_base(base_url),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Species URL as recorded, without the token
    pub fn species_url(&self, scientific_name: &str) -> String {
        format!(
            "{}/species/{}",
            self.base_url,
            urlencoding::encode(scientific_name)
        )
    }

    pub async fn search_species(&self, scientific_name: &str) -> IucnEnvelope {
        let url = self.species_url(scientific_name);
        let mut envelope =
            Envelope::not_matched().with_parameter("Scientific Name", scientific_name);
        envelope.record_call("Species", &url);

        let Some(token) = &self.token else {
            return envelope.fail("API token not present to run IUCN Red List query");
        };

        let token_query = format!("token={}", urlencoding::encode(token));
        match get_json_with_secret_query(&self.http, &url, &token_query).await {
            Ok(body) => {
                debug!(scientific_name, "IUCN species matched");
                envelope.succeed("Species Name Matched", body)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "IUCN species lookup failed");
                envelope.error("IUCN API returned an unprocessable result")
            }
        }
    }
}
