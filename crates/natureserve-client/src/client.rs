//! NatureServe name search

use bis_core::http::{get_text, http_client, trim_base, DEFAULT_USER_AGENT};
use bis_core::{xml_to_json, Envelope};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

/// Envelope returned by NatureServe searches; data is the species record
pub type NatureServeEnvelope = Envelope<Value>;

pub struct NatureServeClient {
    http: Client,
    base_url: String,
}

impl NatureServeClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://services.natureserve.org/idd/rest/v1";

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
            "{}/nationalSpecies/summary/nameSearch?nationCode=US&name={}",
            self.base_url,
            urlencoding::encode(scientific_name)
        )
    }

    /// Look up a scientific name among US national species
    pub async fn search(&self, scientific_name: &str) -> NatureServeEnvelope {
        let url = self.search_url(scientific_name);
        let mut envelope =
            Envelope::not_matched().with_parameter("Scientific Name", scientific_name);
        envelope.record_call("Name Search", &url);

        let parsed = match get_text(&self.http, &url).await {
            Ok(body) => xml_to_json(&body),
            Err(e) => Err(e),
        };
        let document = match parsed {
            Ok(document) => document,
            Err(e) => {
                warn!(url = %url, error = %e, "NatureServe search failed");
                return envelope.error(e.to_string());
            }
        };

        match pick_species(document, scientific_name) {
            Some(species) => {
                debug!(scientific_name, "NatureServe species matched");
                envelope.succeed("Matched", species)
            }
            None => envelope,
        }
    }
}

impl Default for NatureServeClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A lone species is taken as-is; from a list, the one with the exact name
fn pick_species(mut document: Value, scientific_name: &str) -> Option<Value> {
    let species = document
        .get_mut("speciesList")?
        .as_object_mut()?
        .remove("species")?;
    match species {
        Value::Array(candidates) => candidates
            .into_iter()
            .find(|c| c["nationalScientificName"].as_str() == Some(scientific_name)),
        Value::Null => None,
        single => Some(single),
    }
}
