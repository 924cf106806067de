//! GBIF API HTTP client

use crate::types::{OccurrenceSummary, SuggestResult, UsSpeciesSummary};
use bis_core::http::{get_text, http_client, trim_base, DEFAULT_USER_AGENT};
use bis_core::{Envelope, Result};
use tracing::{debug, warn};

/// Envelope returned by [`GbifClient::summarize_us_species`]
pub type GbifEnvelope = Envelope<UsSpeciesSummary>;

/// Facets requested for every occurrence summary
const OCCURRENCE_FACETS: &str = "facet=institutionCode&facet=year&facet=basisOfRecord";

/// Client for the GBIF v1 species and occurrence APIs
pub struct GbifClient {
    http: reqwest::Client,
    base_url: String,
}

impl GbifClient {
    /// Base URL for GBIF API v1
    pub const DEFAULT_BASE_URL: &'static str = "https://api.gbif.org/v1";
    /// Prefix of the resolvable species identifiers handed out in summaries
    pub const SPECIES_ROOT: &'static str = "http://api.gbif.org/v1/species/";

    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: http_client(DEFAULT_USER_AGENT),
            base_url: trim_base(base_url),
        }
    }

    pub fn suggest_url(&self, query: &str) -> String {
        format!(
            "{}/species/suggest?q={}",
            self.base_url,
            urlencoding::encode(query)
        )
    }

    pub fn occurrence_url(&self, field: &str, value: &str) -> String {
        format!(
            "{}/occurrence/search?country=US&limit=0&{}&{}={}",
            self.base_url,
            OCCURRENCE_FACETS,
            field,
            urlencoding::encode(value)
        )
    }

    /// Search for taxa matching a name
    ///
    /// A non-success status from GBIF is treated as no results.
    pub async fn suggest(&self, query: &str) -> Result<Vec<SuggestResult>> {
        let url = self.suggest_url(query);
        debug!(url = %url, "GBIF suggest");
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Ok(vec![]);
        }

        Ok(response.json().await?)
    }

    /// US occurrence count and facets for records where `field` equals `value`
    pub async fn occurrence_summary(&self, field: &str, value: &str) -> Result<OccurrenceSummary> {
        let url = self.occurrence_url(field, value);
        let body = get_text(&self.http, &url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Summarize a species and its US occurrences.
    ///
    /// The first suggest hit is used. Occurrences are filtered by the hit's
    /// backbone `nubKey` when it has one, otherwise by the scientific name.
    pub async fn summarize_us_species(
        &self,
        scientific_name: &str,
        name_source: Option<&str>,
    ) -> GbifEnvelope {
        let mut envelope =
            Envelope::not_matched().with_parameter("Scientific Name", scientific_name);
        if let Some(source) = name_source {
            envelope = envelope.with_parameter("Name Source", source);
        }

        envelope.record_call("Species Suggest", self.suggest_url(scientific_name));
        let hit = match self.suggest(scientific_name).await {
            Ok(results) => match results.into_iter().next() {
                Some(hit) => hit,
                None => return envelope,
            },
            Err(e) => {
                warn!(scientific_name, error = %e, "GBIF suggest failed");
                return envelope.error(e.to_string());
            }
        };

        let nub_key = hit.nub_key.map(|k| k.to_string());
        let (field, value) = match nub_key.as_deref() {
            Some(key) => ("taxonKey", key),
            None => ("scientificName", scientific_name),
        };
        envelope.record_call("Occurrence Summary", self.occurrence_url(field, value));
        let occurrence_summary = match self.occurrence_summary(field, value).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(scientific_name, error = %e, "GBIF occurrence summary failed");
                return envelope.error(e.to_string());
            }
        };

        let summary = UsSpeciesSummary {
            key: hit.key,
            resolvable_identifier: format!("{}{}", Self::SPECIES_ROOT, hit.key),
            biological_taxonomy: hit.taxonomy(),
            scientific_name: hit.canonical_name,
            name_with_source: hit.scientific_name,
            rank: hit.rank,
            taxonomic_status: hit.status,
            synonym: hit.synonym,
            occurrence_summary,
        };
        envelope.succeed("Matched", summary)
    }
}

impl Default for GbifClient {
    fn default() -> Self {
        Self::new()
    }
}
