//! WoRMS REST client

use crate::types::WormsRecord;
use bis_core::http::{http_client, trim_base, DEFAULT_USER_AGENT};
use bis_core::{Envelope, Result};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// Envelope returned by WoRMS searches
pub type WormsEnvelope = Envelope<Vec<WormsRecord>>;

/// Kinds of WoRMS lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    ExactName,
    FuzzyName,
    AphiaId,
    AphiaIdByName,
}

/// Client for the World Register of Marine Species REST service
pub struct WormsClient {
    http: Client,
    base_url: String,
}

impl WormsClient {
    pub const DEFAULT_BASE_URL: &'static str = "http://www.marinespecies.org/rest";

    /// Upper bound on valid-AphiaID redirects followed from one record
    pub const MAX_CHAIN: usize = 10;

    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: http_client(DEFAULT_USER_AGENT),
            base_url: trim_base(base_url),
        }
    }

    pub fn search_url(&self, search_type: SearchType, target: &str) -> String {
        let target = urlencoding::encode(target);
        match search_type {
            SearchType::ExactName => format!(
                "{}/AphiaRecordsByName/{}?like=false&marine_only=false&offset=1",
                self.base_url, target
            ),
            SearchType::FuzzyName => format!(
                "{}/AphiaRecordsByName/{}?like=true&marine_only=false&offset=1",
                self.base_url, target
            ),
            SearchType::AphiaId => format!("{}/AphiaRecordByAphiaID/{}", self.base_url, target),
            SearchType::AphiaIdByName => format!(
                "{}/AphiaIDByName/{}?marine_only=false",
                self.base_url, target
            ),
        }
    }

    /// GET a WoRMS resource; anything but 200 means "no content"
    async fn fetch<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        debug!(url, "WoRMS request");
        let response = self.http.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }

    /// First record returned by a name search
    async fn first_by_name(&self, url: &str) -> Result<Option<WormsRecord>> {
        let records: Option<Vec<WormsRecord>> = self.fetch(url).await?;
        Ok(records.and_then(|r| r.into_iter().next()))
    }

    /// Search a scientific name, then follow valid-AphiaID redirects.
    ///
    /// An exact name search is tried first, then a fuzzy one. Whatever record is
    /// found is followed through its `valid_AphiaID` until an already-seen ID,
    /// a missing link or [`Self::MAX_CHAIN`] hops.
    pub async fn search(&self, scientific_name: &str) -> WormsEnvelope {
        let mut envelope =
            Envelope::not_matched().with_parameter("Scientific Name", scientific_name);

        let exact_url = self.search_url(SearchType::ExactName, scientific_name);
        envelope.record_call("Exact Match", &exact_url);
        let (mut message, first) = match self.first_by_name(&exact_url).await {
            Ok(Some(record)) => ("Exact Match", record),
            Ok(None) => {
                let fuzzy_url = self.search_url(SearchType::FuzzyName, scientific_name);
                envelope.record_call("Fuzzy Match", &fuzzy_url);
                match self.first_by_name(&fuzzy_url).await {
                    Ok(Some(record)) => ("Fuzzy Match", record),
                    Ok(None) => return envelope,
                    Err(e) => {
                        warn!(url = %fuzzy_url, error = %e, "WoRMS fuzzy search failed");
                        return envelope.error(e.to_string());
                    }
                }
            }
            Err(e) => {
                warn!(url = %exact_url, error = %e, "WoRMS exact search failed");
                return envelope.error(e.to_string());
            }
        };

        let mut seen = vec![first.aphia_id];
        let mut next = first.valid_aphia_id;
        let mut records = vec![first.with_taxonomy()];
        let mut hops = 0;

        while let Some(id) = next {
            if seen.contains(&id) || hops >= Self::MAX_CHAIN {
                break;
            }
            hops += 1;
            let url = self.search_url(SearchType::AphiaId, &id.to_string());
            envelope.record_call("AphiaID", &url);
            match self.fetch::<WormsRecord>(&url).await {
                Ok(Some(record)) => {
                    debug!(aphia_id = id, "Followed valid AphiaID");
                    message = "Followed Valid AphiaID";
                    seen.push(id);
                    seen.push(record.aphia_id);
                    next = record.valid_aphia_id;
                    records.push(record.with_taxonomy());
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(url = %url, error = %e, "WoRMS AphiaID lookup failed");
                    break;
                }
            }
        }

        envelope.succeed(message, records)
    }

    /// Look up the AphiaID registered for a name
    pub async fn aphia_id_by_name(&self, scientific_name: &str) -> Result<Option<i64>> {
        let url = self.search_url(SearchType::AphiaIdByName, scientific_name);
        self.fetch(&url).await
    }
}

impl Default for WormsClient {
    fn default() -> Self {
        Self::new()
    }
}
