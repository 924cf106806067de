//! xDD snippets search with paging

use bis_core::http::{http_client, trim_base, DEFAULT_USER_AGENT};
use bis_core::{BisError, Envelope, Status};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Envelope returned by snippet searches; data is the list of documents
pub type XddEnvelope = Envelope<Vec<Map<String, Value>>>;

/// xDD field name -> shared property name
const PROPERTY_MAPPING: &[(&str, &str)] = &[("title", "document_title"), ("URL", "document_link")];

#[derive(Debug, Deserialize)]
struct SnippetsResponse {
    success: Option<SnippetsPage>,
}

#[derive(Debug, Deserialize)]
struct SnippetsPage {
    #[serde(default)]
    hits: Value,
    #[serde(default)]
    data: Vec<Map<String, Value>>,
    #[serde(default)]
    next_page: String,
}

impl SnippetsPage {
    /// xDD reports hits as a number or a numeric string
    fn hit_count(&self) -> u64 {
        match &self.hits {
            Value::Number(n) => n.as_u64().unwrap_or(0),
            Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

enum PageError {
    Status(StatusCode),
    Other(BisError),
}

impl From<reqwest::Error> for PageError {
    fn from(e: reqwest::Error) -> Self {
        Self::Other(BisError::from(e))
    }
}

pub struct XddClient {
    http: Client,
    base_url: String,
}

impl XddClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://geodeepdive.org/api";

    /// Upper bound on `next_page` links followed for one search
    pub const MAX_PAGES: usize = 100;

    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: http_client(DEFAULT_USER_AGENT),
            base_url: trim_base(base_url),
        }
    }

    pub fn snippets_url(&self, term: &str) -> String {
        format!(
            "{}/snippets?full_results&clean&term={}",
            self.base_url,
            urlencoding::encode(term)
        )
    }

    async fn fetch_page(&self, url: &str) -> Result<SnippetsResponse, PageError> {
        debug!(url, "xDD request");
        let response = self.http.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(PageError::Status(response.status()));
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| PageError::Other(BisError::from(e)))
    }

    /// Search snippets for a term and collect every page of documents
    pub async fn snippets(&self, term: &str) -> XddEnvelope {
        let url = self.snippets_url(term);
        let mut envelope = Envelope::new(Status::Error).with_parameter("Search Term", term);
        envelope.record_call("Snippets", &url);

        let first = match self.fetch_page(&url).await {
            Ok(response) => response,
            Err(PageError::Status(status)) => {
                warn!(url = %url, status = status.as_u16(), "xDD search failed");
                return envelope.error(format!(
                    "The following status code was returned: {}",
                    status.as_u16()
                ));
            }
            Err(PageError::Other(e)) => {
                warn!(url = %url, error = %e, "xDD search failed");
                return envelope.error(e.to_string());
            }
        };

        let Some(page) = first.success else {
            return envelope.fail("No data returned. Verify request is valid.");
        };
        if page.hit_count() == 0 {
            return envelope.fail("No data returned.");
        }

        let mut documents = page.data;
        let mut next_page = page.next_page;
        let mut pages = 1;
        while !next_page.is_empty() {
            if pages >= Self::MAX_PAGES {
                warn!(term, pages, "xDD page limit reached, results truncated");
                break;
            }
            pages += 1;
            envelope.record_call("Next Page", &next_page);
            match self.fetch_page(&next_page).await {
                Ok(SnippetsResponse { success: Some(page) }) => {
                    documents.extend(page.data);
                    next_page = page.next_page;
                }
                Ok(SnippetsResponse { success: None }) => break,
                Err(e) => {
                    let reason = match e {
                        PageError::Status(status) => status.as_u16().to_string(),
                        PageError::Other(e) => e.to_string(),
                    };
                    warn!(url = %next_page, reason = %reason, "xDD paging failed");
                    return envelope.error(format!(
                        "Incomplete results. While paging results the following status code was returned: {}",
                        reason
                    ));
                }
            }
        }

        for document in &mut documents {
            for (from, to) in PROPERTY_MAPPING {
                if let Some(value) = document.remove(*from) {
                    document.insert(to.to_string(), value);
                }
            }
        }
        debug!(term, documents = documents.len(), "xDD snippets collected");
        envelope.succeed(format!("Documents found: {}", documents.len()), documents)
    }
}

impl Default for XddClient {
    fn default() -> Self {
        Self::new()
    }
}
