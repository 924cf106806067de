//! TESS XQuery species search

use bis_core::http::{get_text, http_client, trim_base, DEFAULT_USER_AGENT};
use bis_core::{xml_to_json, Envelope, Status};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

/// Envelope returned by TESS searches; data is the `results` element
pub type TessEnvelope = Envelope<Value>;

pub struct TessClient {
    http: Client,
    base_url: String,
}

impl TessClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://ecos.fws.gov/ecp0";

    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: http_client(DEFAULT_USER_AGENT),
            base_url: trim_base(base_url),
        }
    }

    /// All-digit criteria select by TSN, anything else by scientific name
    pub fn search_url(&self, criteria: &str) -> String {
        let predicate = if is_tsn(criteria) {
            format!("TSN={}", criteria)
        } else {
            format!("SCINAME=\"{}\"", urlencoding::encode(criteria))
        };
        format!(
            "{}/TessQuery?request=query&xquery=/SPECIES_DETAIL[{}]",
            self.base_url, predicate
        )
    }

    pub async fn search(&self, criteria: &str) -> TessEnvelope {
        let parameter = if is_tsn(criteria) { "tsn" } else { "Scientific Name" };
        let mut envelope = Envelope::new(Status::Failure).with_parameter(parameter, criteria);
        envelope.processing_metadata.status_message = Some("Search failed".to_string());

        let url = self.search_url(criteria);
        envelope.record_call("Species Detail", &url);

        let parsed = match get_text(&self.http, &url).await {
            Ok(body) => xml_to_json(&body),
            Err(e) => Err(e),
        };
        let mut document = match parsed {
            Ok(document) => document,
            Err(e) => {
                warn!(url = %url, error = %e, "TESS query failed");
                return envelope.error(e.to_string());
            }
        };

        match document.get_mut("results").map(Value::take) {
            Some(results) if !results.is_null() => {
                debug!(criteria, "TESS species matched");
                envelope.succeed("Matched", results)
            }
            _ => envelope,
        }
    }
}

impl Default for TessClient {
    fn default() -> Self {
        Self::new()
    }
}

fn is_tsn(criteria: &str) -> bool {
    !criteria.is_empty() && criteria.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS: &str = r#"<results>
  <SPECIES_DETAIL>
    <COMNAME>Florida panther</COMNAME>
    <SCINAME>Puma (=Felis) concolor coryi</SCINAME>
    <STATUS>E</STATUS>
    <TSN>180704</TSN>
  </SPECIES_DETAIL>
</results>"#;

    #[test]
    fn test_search_urls() {
        let client = TessClient::new();
        assert_eq!(
            client.search_url("180704"),
            "https://ecos.fws.gov/ecp0/TessQuery?request=query&xquery=/SPECIES_DETAIL[TSN=180704]"
        );
        assert_eq!(
            client.search_url("Puma concolor"),
            "https://ecos.fws.gov/ecp0/TessQuery?request=query&xquery=/SPECIES_DETAIL[SCINAME=\"Puma%20concolor\"]"
        );
    }

    #[tokio::test]
    async fn test_search_by_tsn() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/TessQuery"))
            .and(query_param("xquery", "/SPECIES_DETAIL[TSN=180704]"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS))
            .mount(&server)
            .await;

        let client = TessClient::with_base_url(&server.uri());
        let envelope = client.search("180704").await;

        assert_eq!(envelope.status(), Status::Success);
        assert_eq!(envelope.parameters.get("tsn").map(String::as_str), Some("180704"));
        let data = envelope.data.unwrap();
        assert_eq!(data["SPECIES_DETAIL"]["STATUS"], "E");
    }

    #[tokio::test]
    async fn test_empty_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/TessQuery"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<results/>"))
            .mount(&server)
            .await;

        let client = TessClient::with_base_url(&server.uri());
        let envelope = client.search("Puma concolor").await;

        assert_eq!(envelope.status(), Status::Failure);
        assert_eq!(envelope.status_message(), Some("Search failed"));
        assert!(envelope.parameters.contains_key("Scientific Name"));
    }

    #[tokio::test]
    async fn test_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = TessClient::with_base_url(&server.uri());
        let envelope = client.search("180704").await;

        assert_eq!(envelope.status(), Status::Error);
        assert_eq!(envelope.status_message(), Some("HTTP Status Code: 500"));
    }
}
