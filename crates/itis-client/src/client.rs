//! ITIS Solr search client and name resolution

use crate::types::{doc_accepted_tsn, ItisRecord, SolrResponse};
use bis_core::http::{get_json, http_client, trim_base, DEFAULT_USER_AGENT};
use bis_core::{BisError, Envelope};
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Envelope returned by ITIS resolution
pub type ItisEnvelope = Envelope<Vec<ItisRecord>>;

const FUZZY_LEVEL: &str = "~0.8";
const VALID_ACCEPTED_FILTER: &str = "%20AND%20(usage:accepted%20OR%20usage:valid)";

/// Client for the ITIS Solr service
pub struct ItisClient {
    http: Client,
    base_url: String,
}

impl ItisClient {
    pub const DEFAULT_BASE_URL: &'static str = "http://services.itis.gov";

    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: http_client(DEFAULT_USER_AGENT),
            base_url: trim_base(base_url),
        }
    }

    /// Build a Solr query URL for a name or TSN.
    ///
    /// The term is percent-encoded, with spaces sent as an escaped `\ `
    /// (`%5C%20`) as the Solr name fields require.
    ///
    /// Names carrying `var.`, `ssp.` or a hybrid ` x ` are matched against the
    /// indicator-bearing name field; all-digit terms are treated as TSNs.
    pub fn search_url(&self, term: &str, fuzzy: bool, valid_accepted: bool) -> String {
        let has_indicator = ["var.", "ssp.", " x "]
            .iter()
            .any(|marker| term.find(marker).is_some_and(|idx| idx > 0));

        let field = if term.trim().parse::<u64>().is_ok() {
            "tsn"
        } else if has_indicator {
            "nameWInd"
        } else {
            "nameWOInd"
        };

        let mut url = format!(
            "{}/?wt=json&rows=10&q={}:{}",
            self.base_url,
            field,
            urlencoding::encode(term.trim()).replace("%20", "%5C%20")
        );
        if fuzzy {
            url.push_str(FUZZY_LEVEL);
        }
        if valid_accepted {
            url.push_str(VALID_ACCEPTED_FILTER);
        }
        url
    }

    async fn query(&self, url: &str) -> bis_core::Result<SolrResponse> {
        let value = get_json(&self.http, url).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Resolve a scientific name to ITIS records.
    ///
    /// Tries an exact name match first and falls back to a fuzzy match. A
    /// discovered record that is not accepted is followed to its accepted TSN;
    /// both records are returned, accepted first. When an exact search returns
    /// several records, the accepted TSN is followed only if they all point to
    /// the same one.
    pub async fn search(&self, scientific_name: &str) -> ItisEnvelope {
        let mut envelope =
            Envelope::not_matched().with_parameter("Scientific Name", scientific_name);

        let exact_url = self.search_url(scientific_name, false, false);
        let exact = match self.query(&exact_url).await {
            Ok(r) => r,
            Err(e) => return hard_fail(envelope, &exact_url, e),
        };

        match exact.response.num_found {
            0 => {
                envelope.record_call("Exact Match Fail", &exact_url);

                let fuzzy_url = self.search_url(scientific_name, true, false);
                let fuzzy = match self.query(&fuzzy_url).await {
                    Ok(r) => r,
                    Err(e) => return hard_fail(envelope, &fuzzy_url, e),
                };

                match fuzzy.response.docs.into_iter().next() {
                    Some(doc) if fuzzy.response.num_found > 0 => {
                        self.resolve_discovered(envelope, "Fuzzy Match", &fuzzy_url, doc)
                            .await
                    }
                    _ => {
                        envelope.record_call("Fuzzy Match Fail", &fuzzy_url);
                        envelope
                    }
                }
            }
            1 => match exact.response.docs.into_iter().next() {
                Some(doc) => {
                    self.resolve_discovered(envelope, "Exact Match", &exact_url, doc)
                        .await
                }
                None => {
                    envelope.record_call("Exact Match Fail", &exact_url);
                    envelope
                }
            },
            _ => {
                self.resolve_multiple(envelope, &exact_url, exact.response.docs)
                    .await
            }
        }
    }

    /// Package a single discovered record, following its accepted TSN if needed
    async fn resolve_discovered(
        &self,
        mut envelope: ItisEnvelope,
        step: &str,
        url: &str,
        doc: Map<String, Value>,
    ) -> ItisEnvelope {
        envelope.record_call(step, url);
        let discovered = ItisRecord::from_doc(doc);

        let accepted_tsn = match discovered.accepted_tsn.first() {
            Some(tsn) if !discovered.is_accepted() => tsn.clone(),
            _ => return envelope.succeed(step, vec![discovered]),
        };

        let tsn_url = self.search_url(&accepted_tsn, false, false);
        match self.query(&tsn_url).await {
            Ok(r) => {
                envelope.record_call("TSN Search", &tsn_url);
                match r.response.docs.into_iter().next() {
                    Some(accepted) => {
                        debug!(tsn = %accepted_tsn, "Followed accepted TSN");
                        envelope.succeed(
                            "Followed Accepted TSN",
                            vec![ItisRecord::from_doc(accepted), discovered],
                        )
                    }
                    None => envelope.fail("Accepted TSN Not Found"),
                }
            }
            Err(e) => hard_fail(envelope, &tsn_url, e),
        }
    }

    /// Several exact matches: follow the accepted TSN only if it is unambiguous
    async fn resolve_multiple(
        &self,
        mut envelope: ItisEnvelope,
        url: &str,
        docs: Vec<Map<String, Value>>,
    ) -> ItisEnvelope {
        envelope.record_call("Multi Match", url);

        let mut accepted_tsns: Vec<String> = Vec::new();
        for tsn in docs.iter().filter_map(doc_accepted_tsn) {
            if !accepted_tsns.contains(&tsn) {
                accepted_tsns.push(tsn);
            }
        }

        if accepted_tsns.len() != 1 {
            return envelope.fail("Indeterminate Results");
        }

        let tsn_url = self.search_url(&accepted_tsns[0], false, true);
        match self.query(&tsn_url).await {
            Ok(r) => {
                envelope.record_call("TSN Search", &tsn_url);
                match r.response.docs.into_iter().next() {
                    Some(accepted) => envelope
                        .succeed("Followed Accepted TSN", vec![ItisRecord::from_doc(accepted)]),
                    None => envelope.fail("Accepted TSN Not Found"),
                }
            }
            Err(e) => hard_fail(envelope, &tsn_url, e),
        }
    }
}

impl Default for ItisClient {
    fn default() -> Self {
        Self::new()
    }
}

fn hard_fail(mut envelope: ItisEnvelope, url: &str, error: BisError) -> ItisEnvelope {
    warn!(url, error = %error, "ITIS query failed");
    envelope.record_call("Hard Fail Query", url);
    envelope.error("Hard Fail Query")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bis_core::Status;
    use serde_json::json;
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    /// Matches requests whose full URL contains one string and not another
    struct UrlMatch {
        contains: &'static str,
        excludes: Option<&'static str>,
    }

    impl Match for UrlMatch {
        fn matches(&self, request: &Request) -> bool {
            let url = request.url.as_str();
            url.contains(self.contains) && self.excludes.map_or(true, |e| !url.contains(e))
        }
    }

    fn url_has(contains: &'static str) -> UrlMatch {
        UrlMatch { contains, excludes: None }
    }

    fn url_has_not(contains: &'static str, excludes: &'static str) -> UrlMatch {
        UrlMatch { contains, excludes: Some(excludes) }
    }

    fn solr(docs: Value) -> ResponseTemplate {
        let num_found = docs.as_array().map(Vec::len).unwrap_or(0);
        ResponseTemplate::new(200).set_body_json(json!({
            "response": {"numFound": num_found, "docs": docs}
        }))
    }

    fn doc(tsn: &str, name: &str, usage: &str, accepted: Option<&str>) -> Value {
        let mut d = json!({
            "tsn": tsn,
            "nameWOInd": name,
            "usage": usage,
            "rank": "Species",
            "hierarchySoFarWRanks": [format!("{}:$Kingdom:Animalia$Species:{}$", tsn, name)],
            "hierarchySoFar": [format!("{}:$Animalia${}$", tsn, name)]
        });
        if let Some(a) = accepted {
            d["acceptedTSN"] = json!([a]);
        }
        d
    }

    fn steps(envelope: &ItisEnvelope) -> Vec<String> {
        envelope
            .processing_metadata
            .api
            .iter()
            .map(|c| c.step.clone())
            .collect()
    }

    #[test]
    fn test_search_url_fields() {
        let client = ItisClient::new();
        assert_eq!(
            client.search_url("Puma concolor", false, false),
            "http://services.itis.gov/?wt=json&rows=10&q=nameWOInd:Puma%5C%20concolor"
        );
        assert!(client
            .search_url("Quercus alba var. latiloba", false, false)
            .contains("q=nameWInd:"));
        assert!(client.search_url("180703", false, false).contains("q=tsn:180703"));
        assert!(client.search_url("Puma", true, false).ends_with("Puma~0.8"));
        assert!(client
            .search_url("180703", false, true)
            .ends_with("%20AND%20(usage:accepted%20OR%20usage:valid)"));
    }

    #[test]
    fn test_search_url_encodes_reserved_characters() {
        let client = ItisClient::new();
        assert_eq!(
            client.search_url("Aus & bus#1+x", false, false),
            "http://services.itis.gov/?wt=json&rows=10&q=nameWOInd:Aus%5C%20%26%5C%20bus%231%2Bx"
        );
    }

    #[tokio::test]
    async fn test_exact_match_accepted() {
        let server = MockServer::start().await;
        Mock::given(url_has_not("nameWOInd:Puma", "~0.8"))
            .respond_with(solr(json!([doc("180703", "Puma concolor", "valid", None)])))
            .mount(&server)
            .await;

        let client = ItisClient::with_base_url(&server.uri());
        let envelope = client.search("Puma concolor").await;

        assert_eq!(envelope.status(), Status::Success);
        assert_eq!(envelope.status_message(), Some("Exact Match"));
        let data = envelope.data.as_ref().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].taxonomy[1].name, "Puma concolor");
        assert_eq!(steps(&envelope), vec!["Exact Match"]);
    }

    #[tokio::test]
    async fn test_exact_match_follows_accepted_tsn() {
        let server = MockServer::start().await;
        Mock::given(url_has_not("nameWOInd:Felis", "~0.8"))
            .respond_with(solr(json!([doc(
                "552478",
                "Felis concolor",
                "invalid",
                Some("552479")
            )])))
            .mount(&server)
            .await;
        Mock::given(url_has("tsn:552479"))
            .respond_with(solr(json!([doc("552479", "Puma concolor", "valid", None)])))
            .mount(&server)
            .await;

        let client = ItisClient::with_base_url(&server.uri());
        let envelope = client.search("Felis concolor").await;

        assert_eq!(envelope.status(), Status::Success);
        assert_eq!(envelope.status_message(), Some("Followed Accepted TSN"));
        let data = envelope.data.as_ref().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].tsn.as_deref(), Some("552479"));
        assert_eq!(data[1].tsn.as_deref(), Some("552478"));
        assert_eq!(steps(&envelope), vec!["Exact Match", "TSN Search"]);
    }

    #[tokio::test]
    async fn test_accepted_tsn_not_found() {
        let server = MockServer::start().await;
        Mock::given(url_has_not("nameWOInd:Felis", "~0.8"))
            .respond_with(solr(json!([doc(
                "552478",
                "Felis concolor",
                "invalid",
                Some("552479")
            )])))
            .mount(&server)
            .await;
        Mock::given(url_has("tsn:552479"))
            .respond_with(solr(json!([])))
            .mount(&server)
            .await;

        let client = ItisClient::with_base_url(&server.uri());
        let envelope = client.search("Felis concolor").await;

        assert_eq!(envelope.status(), Status::Failure);
        assert_eq!(envelope.status_message(), Some("Accepted TSN Not Found"));
        assert!(envelope.data.is_none());
        assert_eq!(steps(&envelope), vec!["Exact Match", "TSN Search"]);
    }

    #[tokio::test]
    async fn test_fuzzy_fallback() {
        let server = MockServer::start().await;
        Mock::given(url_has_not("nameWOInd:Puma", "~0.8"))
            .respond_with(solr(json!([])))
            .mount(&server)
            .await;
        Mock::given(url_has("~0.8"))
            .respond_with(solr(json!([doc("180703", "Puma concolor", "valid", None)])))
            .mount(&server)
            .await;

        let client = ItisClient::with_base_url(&server.uri());
        let envelope = client.search("Puma concolr").await;

        assert_eq!(envelope.status(), Status::Success);
        assert_eq!(envelope.status_message(), Some("Fuzzy Match"));
        assert_eq!(steps(&envelope), vec!["Exact Match Fail", "Fuzzy Match"]);
    }

    #[tokio::test]
    async fn test_no_match() {
        let server = MockServer::start().await;
        Mock::given(url_has("nameWOInd:"))
            .respond_with(solr(json!([])))
            .mount(&server)
            .await;

        let client = ItisClient::with_base_url(&server.uri());
        let envelope = client.search("Nonexistent thing").await;

        assert_eq!(envelope.status(), Status::Failure);
        assert_eq!(envelope.status_message(), Some("Not Matched"));
        assert!(envelope.data.is_none());
        assert_eq!(steps(&envelope), vec!["Exact Match Fail", "Fuzzy Match Fail"]);
    }

    #[tokio::test]
    async fn test_multiple_matches_single_accepted_tsn() {
        let server = MockServer::start().await;
        Mock::given(url_has_not("nameWOInd:Aus", "usage:accepted"))
            .respond_with(solr(json!([
                doc("1", "Aus bus", "invalid", Some("3")),
                doc("2", "Aus bus", "not accepted", Some("3"))
            ])))
            .mount(&server)
            .await;
        Mock::given(url_has("tsn:3"))
            .respond_with(solr(json!([doc("3", "Aus cus", "valid", None)])))
            .mount(&server)
            .await;

        let client = ItisClient::with_base_url(&server.uri());
        let envelope = client.search("Aus bus").await;

        assert_eq!(envelope.status_message(), Some("Followed Accepted TSN"));
        assert_eq!(envelope.data.as_ref().unwrap().len(), 1);
        assert_eq!(steps(&envelope), vec!["Multi Match", "TSN Search"]);
    }

    #[tokio::test]
    async fn test_multiple_matches_indeterminate() {
        let server = MockServer::start().await;
        Mock::given(url_has("nameWOInd:Aus"))
            .respond_with(solr(json!([
                doc("1", "Aus bus", "invalid", Some("3")),
                doc("2", "Aus bus", "invalid", Some("4"))
            ])))
            .mount(&server)
            .await;

        let client = ItisClient::with_base_url(&server.uri());
        let envelope = client.search("Aus bus").await;

        assert_eq!(envelope.status(), Status::Failure);
        assert_eq!(envelope.status_message(), Some("Indeterminate Results"));
    }

    #[tokio::test]
    async fn test_hard_fail_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(url_has("q="))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ItisClient::with_base_url(&server.uri());
        let envelope = client.search("Puma concolor").await;

        assert_eq!(envelope.status(), Status::Error);
        assert_eq!(envelope.status_message(), Some("Hard Fail Query"));
        assert_eq!(steps(&envelope), vec!["Hard Fail Query"]);
    }
}
