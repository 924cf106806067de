//! ITIS Solr documents and their packaged form

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields of an ITIS Solr document that are not worth caching
const DROPPED_FIELDS: &[&str] = &[
    "_version_",
    "credibilityRating",
    "expert",
    "geographicDivision",
    "hierarchicalSort",
    "hierarchyTSN",
    "jurisdiction",
    "publication",
    "rankID",
    "otherSource",
    "taxonAuthor",
    "comment",
];

/// Usage values that mark a record as not accepted for use
const NOT_ACCEPTED: &[&str] = &["invalid", "not accepted"];

/// Solr search response from services.itis.gov
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SolrResponse {
    pub(crate) response: SolrResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SolrResult {
    pub(crate) num_found: u64,
    #[serde(default)]
    pub(crate) docs: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankName {
    pub rank: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonName {
    pub name: String,
    pub language: String,
}

/// ITIS record cleaned up for caching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItisRecord {
    pub cache_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsn: Option<String>,
    #[serde(rename = "nameWInd", skip_serializing_if = "Option::is_none")]
    pub name_with_indicator: Option<String>,
    #[serde(rename = "nameWOInd", skip_serializing_if = "Option::is_none")]
    pub name_without_indicator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
    #[serde(rename = "acceptedTSN", default, skip_serializing_if = "Vec::is_empty")]
    pub accepted_tsn: Vec<String>,
    #[serde(default)]
    pub taxonomy: Vec<RankName>,
    #[serde(default)]
    pub hierarchy: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commonnames: Vec<CommonName>,
    /// Remaining ITIS fields, kept as returned
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ItisRecord {
    /// Package a raw ITIS Solr document
    pub fn from_doc(mut doc: Map<String, Value>) -> Self {
        for key in DROPPED_FIELDS {
            doc.remove(*key);
        }

        let taxonomy = first_string(doc.remove("hierarchySoFarWRanks"))
            .map(|s| parse_ranked_hierarchy(&s))
            .unwrap_or_default();
        let hierarchy = first_string(doc.remove("hierarchySoFar"))
            .map(|s| parse_hierarchy(&s))
            .unwrap_or_default();
        let commonnames = match doc.remove("vernacular") {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(Value::as_str)
                .filter_map(parse_vernacular)
                .collect(),
            _ => Vec::new(),
        };

        Self {
            cache_date: Utc::now(),
            tsn: take_string(&mut doc, "tsn"),
            name_with_indicator: take_string(&mut doc, "nameWInd"),
            name_without_indicator: take_string(&mut doc, "nameWOInd"),
            usage: take_string(&mut doc, "usage"),
            rank: take_string(&mut doc, "rank"),
            accepted_tsn: match doc.remove("acceptedTSN") {
                Some(Value::Array(values)) => values.iter().filter_map(value_as_string).collect(),
                Some(other) => value_as_string(&other).into_iter().collect(),
                None => Vec::new(),
            },
            taxonomy,
            hierarchy,
            commonnames,
            other: doc,
        }
    }

    /// Whether ITIS considers this record usable as-is
    pub fn is_accepted(&self) -> bool {
        !matches!(self.usage.as_deref(), Some(u) if NOT_ACCEPTED.contains(&u))
    }
}

/// Accepted TSN referenced by a raw document, if any
pub(crate) fn doc_accepted_tsn(doc: &Map<String, Value>) -> Option<String> {
    match doc.get("acceptedTSN")? {
        Value::Array(values) => values.first().and_then(value_as_string),
        other => value_as_string(other),
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn take_string(doc: &mut Map<String, Value>, key: &str) -> Option<String> {
    doc.remove(key).as_ref().and_then(value_as_string)
}

fn first_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Array(values) => values.first().and_then(Value::as_str).map(str::to_string),
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// Parse `"202422:$Kingdom:Plantae$...$Species:Quercus alba$"`
fn parse_ranked_hierarchy(s: &str) -> Vec<RankName> {
    let Some(idx) = s.find(":$") else {
        return Vec::new();
    };
    let body = &s[idx + 2..];
    let body = body.strip_suffix('$').unwrap_or(body);
    body.split('$')
        .filter_map(|part| part.split_once(':'))
        .map(|(rank, name)| RankName {
            rank: rank.to_string(),
            name: name.to_string(),
        })
        .collect()
}

/// Parse `"202422:$Plantae$...$Quercus alba$"`
fn parse_hierarchy(s: &str) -> Vec<String> {
    let Some((_, body)) = s.split_once(':') else {
        return Vec::new();
    };
    let body = body.strip_prefix('$').unwrap_or(body);
    let body = body.strip_suffix('$').unwrap_or(body);
    if body.is_empty() {
        return Vec::new();
    }
    body.split('$').map(str::to_string).collect()
}

/// Parse `"$white oak$English$N$19827$2012-12-21 00:00:00$"`
fn parse_vernacular(s: &str) -> Option<CommonName> {
    let mut parts = s.split('$').skip(1);
    let name = parts.next()?.to_string();
    let language = parts.next()?.to_string();
    Some(CommonName { name, language })
}
