//! ECOS species profile scraping
//!
//! Profile pages carry a taxonomy block linking to ITIS and a series of
//! captioned tables. Only tables whose caption and header columns match one of
//! [`PROFILE_TABLES`] are extracted; each becomes a list of row records keyed by
//! column name.

use bis_core::http::{get_text, http_client, trim_base, DEFAULT_USER_AGENT};
use bis_core::{integrate_recordset, BisError, Envelope, Result, Status};
use lazy_static::lazy_static;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

/// Envelope returned by profile scraping
pub type EcosEnvelope = Envelope<Map<String, Value>>;

/// A profile table worth extracting
#[derive(Debug, Clone, Copy)]
pub struct ProfileTable {
    pub name: &'static str,
    pub properties: &'static [&'static str],
}

pub const PROFILE_TABLES: &[ProfileTable] = &[
    ProfileTable {
        name: LISTING_STATUS_TABLE,
        properties: &["Status", "Date Listed", "Lead Region", "Where Listed"],
    },
    ProfileTable {
        name: "Federal Register Documents",
        properties: &["Date", "Citation Page", "Title"],
    },
    ProfileTable {
        name: "Special Rule Publications",
        properties: &["Date", "Citation Page", "Title"],
    },
    ProfileTable {
        name: "Current Recovery Plan(s)",
        properties: &["Date", "Title", "Plan Action Status", "Plan Status"],
    },
    ProfileTable {
        name: "Other Recovery Documents",
        properties: &["Date", "Citation Page", "Title", "Document Type"],
    },
    ProfileTable {
        name: "Five Year Review",
        properties: &["Date", "Title"],
    },
    ProfileTable {
        name: "Habitat Conservation Plans (HCP)",
        properties: &["HCP Plan Summaries"],
    },
];

const LISTING_STATUS_TABLE: &str = "Current Listing Status Summary";
const TITLE_PREFIX: &str = "Species Profile for";

lazy_static! {
    static ref TITLE: Selector = selector("title");
    static ref DIV_OR_LINK: Selector = selector("div, a");
    static ref CAPTION_OR_TABLE: Selector = selector("div.table-caption, table");
    static ref THEAD: Selector = selector("thead");
    static ref TBODY: Selector = selector("tbody");
    static ref ROW: Selector = selector("tr");
    static ref HEADER_CELL: Selector = selector("th");
    static ref CELL: Selector = selector("td");
    static ref LINK: Selector = selector("a");
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

pub struct EcosClient {
    http: Client,
    base_url: String,
}

impl EcosClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://ecos.fws.gov";

    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    /// Client that only scrapes pages on the scheme, host and port of `base_url`
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: http_client(DEFAULT_USER_AGENT),
            base_url: trim_base(base_url),
        }
    }

    /// Check that a profile URL points at the ECOS site this client serves
    pub fn check_profile_url(&self, profile_url: &str) -> Result<Url> {
        let rejected = || {
            BisError::InvalidInput(format!(
                "profile URL must be on {}: {}",
                self.base_url, profile_url
            ))
        };
        let base = Url::parse(&self.base_url).map_err(|_| rejected())?;
        let url = Url::parse(profile_url).map_err(|_| rejected())?;

        let same_origin = url.scheme() == base.scheme()
            && url.host_str().is_some()
            && url.host_str() == base.host_str()
            && url.port_or_known_default() == base.port_or_known_default();
        if !same_origin {
            return Err(rejected());
        }
        Ok(url)
    }

    /// Fetch and scrape one species profile page
    pub async fn scrape_profile(&self, profile_url: &str) -> EcosEnvelope {
        let mut envelope = Envelope::new(Status::Error).with_parameter("Profile URL", profile_url);
        if let Err(e) = self.check_profile_url(profile_url) {
            warn!(url = profile_url, error = %e, "ECOS profile URL rejected");
            return envelope.error(e.to_string());
        }
        envelope.record_call("Species Profile", profile_url);

        let scraped = match get_text(&self.http, profile_url).await {
            Ok(html) => parse_profile(&html, profile_url),
            Err(e) => Err(e),
        };
        match scraped {
            Ok(profile) => {
                debug!(url = profile_url, tables = profile.len(), "ECOS profile scraped");
                envelope.succeed("Profile Scraped", profile)
            }
            Err(e) => {
                warn!(url = profile_url, error = %e, "ECOS profile scrape failed");
                envelope.error(e.to_string())
            }
        }
    }
}

impl Default for EcosClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the profile record from a page's HTML.
///
/// Relative document links are resolved against `page_url`.
pub fn parse_profile(html: &str, page_url: &str) -> Result<Map<String, Value>> {
    let base = Url::parse(page_url)
        .map_err(|e| BisError::InvalidInput(format!("profile URL {}: {}", page_url, e)))?;
    let document = Html::parse_document(html);

    let mut profile = Map::new();
    profile.insert(
        "ITIS TSN".to_string(),
        itis_tsn(&document).map_or(Value::Null, Value::String),
    );

    let title = document.select(&TITLE).next().map(element_text);
    let (scientific_name, common_name) = match title {
        Some(title) => split_title(&title),
        None => (None, None),
    };
    profile.insert("Scientific Name".to_string(), scientific_name.into());
    profile.insert("Common Name".to_string(), common_name.into());

    let mut caption: Option<String> = None;
    for element in document.select(&CAPTION_OR_TABLE) {
        if element.value().name() != "table" {
            caption = Some(element_text(element).replace("(learn more)", "").trim().to_string());
            continue;
        }
        let Some(name) = caption.take() else {
            continue;
        };
        if let Some(rows) = read_table(&name, element, &base) {
            profile.insert(name, Value::Array(rows));
        }
    }

    let integrated = integrate_recordset(Value::Object(profile), Some(&["itis_tsn"]))?;
    match integrated.into_iter().next() {
        Some(Value::Object(profile)) => Ok(profile),
        _ => Ok(Map::new()),
    }
}

/// TSN from the first link after the taxonomy block
fn itis_tsn(document: &Html) -> Option<String> {
    let mut elements = document.select(&DIV_OR_LINK);
    elements.find(|el| {
        let value = el.value();
        value.name() == "div"
            && value.classes().any(|c| c == "taxonomy")
            && value.classes().any(|c| c == "new-row")
    })?;
    elements.find(|el| el.value().name() == "div")?;
    let link = elements.find(|el| el.value().name() == "a")?;
    let tsn = link.value().attr("href")?.rsplit('=').next()?;
    (!tsn.is_empty()).then(|| tsn.to_string())
}

/// Split `Species Profile for Common Name (Scientific name)`
fn split_title(title: &str) -> (Option<String>, Option<String>) {
    let title = title.trim();
    match title.find('(') {
        Some(idx) if idx > 0 => {
            let end = title.rfind(')').filter(|&end| end > idx).unwrap_or(title.len());
            let scientific = title[idx + 1..end].trim();
            let common = title[..idx].replace(TITLE_PREFIX, "");
            (Some(scientific.to_string()), Some(common.trim().to_string()))
        }
        _ => (Some(title.replace(TITLE_PREFIX, "").trim().to_string()), None),
    }
}

fn read_table(caption: &str, table: ElementRef<'_>, base: &Url) -> Option<Vec<Value>> {
    let header = table.select(&THEAD).next()?;
    let properties: Vec<String> = header
        .select(&ROW)
        .next()
        .map(|row| row.select(&HEADER_CELL).map(element_text).collect())
        .unwrap_or_default();

    PROFILE_TABLES.iter().find(|t| {
        t.name == caption
            && t.properties.len() == properties.len()
            && t.properties.iter().zip(&properties).all(|(a, b)| *a == b.as_str())
    })?;

    let body = table.select(&TBODY).next()?;
    let rows = body
        .select(&ROW)
        .map(|row| {
            let mut record = Map::new();
            for (cell, property) in row.select(&CELL).zip(&properties) {
                let text = element_text(cell);
                let value = if caption == LISTING_STATUS_TABLE && property == "Status" {
                    js_argument(&text).to_string()
                } else {
                    text
                };
                record.insert(property.clone(), Value::String(value));

                if let Some(href) = cell.select(&LINK).next().and_then(|a| a.value().attr("href")) {
                    record.insert("document_link".to_string(), Value::String(resolve_link(base, href)));
                }
            }
            Value::Object(record)
        })
        .collect();
    Some(rows)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text between the first and last double quote, as in `show("Endangered")`
fn js_argument(s: &str) -> &str {
    match (s.find('"'), s.rfind('"')) {
        (Some(start), Some(end)) if end > start => &s[start + 1..end],
        _ => s,
    }
}

fn resolve_link(base: &Url, href: &str) -> String {
    match Url::parse(href) {
        Ok(_) => href.to_string(),
        Err(_) => base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string()),
    }
}
