//! GAP species habitat and range documents
//!
//! GAP habitat maps live as items in a ScienceBase collection, one per species.
//! A species document is assembled from the habitat map item, the range map
//! item it links to, the range features served by the ScienceBase GeoServer and
//! two JSON files attached to the habitat item.

use crate::client::ScienceBaseClient;
use crate::types::{
    BoundingBox, GapSpecies, HabitatMapItem, ItemsPage, SpeciesMetricsReport, StateExtent,
    TitledLink,
};
use bis_core::http::{get_json, get_text, trim_base};
use bis_core::{Envelope, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Envelope returned by [`GapClient::gap_species_search`]
pub type GapEnvelope = Envelope<GapSpecies>;

/// ScienceBase collection holding the GAP species habitat maps
pub const GAP_SPECIES_COLLECTION: &str = "527d0a83e4b0850ea0518326";

const HABITAT_ITEM_FIELDS: &str = "identifiers,files,webLinks,distributionLinks,dates";
const RANGE_LAYER: &str = "CONUS_Range_2001v1:Species_CONUS_Range_2001v1";
const WMS_LINK_TITLE: &str = "External WMS Service";

#[derive(Debug, Deserialize)]
struct MetricsResponse {
    #[serde(default)]
    result: Vec<Value>,
}

pub struct GapClient {
    sciencebase: ScienceBaseClient,
    bis_api_url: String,
}

impl GapClient {
    pub const DEFAULT_BIS_API_URL: &'static str = "https://api.sciencebase.gov/bis-api/api/v1";

    pub fn new() -> Self {
        Self::with_base_urls(ScienceBaseClient::DEFAULT_BASE_URL, Self::DEFAULT_BIS_API_URL)
    }

    pub fn with_base_urls(sciencebase_url: &str, bis_api_url: &str) -> Self {
        Self {
            sciencebase: ScienceBaseClient::with_base_url(sciencebase_url),
            bis_api_url: trim_base(bis_api_url),
        }
    }

    /// Catalog search for the habitat map item carrying `scientific_name` as an identifier
    pub fn species_search_url(&self, scientific_name: &str) -> String {
        let identifier = serde_json::json!({ "key": scientific_name }).to_string();
        let filter = format!("itemIdentifier={}", identifier);
        self.sciencebase.items_url(&[
            ("parentId", GAP_SPECIES_COLLECTION),
            ("fields", HABITAT_ITEM_FIELDS),
            ("filter", &filter),
        ])
    }

    /// WFS request for a species' range features, in EPSG:4326
    pub fn range_features_url(&self, species_code: &str) -> String {
        let cql = format!("SppCode='{}'", species_code);
        format!(
            "{}/geoserver/CONUS_Range_2001v1/ows?service=WFS&version=1.0.0&request=GetFeature&typeName={}&outputFormat=json&srsName=EPSG:4326&CQL_FILTER={}",
            self.sciencebase.base_url,
            RANGE_LAYER,
            urlencoding::encode(&cql)
        )
    }

    pub fn state_metrics_url(&self, fips_code: &str) -> String {
        format!(
            "{}/gapmetrics/species/protection?feature_id=US_States_and_Territories%3Astate_fipscode%3A{}",
            self.bis_api_url,
            urlencoding::encode(fips_code)
        )
    }

    /// Find a GAP species by scientific name and assemble its document.
    ///
    /// Only a search returning exactly one habitat map item counts as a match.
    pub async fn gap_species_search(
        &self,
        scientific_name: &str,
        name_source: Option<&str>,
    ) -> GapEnvelope {
        let mut envelope =
            Envelope::not_matched().with_parameter("Scientific Name", scientific_name);
        if let Some(source) = name_source {
            envelope = envelope.with_parameter("Name Source", source);
        }

        let url = self.species_search_url(scientific_name);
        envelope.record_call("Habitat Map Search", &url);
        let page: ItemsPage = match self.sciencebase.get_page(&url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(scientific_name, error = %e, "GAP species search failed");
                return envelope.error(e.to_string());
            }
        };
        if page.total != 1 || page.items.len() != 1 {
            debug!(scientific_name, total = page.total, "GAP species not matched");
            return envelope;
        }

        let Some(item) = page.items.into_iter().next() else {
            return envelope;
        };
        let species = match serde_json::from_value::<HabitatMapItem>(item) {
            Ok(item) => package_habitat_item(item),
            Err(e) => return envelope.error(e.to_string()),
        };
        match self.package_gap_species(species, &mut envelope).await {
            Ok(species) => envelope.succeed("Exact Match", species),
            Err(e) => {
                warn!(scientific_name, error = %e, "GAP species packaging failed");
                envelope.error(e.to_string())
            }
        }
    }

    /// Add range map details and the attached JSON documents
    async fn package_gap_species(
        &self,
        mut species: GapSpecies,
        envelope: &mut GapEnvelope,
    ) -> Result<GapSpecies> {
        if let Some(range_item) = species.range_map_item.clone() {
            let url = format!("{}?format=json&fields=distributionLinks", range_item);
            envelope.record_call("Range Map Item", &url);
            let item: HabitatMapItem = serde_json::from_value(get_json(&self.sciencebase.http, &url).await?)?;
            species.range_map_wms = find_link(&item.distribution_links, WMS_LINK_TITLE);
        }

        if let Some(code) = species.species_code().map(str::to_string) {
            let url = self.range_features_url(&code);
            envelope.record_call("Range Features", &url);
            species.range_bbox = self.range_bbox(&url).await?;
        }

        if let Some(url) = species.database_parameters_url.clone() {
            envelope.record_call("Database Parameters", &url);
            species.database_parameters = Some(self.fetch_json_file(&url).await?);
        }

        if let Some(url) = species.itis_information_url.clone() {
            envelope.record_call("ITIS Information", &url);
            species.itis_information = Some(self.fetch_json_file(&url).await?);
        }

        Ok(species)
    }

    /// Files are served without a JSON content type, so parse the text
    async fn fetch_json_file(&self, url: &str) -> Result<Value> {
        let body = get_text(&self.sciencebase.http, url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn range_bbox(&self, url: &str) -> Result<Option<BoundingBox>> {
        let collection = get_json(&self.sciencebase.http, url).await?;
        Ok(BoundingBox::from_geojson(&collection))
    }

    /// Total bounding box of every seasonal range feature for a species
    pub async fn gap_species_range_bbox(&self, species_code: &str) -> Result<Option<BoundingBox>> {
        self.range_bbox(&self.range_features_url(species_code)).await
    }

    /// Protection metrics for a species in each state whose extent meets its range
    pub async fn gap_metrics_species(
        &self,
        states: &[StateExtent],
        species_code: &str,
        range_bbox: &BoundingBox,
    ) -> Result<SpeciesMetricsReport> {
        let mut report = SpeciesMetricsReport {
            gap_species_code: species_code.to_string(),
            state_metrics: Vec::new(),
        };

        for state in states.iter().filter(|s| s.bbox.intersects(range_bbox)) {
            let url = self.state_metrics_url(&state.fips_code);
            let body = get_text(&self.sciencebase.http, &url).await?;
            let metrics: MetricsResponse = serde_json::from_str(&body)?;
            report.state_metrics.extend(
                metrics
                    .result
                    .into_iter()
                    .filter(|m| m["sppcode"].as_str() == Some(species_code)),
            );
        }

        debug!(species_code, rows = report.state_metrics.len(), "GAP state metrics");
        Ok(report)
    }
}

impl Default for GapClient {
    fn default() -> Self {
        Self::new()
    }
}

fn find_link(links: &[TitledLink], title: &str) -> Option<String> {
    links
        .iter()
        .find(|l| l.title.as_deref() == Some(title))
        .and_then(|l| l.uri.clone())
}

fn package_habitat_item(item: HabitatMapItem) -> GapSpecies {
    let file = |title: &str| item.files.iter().find(|f| f.title.as_deref() == Some(title));

    GapSpecies {
        habitat_map_item: item.link.as_ref().map(|l| l.url.clone()),
        range_map_item: item
            .web_links
            .iter()
            .find(|l| l.title.as_deref().is_some_and(|t| t.contains("Range Map")))
            .and_then(|l| l.uri.clone()),
        habitat_map_wms: find_link(&item.distribution_links, WMS_LINK_TITLE),
        database_parameters_url: file("Machine Readable Habitat Database Parameters")
            .and_then(|f| f.url.clone()),
        itis_information_url: file("ITIS Information").and_then(|f| f.url.clone()),
        habitat_map_file_size: file("Habitat Map Raster Data").and_then(|f| f.size),
        habitat_map_last_updated: item
            .dates
            .iter()
            .find(|d| d.date_type.as_deref() == Some("lastUpdated"))
            .and_then(|d| d.date_string.clone()),
        identifiers: item
            .identifiers
            .iter()
            .filter_map(|i| Some((i.identifier_type.clone()?, i.key.clone()?)))
            .collect(),
        ..GapSpecies::default()
    }
}
