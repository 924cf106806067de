//! Data types for GBIF API responses

use serde::{Deserialize, Serialize};

/// Result from GBIF v1 `/species/suggest` endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestResult {
    pub key: u64,
    pub nub_key: Option<u64>,
    pub parent_key: Option<u64>,
    pub scientific_name: Option<String>,
    pub canonical_name: Option<String>,
    pub rank: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub synonym: bool,
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub kingdom_key: Option<u64>,
    pub phylum_key: Option<u64>,
    pub class_key: Option<u64>,
    pub order_key: Option<u64>,
    pub family_key: Option<u64>,
    pub genus_key: Option<u64>,
    pub species_key: Option<u64>,
}

impl SuggestResult {
    /// Classification for every rank the backbone supplied a key for
    pub fn taxonomy(&self) -> Vec<RankName> {
        let ranks = [
            ("kingdom", &self.kingdom, self.kingdom_key),
            ("phylum", &self.phylum, self.phylum_key),
            ("class", &self.class, self.class_key),
            ("order", &self.order, self.order_key),
            ("family", &self.family, self.family_key),
            ("genus", &self.genus, self.genus_key),
            ("species", &self.species, self.species_key),
        ];
        ranks
            .into_iter()
            .filter_map(|(rank, name, key)| {
                key.map(|key| RankName {
                    rank: rank.to_string(),
                    name: name.clone(),
                    key,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankName {
    pub rank: String,
    pub name: Option<String>,
    pub key: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub field: String,
    #[serde(default)]
    pub counts: Vec<FacetCount>,
}

/// Occurrence search response with the paging fields left out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceSummary {
    pub count: u64,
    #[serde(default)]
    pub facets: Vec<Facet>,
}

/// GBIF view of a species and its US occurrences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsSpeciesSummary {
    pub key: u64,
    pub resolvable_identifier: String,
    pub biological_taxonomy: Vec<RankName>,
    pub scientific_name: Option<String>,
    pub name_with_source: Option<String>,
    pub rank: Option<String>,
    pub taxonomic_status: Option<String>,
    pub synonym: bool,
    pub occurrence_summary: OccurrenceSummary,
}
