//! WoRMS Aphia record types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankName {
    pub rank: String,
    pub name: Option<String>,
}

/// Aphia record from the WoRMS REST service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WormsRecord {
    #[serde(rename = "AphiaID")]
    pub aphia_id: i64,
    pub scientificname: Option<String>,
    pub authority: Option<String>,
    pub status: Option<String>,
    pub rank: Option<String>,
    #[serde(rename = "valid_AphiaID")]
    pub valid_aphia_id: Option<i64>,
    pub valid_name: Option<String>,
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    /// Classification built from the rank fields, ending with the valid name
    #[serde(default)]
    pub taxonomy: Vec<RankName>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl WormsRecord {
    pub(crate) fn with_taxonomy(mut self) -> Self {
        let ranks = [
            ("kingdom", &self.kingdom),
            ("phylum", &self.phylum),
            ("class", &self.class),
            ("order", &self.order),
            ("family", &self.family),
            ("genus", &self.genus),
        ];
        let mut taxonomy: Vec<RankName> = ranks
            .iter()
            .map(|(rank, name)| RankName {
                rank: rank.to_string(),
                name: (*name).clone(),
            })
            .collect();
        taxonomy.push(RankName {
            rank: "Species".to_string(),
            name: self.valid_name.clone(),
        });
        self.taxonomy = taxonomy;
        self
    }
}
