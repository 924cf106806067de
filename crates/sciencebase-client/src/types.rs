//! ScienceBase catalog and GAP document types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

/// One page of a `catalog/items` search
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub items: Vec<Value>,
    pub selflink: Option<Link>,
    pub nextlink: Option<Link>,
}

/// Axis-aligned extent in EPSG:4326 (`[min_x, min_y, max_x, max_y]` when serialized)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Boxes touching on an edge count as intersecting
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Total extent of every coordinate in a GeoJSON feature collection
    pub fn from_geojson(collection: &Value) -> Option<Self> {
        let mut bbox = None;
        for feature in collection["features"].as_array().into_iter().flatten() {
            extend_bounds(&feature["geometry"]["coordinates"], &mut bbox);
        }
        bbox
    }
}

fn extend_bounds(value: &Value, bbox: &mut Option<BoundingBox>) {
    let Some(items) = value.as_array() else {
        return;
    };
    match (items.first().and_then(Value::as_f64), items.get(1).and_then(Value::as_f64)) {
        (Some(x), Some(y)) => match bbox {
            Some(b) => b.include(x, y),
            None => *bbox = Some(BoundingBox::point(x, y)),
        },
        _ => {
            for item in items {
                extend_bounds(item, bbox);
            }
        }
    }
}

impl Serialize for BoundingBox {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.min_x, self.min_y, self.max_x, self.max_y].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BoundingBox {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [min_x, min_y, max_x, max_y] = <[f64; 4]>::deserialize(deserializer)?;
        Ok(Self::new(min_x, min_y, max_x, max_y))
    }
}

/// Extent of a state, used to pick which states to pull GAP metrics for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateExtent {
    pub fips_code: String,
    #[serde(default)]
    pub name: Option<String>,
    pub bbox: BoundingBox,
}

/// GAP habitat map item as returned by the catalog
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct HabitatMapItem {
    pub(crate) link: Option<Link>,
    pub(crate) web_links: Vec<TitledLink>,
    pub(crate) distribution_links: Vec<TitledLink>,
    pub(crate) files: Vec<ItemFile>,
    pub(crate) dates: Vec<ItemDate>,
    pub(crate) identifiers: Vec<ItemIdentifier>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TitledLink {
    pub(crate) title: Option<String>,
    pub(crate) uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ItemFile {
    pub(crate) title: Option<String>,
    pub(crate) url: Option<String>,
    pub(crate) size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ItemDate {
    #[serde(rename = "type")]
    pub(crate) date_type: Option<String>,
    pub(crate) date_string: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ItemIdentifier {
    #[serde(rename = "type")]
    pub(crate) identifier_type: Option<String>,
    pub(crate) key: Option<String>,
}

/// GAP species document assembled from the habitat map item and its linked resources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GapSpecies {
    pub habitat_map_item: Option<String>,
    pub range_map_item: Option<String>,
    pub habitat_map_wms: Option<String>,
    pub database_parameters_url: Option<String>,
    pub itis_information_url: Option<String>,
    pub habitat_map_file_size: Option<u64>,
    pub habitat_map_last_updated: Option<String>,
    /// Item identifiers by type, e.g. `GAP_SpeciesCode`
    pub identifiers: BTreeMap<String, String>,
    pub range_map_wms: Option<String>,
    pub range_bbox: Option<BoundingBox>,
    pub database_parameters: Option<Value>,
    pub itis_information: Option<Value>,
}

impl GapSpecies {
    pub fn species_code(&self) -> Option<&str> {
        self.identifiers.get("GAP_SpeciesCode").map(String::as_str)
    }
}

/// Protection metrics for one species across the states its range touches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesMetricsReport {
    pub gap_species_code: String,
    pub state_metrics: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bbox_from_geojson() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                {"geometry": {"type": "Polygon", "coordinates": [[[-110.0, 30.0], [-100.0, 30.0], [-100.0, 40.0], [-110.0, 30.0]]]}},
                {"geometry": {"type": "MultiPolygon", "coordinates": [[[[-120.5, 35.0], [-115.0, 45.5], [-120.5, 35.0]]]]}}
            ]
        });

        let bbox = BoundingBox::from_geojson(&collection).unwrap();
        assert_eq!(bbox, BoundingBox::new(-120.5, 30.0, -100.0, 45.5));
        assert_eq!(serde_json::to_value(bbox).unwrap(), json!([-120.5, 30.0, -100.0, 45.5]));
    }

    #[test]
    fn test_bbox_from_empty_collection() {
        assert!(BoundingBox::from_geojson(&json!({"features": []})).is_none());
        assert!(BoundingBox::from_geojson(&json!({})).is_none());
    }

    #[test]
    fn test_intersects() {
        let range = BoundingBox::new(-110.0, 30.0, -100.0, 40.0);
        assert!(range.intersects(&BoundingBox::new(-105.0, 35.0, -95.0, 45.0)));
        assert!(range.intersects(&BoundingBox::new(-100.0, 40.0, -90.0, 50.0)));
        assert!(!range.intersects(&BoundingBox::new(-90.0, 30.0, -80.0, 40.0)));
    }

    #[test]
    fn test_items_page_deserialize() {
        let page: ItemsPage = serde_json::from_value(json!({
            "total": 2,
            "items": [{"id": "a"}, {"id": "b"}],
            "selflink": {"url": "https://www.sciencebase.gov/catalog/items?format=json"},
            "nextlink": {"url": "https://www.sciencebase.gov/catalog/items?format=json&offset=2"}
        }))
        .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.nextlink.is_some());
    }
}
