//! Mapping source-specific field names onto the shared BIS property names

use crate::error::{BisError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

const COMMON_PROPERTIES: &str = include_str!("../resources/common_properties.json");

#[derive(Debug, Deserialize)]
struct CommonProperties {
    definitions: HashMap<String, PropertyDefinition>,
}

#[derive(Debug, Deserialize)]
struct PropertyDefinition {
    #[serde(default)]
    aliases: Vec<String>,
}

/// Build alias -> preferred name mappings from the bundled property definitions,
/// optionally restricted to a set of target properties
pub fn common_property_mappings(target_properties: Option<&[&str]>) -> Result<HashMap<String, String>> {
    let properties: CommonProperties = serde_json::from_str(COMMON_PROPERTIES)?;

    let mut mappings = HashMap::new();
    for (name, definition) in properties.definitions {
        if let Some(targets) = target_properties {
            if !targets.contains(&name.as_str()) {
                continue;
            }
        }
        for alias in definition.aliases {
            mappings.insert(alias, name.clone());
        }
    }
    Ok(mappings)
}

/// Rename keys listed in `mappings` at every level of a JSON value
pub fn alter_keys(value: &mut Value, mappings: &HashMap<String, String>) {
    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                alter_keys(child, mappings);
            }
            rename_keys(map, mappings);
        }
        Value::Array(items) => {
            for item in items {
                alter_keys(item, mappings);
            }
        }
        _ => {}
    }
}

fn rename_keys(map: &mut Map<String, Value>, mappings: &HashMap<String, String>) {
    for (alias, preferred) in mappings {
        if let Some(v) = map.remove(alias) {
            map.insert(preferred.clone(), v);
        }
    }
}

/// Apply the common-property aliases to a record or list of records.
///
/// A single object is treated as a one-record set; anything else is rejected.
pub fn integrate_recordset(recordset: Value, target_properties: Option<&[&str]>) -> Result<Vec<Value>> {
    let mut records = match recordset {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => {
            return Err(BisError::InvalidInput(
                "recordset must be an object or a list of objects".to_string(),
            ))
        }
    };

    let mappings = common_property_mappings(target_properties)?;
    for record in &mut records {
        alter_keys(record, &mappings);
    }
    Ok(records)
}
