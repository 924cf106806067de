//! JSON Schema skeleton inference from sample documents

use crate::error::{BisError, Result};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

const SCHEMA_URI: &str = "http://json-schema.org/draft-06/schema#";

#[derive(Debug, Default, Clone)]
struct SchemaNode {
    types: BTreeSet<&'static str>,
    properties: BTreeMap<String, SchemaNode>,
    /// Keys present in every object seen at this node
    required: Option<BTreeSet<String>>,
    items: Option<Box<SchemaNode>>,
}

impl SchemaNode {
    fn add(&mut self, value: &Value) {
        match value {
            Value::Null => {
                self.types.insert("null");
            }
            Value::Bool(_) => {
                self.types.insert("boolean");
            }
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    self.types.insert("integer");
                } else {
                    self.types.insert("number");
                }
            }
            Value::String(_) => {
                self.types.insert("string");
            }
            Value::Array(elements) => {
                self.types.insert("array");
                let items = self.items.get_or_insert_with(Box::default);
                for element in elements {
                    items.add(element);
                }
            }
            Value::Object(map) => {
                self.types.insert("object");
                for (key, child) in map {
                    self.properties.entry(key.clone()).or_default().add(child);
                }
                let keys: BTreeSet<String> = map.keys().cloned().collect();
                self.required = Some(match self.required.take() {
                    None => keys,
                    Some(seen) => seen.intersection(&keys).cloned().collect(),
                });
            }
        }
    }

    fn to_value(&self) -> Value {
        let mut out = Map::new();

        let mut types = self.types.clone();
        if types.contains("number") {
            types.remove("integer");
        }
        match types.len() {
            0 => {}
            1 => {
                let only = types.iter().next().copied().unwrap_or("null");
                out.insert("type".to_string(), json!(only));
            }
            _ => {
                out.insert("type".to_string(), json!(types.iter().collect::<Vec<_>>()));
            }
        }

        if types.contains("object") {
            let properties: Map<String, Value> = self
                .properties
                .iter()
                .map(|(k, node)| (k.clone(), node.to_value()))
                .collect();
            out.insert("properties".to_string(), Value::Object(properties));
            if let Some(required) = self.required.as_ref().filter(|r| !r.is_empty()) {
                out.insert("required".to_string(), json!(required));
            }
        }

        if types.contains("array") {
            let items = self
                .items
                .as_ref()
                .map(|node| node.to_value())
                .unwrap_or_else(|| json!({}));
            out.insert("items".to_string(), items);
        }

        Value::Object(out)
    }
}

/// Incrementally merges sample objects into a draft-06 schema skeleton
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    root: SchemaNode,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        let mut root = SchemaNode::default();
        root.types.insert("object");
        Self { root }
    }

    pub fn add_object(&mut self, object: &Map<String, Value>) {
        for (key, child) in object {
            self.root
                .properties
                .entry(key.clone())
                .or_default()
                .add(child);
        }
        let keys: BTreeSet<String> = object.keys().cloned().collect();
        self.root.required = Some(match self.root.required.take() {
            None => keys,
            Some(seen) => seen.intersection(&keys).cloned().collect(),
        });
    }

    pub fn to_schema(&self) -> Value {
        let mut schema = self.root.to_value();
        if let Value::Object(map) = &mut schema {
            map.insert("$schema".to_string(), json!(SCHEMA_URI));
        }
        schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a schema skeleton from an object or a list of objects
pub fn generate_json_schema(data: Value) -> Result<Value> {
    let records = match data {
        Value::Object(map) => vec![Value::Object(map)],
        Value::Array(items) => items,
        Value::String(s) => return generate_json_schema_str(&s),
        _ => {
            return Err(BisError::InvalidInput(
                "data must be an object or a list of objects".to_string(),
            ))
        }
    };

    if records.is_empty() {
        return Err(BisError::InvalidInput(
            "your list of objects must contain at least one object to process".to_string(),
        ));
    }

    let mut builder = SchemaBuilder::new();
    for record in &records {
        match record {
            Value::Object(map) => builder.add_object(map),
            _ => {
                return Err(BisError::InvalidInput(
                    "your list must contain only objects".to_string(),
                ))
            }
        }
    }
    Ok(builder.to_schema())
}

/// Generate a schema skeleton from a JSON string holding an object or list of objects
pub fn generate_json_schema_str(data: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(data)?;
    if value.is_string() {
        return Err(BisError::InvalidInput(
            "data must be an object or a list of objects".to_string(),
        ));
    }
    generate_json_schema(value)
}
