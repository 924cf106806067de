//! Per-attribute value tallies across a set of documents

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Counts how often each value of each attribute appears across records.
///
/// Records that lack an attribute are counted under the missing bucket (`None`),
/// including records seen before the attribute first appeared.
#[derive(Debug, Clone, Default)]
pub struct AttributeValueCount {
    len: usize,
    counts: BTreeMap<String, BTreeMap<Option<String>, usize>>,
}

impl AttributeValueCount {
    pub fn new<'a>(records: impl IntoIterator<Item = &'a Map<String, Value>>) -> Self {
        let mut counter = Self::default();
        counter.update(records);
        counter
    }

    pub fn update<'a>(&mut self, records: impl IntoIterator<Item = &'a Map<String, Value>>) {
        for record in records {
            self.add(record);
        }
    }

    pub fn add(&mut self, record: &Map<String, Value>) {
        for key in record.keys() {
            if !self.counts.contains_key(key) {
                let mut tally = BTreeMap::new();
                if self.len > 0 {
                    tally.insert(None, self.len);
                }
                self.counts.insert(key.clone(), tally);
            }
        }

        for (attribute, tally) in self.counts.iter_mut() {
            let value = record.get(attribute).map(value_key);
            *tally.entry(value).or_insert(0) += 1;
        }
        self.len += 1;
    }

    /// Number of records counted so far
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn counts(&self, attribute: &str) -> Option<&BTreeMap<Option<String>, usize>> {
        self.counts.get(attribute)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// Render the tallies for one attribute, or for all attributes when `None`
    pub fn summary(&self, attribute: Option<&str>) -> String {
        match attribute {
            None => self
                .counts
                .keys()
                .map(|a| self.summary(Some(a)))
                .collect::<Vec<_>>()
                .join("\n"),
            Some(attribute) => {
                let lines: Vec<String> = self
                    .counts
                    .get(attribute)
                    .into_iter()
                    .flatten()
                    .map(|(value, count)| {
                        format!("\t {}: {}", value.as_deref().unwrap_or("missing"), count)
                    })
                    .collect();
                format!("-- {} --\n{}", attribute, lines.join("\n"))
            }
        }
    }
}

fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_counts_with_missing() {
        let records = vec![
            obj(json!({"rank": "Species"})),
            obj(json!({"rank": "Species", "usage": "valid"})),
            obj(json!({"usage": "invalid"})),
        ];
        let counter = AttributeValueCount::new(&records);

        assert_eq!(counter.len(), 3);
        let rank = counter.counts("rank").unwrap();
        assert_eq!(rank.get(&Some("Species".to_string())), Some(&2));
        assert_eq!(rank.get(&None), Some(&1));

        let usage = counter.counts("usage").unwrap();
        assert_eq!(usage.get(&None), Some(&1));
        assert_eq!(usage.get(&Some("valid".to_string())), Some(&1));
        assert_eq!(usage.get(&Some("invalid".to_string())), Some(&1));
    }

    #[test]
    fn test_non_string_values() {
        let mut counter = AttributeValueCount::default();
        counter.add(&obj(json!({"synonym": false})));
        counter.add(&obj(json!({"synonym": false})));
        assert_eq!(
            counter.counts("synonym").unwrap().get(&Some("false".to_string())),
            Some(&2)
        );
    }

    #[test]
    fn test_summary_format() {
        let records = vec![obj(json!({"rank": "Genus"}))];
        let counter = AttributeValueCount::new(&records);
        assert_eq!(counter.summary(Some("rank")), "-- rank --\n\t Genus: 1");
    }
}
