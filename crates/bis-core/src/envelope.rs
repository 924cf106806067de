//! Processing metadata envelope wrapped around every source result

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of a source query
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Source matched and data is present
    Success,
    /// Query ran but nothing usable matched
    Failure,
    /// Transport, HTTP or parse failure
    Error,
}

/// One request made against a source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiCall {
    pub step: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    pub date_processed: DateTime<Utc>,
    #[serde(default)]
    pub api: Vec<ApiCall>,
}

/// Common document shape for all adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub processing_metadata: ProcessingMetadata,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn new(default_status: Status) -> Self {
        Self {
            processing_metadata: ProcessingMetadata {
                status: default_status,
                status_message: None,
                date_processed: Utc::now(),
                api: Vec::new(),
            },
            parameters: BTreeMap::new(),
            data: None,
        }
    }

    /// Envelope that stays a failure until a source matches
    pub fn not_matched() -> Self {
        let mut envelope = Self::new(Status::Failure);
        envelope.processing_metadata.status_message = Some("Not Matched".to_string());
        envelope
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn record_call(&mut self, step: impl Into<String>, url: impl Into<String>) {
        self.processing_metadata.api.push(ApiCall {
            step: step.into(),
            url: url.into(),
        });
    }

    pub fn succeed(mut self, message: impl Into<String>, data: T) -> Self {
        self.processing_metadata.status = Status::Success;
        self.processing_metadata.status_message = Some(message.into());
        self.data = Some(data);
        self
    }

    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.processing_metadata.status = Status::Failure;
        self.processing_metadata.status_message = Some(message.into());
        self.data = None;
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.processing_metadata.status = Status::Error;
        self.processing_metadata.status_message = Some(message.into());
        self.data = None;
        self
    }

    pub fn status(&self) -> Status {
        self.processing_metadata.status
    }

    pub fn status_message(&self) -> Option<&str> {
        self.processing_metadata.status_message.as_deref()
    }

    /// URL of the most recent call, if any
    pub fn last_call(&self) -> Option<&ApiCall> {
        self.processing_metadata.api.last()
    }

    pub fn map_data<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            processing_metadata: self.processing_metadata,
            parameters: self.parameters,
            data: self.data.map(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_matched_defaults() {
        let envelope: Envelope<()> = Envelope::not_matched();
        assert_eq!(envelope.status(), Status::Failure);
        assert_eq!(envelope.status_message(), Some("Not Matched"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_error_clears_data() {
        let envelope = Envelope::new(Status::Failure)
            .succeed("Matched", vec![1, 2, 3])
            .error("Incomplete results");
        assert_eq!(envelope.status(), Status::Error);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_serialization_shape() {
        let mut envelope = Envelope::not_matched().with_parameter("Scientific Name", "Puma concolor");
        envelope.record_call("search", "https://example.org/?q=Puma");
        let envelope = envelope.succeed("Matched", serde_json::json!({"key": 1}));

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["processing_metadata"]["status"], "success");
        assert_eq!(json["processing_metadata"]["api"][0]["step"], "search");
        assert_eq!(json["parameters"]["Scientific Name"], "Puma concolor");
        assert_eq!(json["data"]["key"], 1);
    }

    #[test]
    fn test_empty_parameters_skipped() {
        let envelope: Envelope<()> = Envelope::new(Status::Error);
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("parameters").is_none());
        assert!(json.get("data").is_none());
    }
}
