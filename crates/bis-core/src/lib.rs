//! Shared building blocks for the Biogeographic Information System (BIS) source adapters
//!
//! Every adapter wraps what it learns from a source in an [`Envelope`]: a
//! processing-metadata block (status, message, timestamp and the API calls made),
//! the request parameters, and the normalized data when the source matched.
//!
//! This crate also carries the document utilities used around those adapters:
//!
//! - [`clean_scientific_name`] - normalize raw name strings before lookups
//! - [`integrate_recordset`] / [`alter_keys`] - map source field names onto shared property names
//! - [`generate_json_schema`] - infer a JSON Schema skeleton from sample documents
//! - [`doc_cache`] - write document arrays to disk and spot-check them
//! - [`AttributeValueCount`] - tally attribute values across documents
//! - [`xml_to_json`] - xmltodict-style conversion for XML sources

mod aliases;
mod counts;
mod doc_cache;
mod envelope;
mod error;
pub mod http;
mod names;
mod schema;
mod xml;

pub use aliases::{alter_keys, common_property_mappings, integrate_recordset};
pub use counts::AttributeValueCount;
pub use doc_cache::{doc_cache, sample_doc_cache, write_doc_cache, CacheSample};
pub use envelope::{ApiCall, Envelope, ProcessingMetadata, Status};
pub use error::{BisError, Result};
pub use names::clean_scientific_name;
pub use schema::{generate_json_schema, generate_json_schema_str, SchemaBuilder};
pub use xml::xml_to_json;
