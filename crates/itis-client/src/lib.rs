//! Client for ITIS, the Integrated Taxonomic Information System
//!
//! Resolves scientific names against the ITIS Solr service and packages the
//! matching records (taxonomic hierarchy, common names) for caching.
//!
//! # Example
//!
//! ```no_run
//! use itis_client::ItisClient;
//!
//! # async fn example() {
//! let client = ItisClient::new();
//! let envelope = client.search("Puma concolor").await;
//! println!("{:?}", envelope.status_message());
//! # }
//! ```

mod client;
mod types;

pub use client::{ItisClient, ItisEnvelope};
pub use types::{CommonName, ItisRecord, RankName};
