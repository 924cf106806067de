//! Rust client for the GBIF (Global Biodiversity Information Facility) API
//!
//! Covers the two endpoints used to summarize a species in the United States:
//!
//! - `GET /species/suggest` - name search against the GBIF backbone
//! - `GET /occurrence/search` - US occurrence counts faceted by institution, year
//!   and basis of record
//!
//! # Example
//!
//! ```no_run
//! use gbif_api::GbifClient;
//!
//! # async fn example() {
//! let client = GbifClient::new();
//! let envelope = client.summarize_us_species("Puma concolor", None).await;
//! if let Some(summary) = envelope.data {
//!     println!("{} occurrences", summary.occurrence_summary.count);
//! }
//! # }
//! ```

mod client;
mod types;

pub use client::{GbifClient, GbifEnvelope};
pub use types::{
    Facet, FacetCount, OccurrenceSummary, RankName, SuggestResult, UsSpeciesSummary,
};
