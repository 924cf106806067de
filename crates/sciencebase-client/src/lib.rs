//! ScienceBase catalog client and GAP species documents
//!
//! - [`ScienceBaseClient`] pages through `catalog/items` searches and takes
//!   point-in-time snapshots filtered by [`SystemType`] and [`BrowseCategory`]
//! - [`GapClient`] assembles GAP species habitat/range documents and pulls
//!   state protection metrics for a species range

mod client;
mod gap;
mod snapshot;
mod types;

pub use client::ScienceBaseClient;
pub use gap::{GapClient, GapEnvelope, GAP_SPECIES_COLLECTION};
pub use snapshot::{BrowseCategory, SnapshotEnvelope, SystemType};
pub use types::{BoundingBox, GapSpecies, ItemsPage, Link, SpeciesMetricsReport, StateExtent};
