//! Client for the Species of Greatest Conservation Need (SGCN) national list
//!
//! The national list is served from the BIS API as Elasticsearch-style hits.

mod client;

pub use client::{SgcnClient, SgcnEnvelope};
