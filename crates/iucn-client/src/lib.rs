//! Client for the IUCN Red List API (v3)
//!
//! Every Red List request needs an API token. The token is sent with each call
//! but left out of the URLs recorded in envelopes.

mod client;

pub use client::{IucnClient, IucnEnvelope};
