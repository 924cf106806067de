//! Clients for the U.S. Fish and Wildlife Service ECOS system
//!
//! - [`TessClient`] queries the Threatened and Endangered Species System
//!   XQuery service by TSN or scientific name
//! - [`EcosClient`] scrapes ECOS species profile pages into listing status,
//!   Federal Register and recovery document tables

mod ecos;
mod tess;

pub use ecos::{parse_profile, EcosClient, EcosEnvelope, PROFILE_TABLES};
pub use tess::{TessClient, TessEnvelope};
