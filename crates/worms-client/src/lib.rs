//! Client for WoRMS, the World Register of Marine Species
//!
//! Name searches fall back from exact to fuzzy matching, and unaccepted Aphia
//! records are followed through their `valid_AphiaID` links to the accepted
//! record.

mod client;
mod types;

pub use client::{SearchType, WormsClient, WormsEnvelope};
pub use types::{RankName, WormsRecord};
