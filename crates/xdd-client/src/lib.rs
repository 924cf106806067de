//! Client for the xDD (formerly GeoDeepDive) literature snippets API
//!
//! Search results are paged; [`XddClient::snippets`] follows `next_page` links
//! and returns every document with its title and URL renamed to the shared
//! `document_title` / `document_link` properties.

mod client;

pub use client::{XddClient, XddEnvelope};
