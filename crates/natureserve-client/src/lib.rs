//! Client for the NatureServe national species web service
//!
//! The service answers in XML; responses are converted to JSON before the
//! matching species record is picked out.

mod client;

pub use client::{NatureServeClient, NatureServeEnvelope};
