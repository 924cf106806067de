//! Response types for the resolver service

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanedName {
    pub name: String,
    pub cleaned_name: Option<String>,
}

/// Every name-based source queried with one cleaned scientific name
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesReport {
    pub name: String,
    pub cleaned_name: String,
    pub itis: Value,
    pub worms: Value,
    pub gbif: Value,
    pub natureserve: Value,
    pub tess: Value,
    pub iucn: Value,
    pub sgcn: Value,
}
