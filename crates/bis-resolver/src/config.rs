//! Service configuration from environment variables

use fws_client::{EcosClient, TessClient};
use gbif_api::GbifClient;
use iucn_client::IucnClient;
use itis_client::ItisClient;
use natureserve_client::NatureServeClient;
use sciencebase_client::{GapClient, ScienceBaseClient};
use sgcn_client::SgcnClient;
use worms_client::WormsClient;
use xdd_client::XddClient;

const DEFAULT_PORT: u16 = 3005;
const DEFAULT_CACHE_TTL_MINS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cache_ttl_mins: u64,
    pub iucn_token: Option<String>,
    pub itis_base_url: String,
    pub worms_base_url: String,
    pub gbif_base_url: String,
    pub natureserve_base_url: String,
    pub tess_base_url: String,
    pub ecos_base_url: String,
    pub iucn_base_url: String,
    pub sgcn_base_url: String,
    pub xdd_base_url: String,
    pub sciencebase_base_url: String,
    pub bis_api_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let url = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        Self {
            port: var("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            cache_ttl_mins: var("CACHE_TTL_MINS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CACHE_TTL_MINS),
            iucn_token: var("IUCN_TOKEN"),
            itis_base_url: url("ITIS_BASE_URL", ItisClient::DEFAULT_BASE_URL),
            worms_base_url: url("WORMS_BASE_URL", WormsClient::DEFAULT_BASE_URL),
            gbif_base_url: url("GBIF_BASE_URL", GbifClient::DEFAULT_BASE_URL),
            natureserve_base_url: url("NATURESERVE_BASE_URL", NatureServeClient::DEFAULT_BASE_URL),
            tess_base_url: url("TESS_BASE_URL", TessClient::DEFAULT_BASE_URL),
            ecos_base_url: url("ECOS_BASE_URL", EcosClient::DEFAULT_BASE_URL),
            iucn_base_url: url("IUCN_BASE_URL", IucnClient::DEFAULT_BASE_URL),
            sgcn_base_url: url("SGCN_BASE_URL", SgcnClient::DEFAULT_BASE_URL),
            xdd_base_url: url("XDD_BASE_URL", XddClient::DEFAULT_BASE_URL),
            sciencebase_base_url: url("SCIENCEBASE_BASE_URL", ScienceBaseClient::DEFAULT_BASE_URL),
            bis_api_base_url: url("BIS_API_BASE_URL", GapClient::DEFAULT_BIS_API_URL),
        }
    }

    /// Point every source at one base URL
    #[cfg(test)]
    pub fn with_all_sources(base_url: &str) -> Self {
        Self::from_lookup(|key| key.ends_with("_BASE_URL").then(|| base_url.to_string()))
    }
}
