//! Source clients behind a shared envelope cache

use crate::config::Config;
use crate::error::Result;
use crate::types::{CacheStats, SpeciesReport};
use bis_core::{Envelope, Status};
use fws_client::{EcosClient, TessClient};
use gbif_api::GbifClient;
use iucn_client::IucnClient;
use itis_client::ItisClient;
use moka::future::Cache;
use natureserve_client::NatureServeClient;
use sciencebase_client::{BrowseCategory, GapClient, ScienceBaseClient, SystemType};
use serde::Serialize;
use serde_json::Value;
use sgcn_client::SgcnClient;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;
use worms_client::WormsClient;
use xdd_client::XddClient;

const SNAPSHOT_FIELDS: &str = "id,title";

/// Source name plus every query input, kept as separate parts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source: &'static str,
    query: Vec<Option<String>>,
}

impl CacheKey {
    fn new(source: &'static str, query: &[Option<&str>]) -> Self {
        Self {
            source,
            query: query.iter().map(|part| part.map(str::to_string)).collect(),
        }
    }
}

pub struct Sources {
    itis: ItisClient,
    worms: WormsClient,
    gbif: GbifClient,
    natureserve: NatureServeClient,
    tess: TessClient,
    ecos: EcosClient,
    iucn: IucnClient,
    sgcn: SgcnClient,
    xdd: XddClient,
    sciencebase: ScienceBaseClient,
    gap: GapClient,
    cache: Cache<CacheKey, Value>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Sources {
    pub fn new(config: &Config) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(config.cache_ttl_mins * 60))
            .build();

        Self {
            itis: ItisClient::with_base_url(&config.itis_base_url),
            worms: WormsClient::with_base_url(&config.worms_base_url),
            gbif: GbifClient::with_base_url(&config.gbif_base_url),
            natureserve: NatureServeClient::with_base_url(&config.natureserve_base_url),
            tess: TessClient::with_base_url(&config.tess_base_url),
            ecos: EcosClient::with_base_url(&config.ecos_base_url),
            iucn: IucnClient::with_base_url(&config.iucn_base_url, config.iucn_token.clone()),
            sgcn: SgcnClient::with_base_url(&config.sgcn_base_url),
            xdd: XddClient::with_base_url(&config.xdd_base_url),
            sciencebase: ScienceBaseClient::with_base_url(&config.sciencebase_base_url),
            gap: GapClient::with_base_urls(&config.sciencebase_base_url, &config.bis_api_base_url),
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Serve an envelope from the cache, or run the lookup and cache its result.
    ///
    /// Error envelopes are returned but not cached.
    async fn cached<T, F>(&self, key: CacheKey, lookup: F) -> Result<Value>
    where
        T: Serialize,
        F: Future<Output = Envelope<T>>,
    {
        if let Some(value) = self.cache.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let envelope = lookup.await;
        let status = envelope.status();
        let value = serde_json::to_value(&envelope)?;
        if status == Status::Error {
            debug!(key = ?key, "Not caching error envelope");
        } else {
            self.cache.insert(key, value.clone()).await;
        }
        Ok(value)
    }

    pub async fn itis(&self, name: &str) -> Result<Value> {
        self.cached(CacheKey::new("itis", &[Some(name)]), self.itis.search(name)).await
    }

    pub async fn worms(&self, name: &str) -> Result<Value> {
        self.cached(CacheKey::new("worms", &[Some(name)]), self.worms.search(name)).await
    }

    pub async fn gbif(&self, name: &str, source: Option<&str>) -> Result<Value> {
        self.cached(
            CacheKey::new("gbif", &[Some(name), source]),
            self.gbif.summarize_us_species(name, source),
        )
        .await
    }

    pub async fn natureserve(&self, name: &str) -> Result<Value> {
        self.cached(CacheKey::new("natureserve", &[Some(name)]), self.natureserve.search(name))
            .await
    }

    /// TESS accepts either an ITIS TSN or a scientific name
    pub async fn tess(&self, criteria: &str) -> Result<Value> {
        self.cached(CacheKey::new("tess", &[Some(criteria)]), self.tess.search(criteria))
            .await
    }

    /// Reject profile URLs outside the configured ECOS site
    pub fn check_ecos_url(&self, profile_url: &str) -> bis_core::Result<()> {
        self.ecos.check_profile_url(profile_url).map(|_| ())
    }

    pub async fn ecos(&self, profile_url: &str) -> Result<Value> {
        self.cached(CacheKey::new("ecos", &[Some(profile_url)]), self.ecos.scrape_profile(profile_url))
            .await
    }

    pub async fn iucn(&self, name: &str) -> Result<Value> {
        self.cached(CacheKey::new("iucn", &[Some(name)]), self.iucn.search_species(name))
            .await
    }

    pub async fn sgcn(&self, name: &str, source: Option<&str>) -> Result<Value> {
        self.cached(
            CacheKey::new("sgcn", &[Some(name), source]),
            self.sgcn.search(name, source),
        )
        .await
    }

    pub async fn xdd(&self, term: &str) -> Result<Value> {
        self.cached(CacheKey::new("xdd", &[Some(term)]), self.xdd.snippets(term)).await
    }

    pub async fn gap(&self, name: &str, source: Option<&str>) -> Result<Value> {
        self.cached(
            CacheKey::new("gap", &[Some(name), source]),
            self.gap.gap_species_search(name, source),
        )
        .await
    }

    pub async fn snapshot(
        &self,
        system_type: Option<SystemType>,
        browse_category: Option<BrowseCategory>,
        q: Option<&str>,
    ) -> Result<Value> {
        let key = CacheKey::new(
            "snapshot",
            &[
                system_type.map(|t| t.as_str()),
                browse_category.map(|c| c.as_str()),
                q,
            ],
        );
        self.cached(
            key,
            self.sciencebase
                .search_snapshot(system_type, browse_category, q, SNAPSHOT_FIELDS),
        )
        .await
    }

    /// Query every name-based source concurrently
    pub async fn species(&self, name: &str, cleaned_name: &str) -> Result<SpeciesReport> {
        let (itis, worms, gbif, natureserve, tess, iucn, sgcn) = futures::join!(
            self.itis(cleaned_name),
            self.worms(cleaned_name),
            self.gbif(cleaned_name, None),
            self.natureserve(cleaned_name),
            self.tess(cleaned_name),
            self.iucn(cleaned_name),
            self.sgcn(cleaned_name, None),
        );

        Ok(SpeciesReport {
            name: name.to_string(),
            cleaned_name: cleaned_name.to_string(),
            itis: itis?,
            worms: worms?,
            gbif: gbif?,
            natureserve: natureserve?,
            tess: tess?,
            iucn: iucn?,
            sgcn: sgcn?,
        })
    }
}
