//! ScienceBase catalog client

use crate::types::ItemsPage;
use bis_core::http::{get_text, http_client, trim_base, DEFAULT_USER_AGENT};
use bis_core::Result;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

/// Client for the ScienceBase catalog item API
pub struct ScienceBaseClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
}

impl ScienceBaseClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://www.sciencebase.gov";

    /// Page size used when walking a collection
    pub const COLLECTION_PAGE_SIZE: usize = 100;
    /// Most items collected from one search or collection
    pub const MAX_ITEMS: usize = 100_000;

    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: http_client(DEFAULT_USER_AGENT),
            base_url: trim_base(base_url),
        }
    }

    pub fn items_url(&self, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}/catalog/items?format=json", self.base_url);
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    pub(crate) async fn get_page(&self, url: &str) -> Result<ItemsPage> {
        let body = get_text(&self.http, url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Run a catalog search
    pub async fn find_items(&self, params: &[(&str, &str)]) -> Result<ItemsPage> {
        self.get_page(&self.items_url(params)).await
    }

    /// Page following `page`, if the catalog linked one
    pub async fn next(&self, page: &ItemsPage) -> Result<Option<ItemsPage>> {
        match &page.nextlink {
            Some(link) => {
                debug!(url = %link.url, "ScienceBase next page");
                self.get_page(&link.url).await.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Follow `nextlink` from `first` and gather items up to [`Self::MAX_ITEMS`]
    pub async fn collect_pages(&self, first: ItemsPage) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut current = Some(first);
        while let Some(page) = current {
            if page.items.is_empty() {
                break;
            }
            let next = if items.len() + page.items.len() < Self::MAX_ITEMS {
                self.next(&page).await?
            } else {
                None
            };
            items.extend(page.items);
            if items.len() >= Self::MAX_ITEMS {
                warn!(limit = Self::MAX_ITEMS, "ScienceBase item limit reached");
                items.truncate(Self::MAX_ITEMS);
                break;
            }
            current = next;
        }
        Ok(items)
    }

    /// Every child item of a parent, with only the requested fields
    pub async fn collection_items(&self, parent_id: &str, fields: &str) -> Result<Vec<Value>> {
        let page_size = Self::COLLECTION_PAGE_SIZE.to_string();
        let first = self
            .find_items(&[("parentId", parent_id), ("fields", fields), ("max", &page_size)])
            .await?;
        let items = self.collect_pages(first).await?;
        debug!(parent_id, count = items.len(), "ScienceBase collection items");
        Ok(items)
    }
}

impl Default for ScienceBaseClient {
    fn default() -> Self {
        Self::new()
    }
}
