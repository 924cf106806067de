//! Point-in-time snapshots of ScienceBase searches

use crate::client::ScienceBaseClient;
use bis_core::{BisError, Envelope, Status};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Envelope returned by [`ScienceBaseClient::search_snapshot`]
pub type SnapshotEnvelope = Envelope<Vec<Value>>;

const SNAPSHOT_MAX: &str = "1000";

macro_rules! catalog_enum {
    ($(#[$meta:meta])* $name:ident, $filter:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Catalog filter expression for this value
            pub fn filter(&self) -> String {
                format!("{}={}", $filter, self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = BisError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        let accepted: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        BisError::InvalidInput(format!(
                            "{} must be one of: {}",
                            $filter,
                            accepted.join(", ")
                        ))
                    })
            }
        }
    };
}

catalog_enum!(
    /// Special item types in ScienceBase
    SystemType, "systemType", {
        DataRelease => "Data Release",
        Folder => "Folder",
        Community => "Community",
        Downloadable => "Downloadable",
        Mappable => "Mappable",
        MapService => "Map Service",
    }
);

catalog_enum!(
    /// Browse categories in ScienceBase
    BrowseCategory, "browseCategory", {
        PhysicalItem => "Physical Item",
        Publication => "Publication",
        Data => "Data",
        Project => "Project",
        Image => "Image",
        Map => "Map",
        DataReleaseInProgress => "Data Release - In Progress",
        WebSite => "Web Site",
        Collection => "Collection",
        Software => "Software",
        DataReleaseUnderRevision => "Data Release - Under Revision",
    }
);

impl ScienceBaseClient {
    /// Snapshot of every item matching the filters, at the time of the call.
    ///
    /// Filters are sent as `filter0`, `filter1`, ... in the order system type,
    /// browse category.
    pub async fn search_snapshot(
        &self,
        system_type: Option<SystemType>,
        browse_category: Option<BrowseCategory>,
        q: Option<&str>,
        fields: &str,
    ) -> SnapshotEnvelope {
        let filters: Vec<String> = system_type
            .map(|t| t.filter())
            .into_iter()
            .chain(browse_category.map(|c| c.filter()))
            .collect();
        let filter_keys: Vec<String> = (0..filters.len()).map(|i| format!("filter{}", i)).collect();

        let mut params: Vec<(&str, &str)> = vec![("fields", fields), ("max", SNAPSHOT_MAX)];
        for (key, filter) in filter_keys.iter().zip(&filters) {
            params.push((key.as_str(), filter.as_str()));
        }
        if let Some(q) = q {
            params.push(("q", q));
        }

        let mut envelope = Envelope::new(Status::Failure);
        envelope.processing_metadata.status_message = Some("Search failed".to_string());
        for (key, value) in &params {
            envelope = envelope.with_parameter(*key, *value);
        }

        let url = self.items_url(&params);
        let first = match self.get_page(&url).await {
            Ok(page) => page,
            Err(e) => {
                envelope.record_call("Find Items", &url);
                warn!(url = %url, error = %e, "ScienceBase search failed");
                return envelope.error(e.to_string());
            }
        };
        let self_url = first.selflink.as_ref().map_or(url, |link| link.url.clone());
        envelope.record_call("Find Items", self_url);

        if first.items.is_empty() {
            return envelope.succeed("no items found", Vec::new());
        }
        match self.collect_pages(first).await {
            Ok(items) => envelope.succeed(format!("Number items found: {}", items.len()), items),
            Err(e) => {
                warn!(error = %e, "ScienceBase paging failed");
                envelope.error(e.to_string())
            }
        }
    }
}
