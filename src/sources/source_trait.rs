// Trait definition and shared records for plugin repositories

use crate::error::{HaltReason, RepositoryError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Server-side category an artifact is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Mod,
    Plugin,
}

/// One hit from a repository search. `id` is only unique within `source`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    pub description: String,
    pub author: String,
    pub version: String,
    pub downloads: u64,
    /// Id of the repository that produced this result
    pub source: String,
    pub url: String,
    pub types: BTreeSet<AssetType>,
}

/// Full resource details, including the flags that block automated installs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedResource {
    #[serde(flatten)]
    pub summary: SearchResult,
    pub tested_versions: Vec<String>,
    pub external: bool,
    pub premium: bool,
}

impl DetailedResource {
    /// Fail with the halt state when the artifact cannot be fetched programmatically
    pub fn ensure_installable(&self) -> Result<()> {
        let reason = if self.premium {
            HaltReason::Premium
        } else if self.external {
            HaltReason::External
        } else {
            return Ok(());
        };

        Err(RepositoryError::ExternalOrPremium {
            name: self.summary.name.clone(),
            url: self.summary.url.clone(),
            reason,
        })
    }
}

/// One item of a resource's version history.
///
/// Order within a list is whatever the upstream returned; sort before relying on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionEntry {
    /// Upstream identifier of this version (may equal `display_name`)
    pub id: String,
    /// The human version string, e.g. "5.1.5"
    pub display_name: String,
    pub released_at: Option<DateTime<Utc>>,
    pub downloads: u64,
    /// `None` when the upstream does not report game versions
    pub game_versions: Option<Vec<String>>,
    pub loaders: Vec<String>,
}

/// A resolved, directly downloadable artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionInfo {
    pub resource_id: String,
    pub version: String,
    pub download_url: String,
    pub file_name: String,
    /// "algorithm:hex" when the upstream publishes a checksum
    pub hash: Option<String>,
}

/// Extra search parameters
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Loader tags to restrict results to, most specific first
    pub loaders: Vec<String>,
}

impl SearchOptions {
    pub fn with_loaders(loaders: Vec<String>) -> Self {
        Self { loaders }
    }
}

/// Uniform contract over every plugin repository backend
#[async_trait]
pub trait Repository: Send + Sync {
    /// Stable identifier used in configuration and search results
    fn id(&self) -> &str;

    fn display_name(&self) -> &str;

    fn base_url(&self) -> &str;

    fn asset_types(&self) -> &[AssetType];

    /// Search the repository. An upstream "no results" answer yields an empty list.
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>>;

    async fn get_resource(&self, id: &str) -> Result<DetailedResource>;

    async fn get_versions(&self, id: &str) -> Result<Vec<VersionEntry>>;

    async fn get_latest_version(&self, id: &str, loaders: &[String]) -> Result<VersionInfo>;

    /// Resolve a specific version (by version string or upstream version id)
    async fn get_version_download(
        &self,
        id: &str,
        version: &str,
        loaders: &[String],
    ) -> Result<VersionInfo>;
}
