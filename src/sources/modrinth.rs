// Modrinth source implementation

use crate::error::{RepositoryError, Result};
use crate::sources::http;
use crate::sources::loaders::{self, LoaderFamily};
use crate::sources::source_trait::{
    AssetType, DetailedResource, Repository, SearchOptions, SearchResult, VersionEntry,
    VersionInfo,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeSet;

pub const DEFAULT_BASE_URL: &str = "https://api.modrinth.com/v2";
const SITE_URL: &str = "https://modrinth.com";

/// Number of hits requested per search
const SEARCH_LIMIT: usize = 20;

/// Hits whose latest version is re-derived from their full version history
const MAX_ENRICHED_RESULTS: usize = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    project_id: String,
    slug: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    downloads: u64,
    project_type: String,
    #[serde(default)]
    categories: Vec<String>,
    /// Unreliable: has been seen pointing at stale or differently-tagged releases
    latest_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Project {
    id: String,
    slug: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    downloads: u64,
    project_type: String,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    loaders: Vec<String>,
    #[serde(default)]
    game_versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TeamMember {
    role: String,
    user: User,
}

#[derive(Debug, Deserialize)]
struct User {
    username: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Version {
    id: String,
    version_number: String,
    date_published: String,
    #[serde(default)]
    downloads: u64,
    #[serde(default)]
    game_versions: Vec<String>,
    #[serde(default)]
    loaders: Vec<String>,
    #[serde(default)]
    files: Vec<VersionFile>,
}

#[derive(Debug, Clone, Deserialize)]
struct VersionFile {
    url: String,
    filename: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    hashes: FileHashes,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileHashes {
    sha512: Option<String>,
}

impl Version {
    fn published(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date_published)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    fn supports_any(&self, loaders: &[String]) -> bool {
        loaders::intersects(&self.loaders, loaders)
    }
}

/// Build the `facets` query value restricting results to the given loaders.
///
/// Categories of all loaders are OR-ed in one group; a project type group is
/// added only when every loader belongs to the same family.
fn loader_facets(requested: &[String]) -> Option<String> {
    if requested.is_empty() {
        return None;
    }

    let mut categories: Vec<String> = Vec::new();
    for loader in requested {
        for tag in loaders::category_tags(loader) {
            let facet = format!("categories:{}", tag);
            if !categories.contains(&facet) {
                categories.push(facet);
            }
        }
    }

    let mut facets = vec![categories];
    match loaders::common_family(requested) {
        Some(LoaderFamily::Plugin) => facets.push(vec!["project_type:plugin".to_string()]),
        Some(LoaderFamily::Mod) => facets.push(vec!["project_type:mod".to_string()]),
        None => {}
    }

    serde_json::to_string(&facets).ok()
}

/// Classify a project from its category tags, falling back to its project type
fn asset_types(categories: &[String], project_type: &str) -> BTreeSet<AssetType> {
    let mut types: BTreeSet<AssetType> = categories
        .iter()
        .filter_map(|c| loaders::family(c))
        .map(|family| match family {
            LoaderFamily::Plugin => AssetType::Plugin,
            LoaderFamily::Mod => AssetType::Mod,
        })
        .collect();

    if types.is_empty() {
        types.insert(if project_type == "plugin" {
            AssetType::Plugin
        } else {
            AssetType::Mod
        });
    }
    types
}

/// Newest version by publish date, preferring versions for the requested loaders.
/// Falls back to the whole list if no version matches.
fn pick_latest<'a>(versions: &'a [Version], requested: &[String]) -> Option<&'a Version> {
    let matching: Vec<&Version> = if requested.is_empty() {
        Vec::new()
    } else {
        versions.iter().filter(|v| v.supports_any(requested)).collect()
    };

    let pool: Vec<&Version> = if matching.is_empty() {
        versions.iter().collect()
    } else {
        matching
    };

    pool.into_iter().max_by_key(|v| v.published())
}

pub struct ModrinthSource {
    client: Client,
    base_url: String,
}

impl ModrinthSource {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Point the source at a different API root (used for mirrors and tests)
    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_versions(&self, project_id: &str) -> Result<Vec<Version>> {
        let url = format!("{}/project/{}/version", self.base_url, project_id);
        http::fetch_json(&self.client, &url).await
    }

    async fn fetch_owner(&self, project_id: &str) -> Result<String> {
        let url = format!("{}/project/{}/members", self.base_url, project_id);
        let members: Vec<TeamMember> = http::fetch_json(&self.client, &url).await?;

        let owner = members
            .iter()
            .find(|m| m.role.eq_ignore_ascii_case("owner"))
            .or_else(|| members.first())
            .map(|m| m.user.username.clone())
            .ok_or_else(|| RepositoryError::not_found(format!("team of '{}'", project_id)))?;
        Ok(owner)
    }

    /// Re-derive the latest version of a search hit from its version history
    async fn true_latest(&self, project_id: &str, requested: &[String]) -> Option<String> {
        match self.fetch_versions(project_id).await {
            Ok(versions) => pick_latest(&versions, requested).map(|v| v.version_number.clone()),
            Err(e) => {
                debug!("Could not fetch versions of '{}': {}", project_id, e);
                None
            }
        }
    }

    /// Versions usable with the requested loaders (all versions if none requested)
    async fn compatible_versions(&self, id: &str, requested: &[String]) -> Result<Vec<Version>> {
        let versions = self.fetch_versions(id).await?;
        if requested.is_empty() {
            return Ok(versions);
        }

        let filtered: Vec<Version> = versions
            .into_iter()
            .filter(|v| v.supports_any(requested))
            .collect();

        if filtered.is_empty() {
            return Err(RepositoryError::not_found(format!(
                "versions of '{}' for loaders {}",
                id,
                requested.join(", ")
            )));
        }
        Ok(filtered)
    }

    fn to_version_info(project_id: &str, version: &Version) -> Result<VersionInfo> {
        let file = version
            .files
            .iter()
            .find(|f| f.primary)
            .or_else(|| version.files.first())
            .ok_or_else(|| RepositoryError::NoFilesFound {
                id: project_id.to_string(),
                version: version.version_number.clone(),
            })?;

        Ok(VersionInfo {
            resource_id: project_id.to_string(),
            version: version.version_number.clone(),
            download_url: file.url.clone(),
            file_name: file.filename.clone(),
            hash: file.hashes.sha512.as_ref().map(|h| format!("sha512:{}", h)),
        })
    }

    fn to_search_result(&self, hit: Hit) -> SearchResult {
        SearchResult {
            url: format!("{}/{}/{}", SITE_URL, hit.project_type, hit.slug),
            types: asset_types(&hit.categories, &hit.project_type),
            id: hit.project_id,
            name: hit.title,
            description: hit.description,
            author: hit.author,
            version: hit.latest_version.unwrap_or_default(),
            downloads: hit.downloads,
            source: self.id().to_string(),
        }
    }
}

#[async_trait]
impl Repository for ModrinthSource {
    fn id(&self) -> &str {
        "modrinth"
    }

    fn display_name(&self) -> &str {
        "Modrinth"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn asset_types(&self) -> &[AssetType] {
        &[AssetType::Mod, AssetType::Plugin]
    }

    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let mut url = format!(
            "{}/search?query={}&limit={}",
            self.base_url,
            urlencoding::encode(query),
            SEARCH_LIMIT
        );
        if let Some(facets) = loader_facets(&options.loaders) {
            url.push_str(&format!("&facets={}", urlencoding::encode(&facets)));
        }

        let response: SearchResponse = match http::fetch_json(&self.client, &url).await {
            Ok(response) => response,
            Err(e) if e.is_no_results() => {
                debug!("Modrinth returned no results for '{}'", query);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut results: Vec<SearchResult> = response
            .hits
            .into_iter()
            .map(|hit| self.to_search_result(hit))
            .collect();

        let latest = join_all(
            results
                .iter()
                .take(MAX_ENRICHED_RESULTS)
                .map(|r| self.true_latest(&r.id, &options.loaders)),
        )
        .await;

        for (result, version) in results.iter_mut().zip(latest) {
            if let Some(version) = version {
                result.version = version;
            }
        }

        Ok(results)
    }

    async fn get_resource(&self, id: &str) -> Result<DetailedResource> {
        let url = format!("{}/project/{}", self.base_url, id);
        let project: Project = http::fetch_json(&self.client, &url).await?;

        let (owner, versions) =
            futures::join!(self.fetch_owner(&project.id), self.fetch_versions(&project.id));

        let author = owner.unwrap_or_else(|e| {
            warn!("Could not resolve author of '{}': {}", id, e);
            "Unknown".to_string()
        });
        let version = versions
            .ok()
            .and_then(|v| pick_latest(&v, &[]).map(|v| v.version_number.clone()))
            .unwrap_or_default();

        let mut tags = project.categories.clone();
        tags.extend(project.loaders.iter().cloned());

        Ok(DetailedResource {
            summary: SearchResult {
                url: format!("{}/{}/{}", SITE_URL, project.project_type, project.slug),
                types: asset_types(&tags, &project.project_type),
                id: project.id,
                name: project.title,
                description: project.description,
                author,
                version,
                downloads: project.downloads,
                source: self.id().to_string(),
            },
            tested_versions: project.game_versions,
            external: false,
            premium: false,
        })
    }

    async fn get_versions(&self, id: &str) -> Result<Vec<VersionEntry>> {
        let versions = self.fetch_versions(id).await?;
        Ok(versions
            .into_iter()
            .map(|v| VersionEntry {
                released_at: v.published(),
                id: v.id,
                display_name: v.version_number,
                downloads: v.downloads,
                game_versions: Some(v.game_versions),
                loaders: v.loaders,
            })
            .collect())
    }

    async fn get_latest_version(&self, id: &str, loaders: &[String]) -> Result<VersionInfo> {
        let versions = self.compatible_versions(id, loaders).await?;
        let latest = versions
            .iter()
            .max_by_key(|v| v.published())
            .ok_or_else(|| RepositoryError::not_found(format!("versions of '{}'", id)))?;

        Self::to_version_info(id, latest)
    }

    async fn get_version_download(
        &self,
        id: &str,
        version: &str,
        loaders: &[String],
    ) -> Result<VersionInfo> {
        let versions = self.compatible_versions(id, loaders).await?;
        let found = versions
            .iter()
            .find(|v| v.version_number == version || v.id == version)
            .ok_or_else(|| {
                RepositoryError::not_found(format!("version '{}' of '{}'", version, id))
            })?;

        Self::to_version_info(id, found)
    }
}
