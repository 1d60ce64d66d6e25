// GitHub Releases source implementation

use crate::error::{RepositoryError, Result};
use crate::sources::http;
use crate::sources::search::{self, ParsedId};
use crate::sources::source_trait::{
    AssetType, DetailedResource, Repository, SearchOptions, SearchResult, VersionEntry,
    VersionInfo,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Extension of the artifacts picked from release assets
const ARCHIVE_EXTENSION: &str = ".jar";

/// A release repository the user asked to track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReleaseRepo {
    /// "owner/repo" or a full repository URL
    Url(String),
    Named { url: String, name: String },
}

impl ReleaseRepo {
    pub fn url(&self) -> &str {
        match self {
            ReleaseRepo::Url(url) => url,
            ReleaseRepo::Named { url, .. } => url,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ReleaseRepo::Url(_) => None,
            ReleaseRepo::Named { name, .. } => Some(name),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    full_name: String,
    name: String,
    description: Option<String>,
    owner: Owner,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    published_at: Option<String>,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
    #[serde(default)]
    download_count: u64,
}

impl Release {
    fn downloads(&self) -> u64 {
        self.assets.iter().map(|a| a.download_count).sum()
    }

    fn published(&self) -> Option<DateTime<Utc>> {
        self.published_at
            .as_deref()
            .and_then(|p| DateTime::parse_from_rfc3339(p).ok())
            .map(|d| d.with_timezone(&Utc))
    }
}

/// Tags to try for a requested version: as given, with a "v" prefix, without it
fn tag_candidates(version: &str) -> Vec<String> {
    let mut tags = vec![version.to_string()];
    match version.strip_prefix('v') {
        Some(stripped) if !stripped.is_empty() => tags.push(stripped.to_string()),
        _ => tags.push(format!("v{}", version)),
    }
    tags.dedup();
    tags
}

/// A configured repository with its resolved coordinates
#[derive(Debug, Clone)]
struct Tracked {
    owner: String,
    repo: String,
    name: Option<String>,
}

impl Tracked {
    fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.full_name().to_lowercase().contains(&query)
            || self
                .name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&query))
    }
}

pub struct GitHubSource {
    client: Client,
    base_url: String,
    token: Option<String>,
    tracked: Vec<Tracked>,
}

impl GitHubSource {
    pub fn new(client: Client, repositories: &[ReleaseRepo], token: Option<String>) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL, repositories, token)
    }

    pub fn with_base_url(
        client: Client,
        base_url: &str,
        repositories: &[ReleaseRepo],
        token: Option<String>,
    ) -> Self {
        let tracked = repositories
            .iter()
            .filter_map(|entry| match search::parse_owner_name_id(entry.url()) {
                ParsedId::Full { owner, name } => Some(Tracked {
                    owner,
                    repo: name,
                    name: entry.name().map(str::to_string),
                }),
                ParsedId::SearchTerm(term) => {
                    warn!("Ignoring GitHub repository '{}': expected owner/repo", term);
                    None
                }
            })
            .collect();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            tracked,
        }
    }

    fn parse_id(id: &str) -> Result<(String, String)> {
        match search::parse_owner_name_id(id) {
            ParsedId::Full { owner, name } => Ok((owner, name)),
            ParsedId::SearchTerm(_) => Err(RepositoryError::invalid_id(
                id,
                "expected 'owner/repo' or a GitHub repository URL",
            )),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        http::fetch_json_with(&self.client, &url, http::github_headers(self.token.as_deref()))
            .await
    }

    async fn fetch_repo(&self, owner: &str, repo: &str) -> Result<RepoInfo> {
        self.get(&format!("/repos/{}/{}", owner, repo)).await
    }

    async fn fetch_latest_release(&self, owner: &str, repo: &str) -> Result<Release> {
        self.get(&format!("/repos/{}/{}/releases/latest", owner, repo))
            .await
    }

    async fn fetch_release_by_tag(&self, owner: &str, repo: &str, tag: &str) -> Result<Release> {
        self.get(&format!(
            "/repos/{}/{}/releases/tags/{}",
            owner,
            repo,
            urlencoding::encode(tag)
        ))
        .await
    }

    /// Repository metadata plus latest release, or None if the repository is inaccessible
    async fn describe(&self, tracked: &Tracked) -> Option<SearchResult> {
        let (info, latest) = futures::join!(
            self.fetch_repo(&tracked.owner, &tracked.repo),
            self.fetch_latest_release(&tracked.owner, &tracked.repo)
        );

        let info = match info {
            Ok(info) => info,
            Err(e) => {
                debug!("Skipping GitHub repository {}: {}", tracked.full_name(), e);
                return None;
            }
        };

        let mut result = self.to_search_result(info, latest.ok());
        if let Some(name) = &tracked.name {
            result.name = name.clone();
        }
        Some(result)
    }

    fn to_search_result(&self, info: RepoInfo, latest: Option<Release>) -> SearchResult {
        SearchResult {
            id: info.full_name,
            name: info.name,
            description: info.description.unwrap_or_default(),
            author: info.owner.login,
            version: latest.as_ref().map(|r| r.tag_name.clone()).unwrap_or_default(),
            downloads: latest.as_ref().map(Release::downloads).unwrap_or_default(),
            source: self.id().to_string(),
            url: info.html_url,
            types: BTreeSet::from([AssetType::Plugin]),
        }
    }

    fn to_version_info(id: &str, release: &Release) -> Result<VersionInfo> {
        let asset = release
            .assets
            .iter()
            .find(|a| a.name.to_lowercase().ends_with(ARCHIVE_EXTENSION))
            .ok_or_else(|| RepositoryError::NoFilesFound {
                id: id.to_string(),
                version: release.tag_name.clone(),
            })?;

        Ok(VersionInfo {
            resource_id: id.to_string(),
            version: release.tag_name.clone(),
            download_url: asset.browser_download_url.clone(),
            file_name: asset.name.clone(),
            hash: None,
        })
    }
}

#[async_trait]
impl Repository for GitHubSource {
    fn id(&self) -> &str {
        "github"
    }

    fn display_name(&self) -> &str {
        "GitHub Releases"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn asset_types(&self) -> &[AssetType] {
        &[AssetType::Plugin, AssetType::Mod]
    }

    async fn search(&self, query: &str, _options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let matches: Vec<&Tracked> = self.tracked.iter().filter(|t| t.matches(query)).collect();
        debug!(
            "{} of {} tracked GitHub repositories match '{}'",
            matches.len(),
            self.tracked.len(),
            query
        );

        let results = join_all(matches.into_iter().map(|t| self.describe(t))).await;
        Ok(results.into_iter().flatten().collect())
    }

    async fn get_resource(&self, id: &str) -> Result<DetailedResource> {
        let (owner, repo) = Self::parse_id(id)?;
        let (info, latest) = futures::join!(
            self.fetch_repo(&owner, &repo),
            self.fetch_latest_release(&owner, &repo)
        );

        let latest = match latest {
            Ok(release) => Some(release),
            Err(RepositoryError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(DetailedResource {
            summary: self.to_search_result(info?, latest),
            tested_versions: Vec::new(),
            external: false,
            premium: false,
        })
    }

    async fn get_versions(&self, id: &str) -> Result<Vec<VersionEntry>> {
        let (owner, repo) = Self::parse_id(id)?;
        let releases: Vec<Release> = self
            .get(&format!("/repos/{}/{}/releases?per_page=100", owner, repo))
            .await?;

        Ok(releases
            .into_iter()
            .map(|r| VersionEntry {
                released_at: r.published(),
                downloads: r.downloads(),
                // installs record the tag, so compare tags rather than release titles
                display_name: r.tag_name.clone(),
                id: r.tag_name,
                game_versions: None,
                loaders: Vec::new(),
            })
            .collect())
    }

    async fn get_latest_version(&self, id: &str, _loaders: &[String]) -> Result<VersionInfo> {
        let (owner, repo) = Self::parse_id(id)?;
        let release = self.fetch_latest_release(&owner, &repo).await?;
        Self::to_version_info(&format!("{}/{}", owner, repo), &release)
    }

    async fn get_version_download(
        &self,
        id: &str,
        version: &str,
        _loaders: &[String],
    ) -> Result<VersionInfo> {
        let (owner, repo) = Self::parse_id(id)?;
        let full_name = format!("{}/{}", owner, repo);

        for tag in tag_candidates(version) {
            match self.fetch_release_by_tag(&owner, &repo, &tag).await {
                Ok(release) => return Self::to_version_info(&full_name, &release),
                Err(RepositoryError::NotFound(_)) => {
                    debug!("No release tagged '{}' in {}", tag, full_name);
                }
                Err(e) => return Err(e),
            }
        }

        Err(RepositoryError::not_found(format!(
            "release '{}' of {}",
            version, full_name
        )))
    }
}
