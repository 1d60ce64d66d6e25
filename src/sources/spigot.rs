// Spigot source implementation (via Spiget API)

use crate::error::{RepositoryError, Result};
use crate::sources::http;
use crate::sources::search;
use crate::sources::source_trait::{
    AssetType, DetailedResource, Repository, SearchOptions, SearchResult, VersionEntry,
    VersionInfo,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeSet;

pub const DEFAULT_BASE_URL: &str = "https://api.spiget.org/v2";
const SITE_URL: &str = "https://www.spigotmc.org/resources";

const SEARCH_LIMIT: usize = 20;

/// Hits that get author and latest version names filled in
const MAX_ENRICHED_RESULTS: usize = 10;

#[derive(Debug, Deserialize)]
struct IdRef {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ResourceFile {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    id: i64,
    name: String,
    #[serde(default)]
    tag: String,
    #[serde(default)]
    downloads: u64,
    author: Option<IdRef>,
    #[serde(rename = "testedVersions", default)]
    tested_versions: Vec<String>,
    #[serde(default)]
    premium: bool,
    #[serde(default)]
    external: bool,
    file: Option<ResourceFile>,
}

impl Resource {
    fn is_external(&self) -> bool {
        self.external
            || self
                .file
                .as_ref()
                .and_then(|f| f.kind.as_deref())
                .is_some_and(|k| k.eq_ignore_ascii_case("external"))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Version {
    id: i64,
    name: String,
    #[serde(rename = "releaseDate")]
    release_date: i64,
    #[serde(default)]
    downloads: u64,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

impl search::Searchable for Resource {
    fn search_name(&self) -> &str {
        &self.name
    }
}

pub struct SpigotSource {
    client: Client,
    base_url: String,
}

impl SpigotSource {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Spiget answers 404 when a search has no hits
    async fn search_resources(&self, query: &str) -> Result<Vec<Resource>> {
        let url = format!(
            "{}/search/resources/{}?size={}&sort=-downloads",
            self.base_url,
            urlencoding::encode(query),
            SEARCH_LIMIT
        );

        match http::fetch_json(&self.client, &url).await {
            Ok(results) => Ok(results),
            Err(e) if e.is_no_results() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Search for a resource by name with hyphen variations
    async fn find_by_name(&self, name: &str) -> Result<i64> {
        let mut search_terms = vec![name.to_string()];
        if name.contains('-') {
            search_terms.push(name.replace('-', " "));
        }

        for term in &search_terms {
            let mut results = self.search_resources(term).await?;
            if !results.is_empty() {
                search::rank_search_results(&mut results, name);
                return Ok(results[0].id);
            }
        }

        Err(RepositoryError::not_found(format!(
            "No resources found matching '{}' in Spigot",
            name
        )))
    }

    /// Parse a numeric resource id, or look the name up
    async fn resolve_resource_id(&self, id: &str) -> Result<i64> {
        let id = id.trim();
        if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
            return id
                .parse::<i64>()
                .map_err(|e| RepositoryError::invalid_id(id, e.to_string()));
        }
        if id.is_empty() {
            return Err(RepositoryError::invalid_id(id, "Spigot resource id cannot be empty"));
        }
        self.find_by_name(id).await
    }

    async fn fetch_resource(&self, resource_id: i64) -> Result<Resource> {
        let url = format!("{}/resources/{}", self.base_url, resource_id);
        http::fetch_json(&self.client, &url).await
    }

    async fn fetch_versions(&self, resource_id: i64) -> Result<Vec<Version>> {
        let url = format!(
            "{}/resources/{}/versions?size=1000&sort=-releaseDate",
            self.base_url, resource_id
        );
        http::fetch_json(&self.client, &url).await
    }

    async fn fetch_latest(&self, resource_id: i64) -> Result<Version> {
        let url = format!("{}/resources/{}/versions/latest", self.base_url, resource_id);
        http::fetch_json(&self.client, &url).await
    }

    async fn author_name(&self, author: Option<&IdRef>) -> String {
        let Some(author) = author else {
            return "Unknown".to_string();
        };
        let url = format!("{}/authors/{}", self.base_url, author.id);
        match http::fetch_json::<Author>(&self.client, &url).await {
            Ok(author) => author.name,
            Err(e) => {
                debug!("Could not resolve Spigot author {}: {}", author.id, e);
                "Unknown".to_string()
            }
        }
    }

    /// Author and latest version names for one search hit
    async fn enrich(&self, resource: &Resource) -> (String, String) {
        let (author, latest) = futures::join!(
            self.author_name(resource.author.as_ref()),
            self.fetch_latest(resource.id)
        );
        let version = latest.map(|v| v.name).unwrap_or_default();
        (author, version)
    }

    fn to_search_result(&self, resource: &Resource) -> SearchResult {
        SearchResult {
            id: resource.id.to_string(),
            name: resource.name.clone(),
            description: resource.tag.clone(),
            author: "Unknown".to_string(),
            version: String::new(),
            downloads: resource.downloads,
            source: self.id().to_string(),
            url: format!("{}/{}/", SITE_URL, resource.id),
            types: BTreeSet::from([AssetType::Plugin]),
        }
    }

    /// Download endpoint for a concrete version id, never the "latest" alias
    fn to_version_info(&self, resource: &Resource, version: &Version) -> VersionInfo {
        VersionInfo {
            resource_id: resource.id.to_string(),
            version: version.name.clone(),
            download_url: format!(
                "{}/resources/{}/versions/{}/download",
                self.base_url, resource.id, version.id
            ),
            file_name: format!(
                "{}-{}.jar",
                http::sanitize_file_name(&resource.name),
                http::sanitize_file_name(&version.name)
            ),
            hash: None,
        }
    }
}

fn released_at(unix_seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(unix_seconds, 0)
}

#[async_trait]
impl Repository for SpigotSource {
    fn id(&self) -> &str {
        "spigot"
    }

    fn display_name(&self) -> &str {
        "SpigotMC"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn asset_types(&self) -> &[AssetType] {
        &[AssetType::Plugin]
    }

    async fn search(&self, query: &str, _options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let resources = self.search_resources(query).await?;

        let details = join_all(
            resources
                .iter()
                .take(MAX_ENRICHED_RESULTS)
                .map(|r| self.enrich(r)),
        )
        .await;

        let mut results: Vec<SearchResult> =
            resources.iter().map(|r| self.to_search_result(r)).collect();
        for (result, (author, version)) in results.iter_mut().zip(details) {
            result.author = author;
            result.version = version;
        }

        Ok(results)
    }

    async fn get_resource(&self, id: &str) -> Result<DetailedResource> {
        let resource_id = self.resolve_resource_id(id).await?;
        let resource = self.fetch_resource(resource_id).await?;
        let (author, version) = self.enrich(&resource).await;

        let mut summary = self.to_search_result(&resource);
        summary.author = author;
        summary.version = version;

        Ok(DetailedResource {
            summary,
            external: resource.is_external(),
            premium: resource.premium,
            tested_versions: resource.tested_versions,
        })
    }

    async fn get_versions(&self, id: &str) -> Result<Vec<VersionEntry>> {
        let resource_id = self.resolve_resource_id(id).await?;
        let versions = self.fetch_versions(resource_id).await?;

        Ok(versions
            .into_iter()
            .map(|v| VersionEntry {
                id: v.id.to_string(),
                display_name: v.name,
                released_at: released_at(v.release_date),
                downloads: v.downloads,
                // Spiget only reports tested game versions per resource
                game_versions: None,
                loaders: Vec::new(),
            })
            .collect())
    }

    async fn get_latest_version(&self, id: &str, _loaders: &[String]) -> Result<VersionInfo> {
        let resource_id = self.resolve_resource_id(id).await?;
        let (resource, latest) =
            futures::join!(self.fetch_resource(resource_id), self.fetch_latest(resource_id));

        Ok(self.to_version_info(&resource?, &latest?))
    }

    async fn get_version_download(
        &self,
        id: &str,
        version: &str,
        _loaders: &[String],
    ) -> Result<VersionInfo> {
        let resource_id = self.resolve_resource_id(id).await?;
        let (resource, versions) =
            futures::join!(self.fetch_resource(resource_id), self.fetch_versions(resource_id));
        let resource = resource?;

        let found = versions?
            .into_iter()
            .find(|v| v.name == version || v.id.to_string() == version)
            .ok_or_else(|| {
                RepositoryError::not_found(format!(
                    "version '{}' of Spigot resource {}",
                    version, resource_id
                ))
            })?;

        Ok(self.to_version_info(&resource, &found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn source(server: &Server) -> SpigotSource {
        let client = http::build_client(http::DEFAULT_TIMEOUT).unwrap();
        SpigotSource::with_base_url(client, &server.url())
    }

    const RESOURCE: &str = r#"{"id": 19254, "name": "ViaVersion", "tag": "Newer versions on older servers",
        "downloads": 1000, "author": {"id": 7}, "testedVersions": ["1.19", "1.20"],
        "premium": false, "external": false, "file": {"type": ".jar"}}"#;

    #[tokio::test]
    async fn test_search_enriches_author_and_version() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("GET", "/search/resources/ViaVersion")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(format!("[{}]", RESOURCE))
            .create_async()
            .await;
        let _author = server
            .mock("GET", "/authors/7")
            .with_status(200)
            .with_body(r#"{"id": 7, "name": "_MylesC"}"#)
            .create_async()
            .await;
        let _latest = server
            .mock("GET", "/resources/19254/versions/latest")
            .with_status(200)
            .with_body(r#"{"id": 555, "name": "5.1.0", "releaseDate": 1700000000}"#)
            .create_async()
            .await;

        let results = source(&server)
            .search("ViaVersion", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "19254");
        assert_eq!(results[0].author, "_MylesC");
        assert_eq!(results[0].version, "5.1.0");
        assert_eq!(results[0].url, "https://www.spigotmc.org/resources/19254/");
        assert_eq!(results[0].types, BTreeSet::from([AssetType::Plugin]));
    }

    #[tokio::test]
    async fn test_search_404_means_no_results() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("GET", "/search/resources/nothing")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error": "no results"}"#)
            .create_async()
            .await;

        let results = source(&server)
            .search("nothing", &SearchOptions::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_degrades_enrichment_failures() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("GET", "/search/resources/ViaVersion")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(format!("[{}]", RESOURCE))
            .create_async()
            .await;
        let _author = server
            .mock("GET", "/authors/7")
            .with_status(500)
            .create_async()
            .await;
        let _latest = server
            .mock("GET", "/resources/19254/versions/latest")
            .with_status(500)
            .create_async()
            .await;

        let results = source(&server)
            .search("ViaVersion", &SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(results[0].author, "Unknown");
        assert_eq!(results[0].version, "");
    }

    #[tokio::test]
    async fn test_get_resource_flags() {
        let mut server = Server::new_async().await;
        let _resource = server
            .mock("GET", "/resources/100")
            .with_status(200)
            .with_body(
                r#"{"id": 100, "name": "Paid Thing", "premium": true,
                    "file": {"type": "external", "externalUrl": "https://example.com"}}"#,
            )
            .create_async()
            .await;
        let _latest = server
            .mock("GET", "/resources/100/versions/latest")
            .with_status(200)
            .with_body(r#"{"id": 1, "name": "1.0", "releaseDate": 1}"#)
            .create_async()
            .await;

        let resource = source(&server).get_resource("100").await.unwrap();
        assert!(resource.premium);
        assert!(resource.external);
        assert_eq!(resource.summary.author, "Unknown");
        assert!(resource.ensure_installable().is_err());
    }

    #[tokio::test]
    async fn test_get_resource_by_name_uses_exact_match() {
        let mut server = Server::new_async().await;
        let _search = server
            .mock("GET", "/search/resources/ViaVersion")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"[{"id": 1, "name": "ViaVersion Addon"},
                    {"id": 19254, "name": "ViaVersion"}]"#,
            )
            .create_async()
            .await;
        let _resource = server
            .mock("GET", "/resources/19254")
            .with_status(200)
            .with_body(RESOURCE)
            .create_async()
            .await;
        let _author = server
            .mock("GET", "/authors/7")
            .with_status(200)
            .with_body(r#"{"id": 7, "name": "_MylesC"}"#)
            .create_async()
            .await;
        let _latest = server
            .mock("GET", "/resources/19254/versions/latest")
            .with_status(200)
            .with_body(r#"{"id": 555, "name": "5.1.0", "releaseDate": 1700000000}"#)
            .create_async()
            .await;

        let resource = source(&server).get_resource("ViaVersion").await.unwrap();
        assert_eq!(resource.summary.id, "19254");
        assert_eq!(resource.tested_versions, vec!["1.19", "1.20"]);
        assert!(resource.ensure_installable().is_ok());
    }

    #[tokio::test]
    async fn test_get_versions() {
        let mut server = Server::new_async().await;
        let _versions = server
            .mock("GET", "/resources/19254/versions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"[{"id": 2, "name": "5.1.0", "releaseDate": 1700000000, "downloads": 9},
                    {"id": 1, "name": "5.0.0", "releaseDate": 1600000000}]"#,
            )
            .create_async()
            .await;

        let versions = source(&server).get_versions("19254").await.unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].display_name, "5.1.0");
        assert_eq!(versions[0].downloads, 9);
        assert_eq!(versions[0].game_versions, None);
        assert_eq!(
            versions[1].released_at,
            DateTime::from_timestamp(1600000000, 0)
        );
    }

    #[tokio::test]
    async fn test_get_latest_version_uses_concrete_version_id() {
        let mut server = Server::new_async().await;
        let _resource = server
            .mock("GET", "/resources/19254")
            .with_status(200)
            .with_body(RESOURCE)
            .create_async()
            .await;
        let _latest = server
            .mock("GET", "/resources/19254/versions/latest")
            .with_status(200)
            .with_body(r#"{"id": 555, "name": "5.1.0", "releaseDate": 1700000000}"#)
            .create_async()
            .await;

        let source = source(&server);
        let info = source.get_latest_version("19254", &[]).await.unwrap();
        assert_eq!(info.version, "5.1.0");
        assert_eq!(info.file_name, "ViaVersion-5.1.0.jar");
        assert_eq!(
            info.download_url,
            format!("{}/resources/19254/versions/555/download", server.url())
        );
        assert_eq!(info.hash, None);
    }

    #[tokio::test]
    async fn test_get_version_download_missing_version() {
        let mut server = Server::new_async().await;
        let _resource = server
            .mock("GET", "/resources/19254")
            .with_status(200)
            .with_body(RESOURCE)
            .create_async()
            .await;
        let _versions = server
            .mock("GET", "/resources/19254/versions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"id": 1, "name": "5.0.0", "releaseDate": 1}]"#)
            .create_async()
            .await;

        let source = source(&server);
        let found = source.get_version_download("19254", "5.0.0", &[]).await.unwrap();
        assert_eq!(found.version, "5.0.0");

        let missing = source.get_version_download("19254", "9.9.9", &[]).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_id_is_invalid() {
        let server = Server::new_async().await;
        let result = source(&server).get_versions("  ").await;
        assert!(matches!(result, Err(RepositoryError::InvalidId { .. })));
    }
}
