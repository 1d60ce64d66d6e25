// Generic JSON source driven by a repository configuration record

use crate::error::{RepositoryError, Result};
use crate::sources::http;
use crate::sources::source_trait::{
    AssetType, DetailedResource, Repository, SearchOptions, SearchResult, VersionEntry,
    VersionInfo,
};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// A user-configured repository speaking an arbitrary JSON API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericRepositoryConfig {
    pub id: String,
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_types")]
    pub types: Vec<AssetType>,
    pub endpoints: Endpoints,
    #[serde(default)]
    pub mapping: FieldMapping,
}

fn default_types() -> Vec<AssetType> {
    vec![AssetType::Plugin]
}

/// URL templates. Relative templates are appended to `base_url`.
///
/// Placeholders: `{{query}}` (URL-encoded), `{{id}}`, `{{version}}`, `{{fileName}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    pub search: String,
    pub resource: String,
    pub latest: String,
    /// Direct download template; when absent the latest record must carry a URL
    pub download: Option<String>,
}

/// Dot paths into response bodies, e.g. `data.items` or `files.0.url`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    /// Path to the result array in search responses; the body itself when unset
    pub results_path: Option<String>,
    pub id: String,
    pub name: String,
    pub description: String,
    pub author: String,
    pub version: String,
    pub downloads: String,
    pub url: String,
    pub download_url: String,
    pub file_name: String,
    pub external: Option<String>,
    pub premium: Option<String>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            results_path: None,
            id: "id".to_string(),
            name: "name".to_string(),
            description: "description".to_string(),
            author: "author".to_string(),
            version: "version".to_string(),
            downloads: "downloads".to_string(),
            url: "url".to_string(),
            download_url: "downloadUrl".to_string(),
            file_name: "fileName".to_string(),
            external: None,
            premium: None,
        }
    }
}

/// Walk a dot path through objects and arrays.
///
/// Missing keys, out-of-range indices and JSON null yield `None`. Scalars are
/// stringified; objects and arrays collapse to an empty string.
pub fn resolve_path(value: &Value, path: &str) -> Option<String> {
    let mut current = value;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    match current {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(_) | Value::Array(_) => Some(String::new()),
    }
}

fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{}}}}}", key), value)
    })
}

pub struct GenericSource {
    client: Client,
    config: GenericRepositoryConfig,
}

impl GenericSource {
    pub fn new(client: Client, mut config: GenericRepositoryConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self { client, config }
    }

    fn url(&self, template: &str, vars: &[(&str, &str)]) -> String {
        let rendered = render(template, vars);
        if rendered.starts_with("http://") || rendered.starts_with("https://") {
            rendered
        } else if rendered.starts_with('/') {
            format!("{}{}", self.config.base_url, rendered)
        } else {
            format!("{}/{}", self.config.base_url, rendered)
        }
    }

    fn field(&self, item: &Value, path: &str) -> String {
        resolve_path(item, path).unwrap_or_default()
    }

    fn flag(&self, item: &Value, path: Option<&str>) -> bool {
        path.and_then(|p| resolve_path(item, p))
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    fn to_search_result(&self, item: &Value) -> SearchResult {
        let mapping = &self.config.mapping;
        SearchResult {
            id: self.field(item, &mapping.id),
            name: self.field(item, &mapping.name),
            description: self.field(item, &mapping.description),
            author: resolve_path(item, &mapping.author).unwrap_or_else(|| "Unknown".to_string()),
            version: self.field(item, &mapping.version),
            downloads: self.field(item, &mapping.downloads).parse().unwrap_or(0),
            source: self.config.id.clone(),
            url: self.field(item, &mapping.url),
            types: self.config.types.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn fallback_file_name(id: &str, version: &str) -> String {
        format!(
            "{}-{}.jar",
            http::sanitize_file_name(id),
            http::sanitize_file_name(version)
        )
    }

    fn download_from_template(&self, id: &str, version: &str) -> Option<VersionInfo> {
        let template = self.config.endpoints.download.as_deref()?;
        let file_name = Self::fallback_file_name(id, version);
        let download_url = self.url(
            template,
            &[("id", id), ("version", version), ("fileName", file_name.as_str())],
        );
        Some(VersionInfo {
            resource_id: id.to_string(),
            version: version.to_string(),
            download_url,
            file_name,
            hash: None,
        })
    }
}

#[async_trait]
impl Repository for GenericSource {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn display_name(&self) -> &str {
        &self.config.name
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn asset_types(&self) -> &[AssetType] {
        &self.config.types
    }

    async fn search(&self, query: &str, _options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let encoded = urlencoding::encode(query);
        let url = self.url(&self.config.endpoints.search, &[("query", encoded.as_ref())]);

        let body: Value = match http::fetch_json(&self.client, &url).await {
            Ok(body) => body,
            Err(e) if e.is_no_results() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let results = match &self.config.mapping.results_path {
            Some(path) => path
                .split('.')
                .filter(|s| !s.is_empty())
                .try_fold(&body, |v, seg| match v {
                    Value::Object(map) => map.get(seg),
                    Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
                    _ => None,
                }),
            None => Some(&body),
        };

        let Some(Value::Array(items)) = results else {
            return Err(RepositoryError::InvalidResponse {
                url,
                message: "search results are not an array".to_string(),
            });
        };

        debug!("{} returned {} results for '{}'", self.config.id, items.len(), query);
        Ok(items.iter().map(|item| self.to_search_result(item)).collect())
    }

    async fn get_resource(&self, id: &str) -> Result<DetailedResource> {
        let url = self.url(&self.config.endpoints.resource, &[("id", id)]);
        let body: Value = http::fetch_json(&self.client, &url).await?;

        let mut summary = self.to_search_result(&body);
        if summary.id.is_empty() {
            summary.id = id.to_string();
        }

        Ok(DetailedResource {
            summary,
            tested_versions: Vec::new(),
            external: self.flag(&body, self.config.mapping.external.as_deref()),
            premium: self.flag(&body, self.config.mapping.premium.as_deref()),
        })
    }

    /// Only the latest release is known, so history is a single entry
    async fn get_versions(&self, id: &str) -> Result<Vec<VersionEntry>> {
        let latest = self.get_latest_version(id, &[]).await?;
        Ok(vec![VersionEntry {
            id: latest.version.clone(),
            display_name: latest.version,
            released_at: None,
            downloads: 0,
            game_versions: None,
            loaders: Vec::new(),
        }])
    }

    async fn get_latest_version(&self, id: &str, _loaders: &[String]) -> Result<VersionInfo> {
        let url = self.url(&self.config.endpoints.latest, &[("id", id)]);
        let body: Value = http::fetch_json(&self.client, &url).await?;
        let mapping = &self.config.mapping;

        let version = resolve_path(&body, &mapping.version)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RepositoryError::InvalidResponse {
                url: url.clone(),
                message: format!("missing '{}' field", mapping.version),
            })?;

        match resolve_path(&body, &mapping.download_url).filter(|u| !u.is_empty()) {
            Some(download_url) => {
                let file_name = resolve_path(&body, &mapping.file_name)
                    .filter(|f| !f.is_empty())
                    .or_else(|| http::file_name_from_url(&download_url))
                    .unwrap_or_else(|| Self::fallback_file_name(id, &version));
                Ok(VersionInfo {
                    resource_id: id.to_string(),
                    version,
                    download_url,
                    file_name,
                    hash: None,
                })
            }
            None => self
                .download_from_template(id, &version)
                .ok_or_else(|| RepositoryError::NoFilesFound {
                    id: id.to_string(),
                    version,
                }),
        }
    }

    async fn get_version_download(
        &self,
        id: &str,
        version: &str,
        loaders: &[String],
    ) -> Result<VersionInfo> {
        if let Some(info) = self.download_from_template(id, version) {
            return Ok(info);
        }

        let latest = self.get_latest_version(id, loaders).await?;
        if latest.version == version {
            Ok(latest)
        } else {
            Err(RepositoryError::not_found(format!(
                "version '{}' of '{}' in {}",
                version, id, self.config.id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn config(base_url: &str) -> GenericRepositoryConfig {
        GenericRepositoryConfig {
            id: "acme".to_string(),
            name: "Acme Plugins".to_string(),
            base_url: format!("{}/", base_url),
            types: vec![AssetType::Plugin],
            endpoints: Endpoints {
                search: "/api/search?q={{query}}".to_string(),
                resource: "api/plugins/{{id}}".to_string(),
                latest: "/api/plugins/{{id}}/latest".to_string(),
                download: None,
            },
            mapping: FieldMapping {
                results_path: Some("data.items".to_string()),
                author: "owner.name".to_string(),
                ..FieldMapping::default()
            },
        }
    }

    fn source(config: GenericRepositoryConfig) -> GenericSource {
        let client = http::build_client(http::DEFAULT_TIMEOUT).unwrap();
        GenericSource::new(client, config)
    }

    #[test]
    fn test_resolve_path_nested() {
        let value = json!({"a": {"b": [{"c": "x"}]}});
        assert_eq!(resolve_path(&value, "a.b.0.c"), Some("x".to_string()));
    }

    #[test]
    fn test_resolve_path_missing_is_none() {
        assert_eq!(resolve_path(&json!({}), "a.b.c"), None);
        assert_eq!(resolve_path(&json!({"a": [1]}), "a.5"), None);
        assert_eq!(resolve_path(&json!({"a": [1]}), "a.x"), None);
        assert_eq!(resolve_path(&json!({"a": "s"}), "a.b"), None);
        assert_eq!(resolve_path(&json!({"a": null}), "a"), None);
    }

    #[test]
    fn test_resolve_path_coerces_to_string() {
        let value = json!({"n": 42, "b": true, "o": {"k": 1}, "l": [1, 2]});
        assert_eq!(resolve_path(&value, "n"), Some("42".to_string()));
        assert_eq!(resolve_path(&value, "b"), Some("true".to_string()));
        assert_eq!(resolve_path(&value, "o"), Some(String::new()));
        assert_eq!(resolve_path(&value, "l"), Some(String::new()));
    }

    #[test]
    fn test_render_placeholders() {
        assert_eq!(
            render(
                "/dl/{{id}}/{{version}}/{{fileName}}",
                &[("id", "x"), ("version", "1.0"), ("fileName", "x-1.0.jar")]
            ),
            "/dl/x/1.0/x-1.0.jar"
        );
        assert_eq!(render("/keep/{{other}}", &[("id", "x")]), "/keep/{{other}}");
    }

    #[test]
    fn test_url_joining() {
        let source = source(config("https://repo.example"));
        assert_eq!(
            source.url("api/x/{{id}}", &[("id", "1")]),
            "https://repo.example/api/x/1"
        );
        assert_eq!(
            source.url("/api/x", &[]),
            "https://repo.example/api/x"
        );
        assert_eq!(
            source.url("https://cdn.example/{{id}}", &[("id", "1")]),
            "https://cdn.example/1"
        );
    }

    #[test]
    fn test_config_from_toml_uses_default_mapping() {
        let config: GenericRepositoryConfig = toml::from_str(
            r#"
            id = "acme"
            name = "Acme"
            base_url = "https://repo.example"

            [endpoints]
            search = "/search?q={{query}}"
            resource = "/plugins/{{id}}"
            latest = "/plugins/{{id}}/latest"
            "#,
        )
        .unwrap();
        assert_eq!(config.types, vec![AssetType::Plugin]);
        assert_eq!(config.mapping.download_url, "downloadUrl");
        assert!(config.endpoints.download.is_none());
    }

    #[tokio::test]
    async fn test_search_maps_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/search")
            .match_query(Matcher::UrlEncoded("q".into(), "world edit".into()))
            .with_status(200)
            .with_body(
                json!({"data": {"items": [
                    {"id": 7, "name": "WorldEdit", "description": "Edit", "owner": {"name": "sk89q"},
                     "version": "7.3.0", "downloads": 1200, "url": "https://repo.example/p/7"},
                    {"id": "8", "name": "Bare", "tags": ["x"]}
                ]}})
                .to_string(),
            )
            .create_async()
            .await;

        let source = source(config(&server.url()));
        let results = source.search("world edit", &SearchOptions::default()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "7");
        assert_eq!(results[0].author, "sk89q");
        assert_eq!(results[0].downloads, 1200);
        assert_eq!(results[0].source, "acme");
        assert_eq!(results[1].author, "Unknown");
        assert_eq!(results[1].description, "");
    }

    #[tokio::test]
    async fn test_search_not_found_is_empty() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/search")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let results = source(config(&server.url()))
            .search("nothing", &SearchOptions::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_non_array() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data": {"items": {"id": 1}}}"#)
            .create_async()
            .await;

        let result = source(config(&server.url()))
            .search("x", &SearchOptions::default())
            .await;
        assert!(matches!(result, Err(RepositoryError::InvalidResponse { .. })));
    }

    #[tokio::test]
    async fn test_get_resource_flags() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/plugins/paid")
            .with_status(200)
            .with_body(r#"{"name": "Paid", "meta": {"premium": true}}"#)
            .create_async()
            .await;

        let mut config = config(&server.url());
        config.mapping.premium = Some("meta.premium".to_string());
        let resource = source(config).get_resource("paid").await.unwrap();

        assert_eq!(resource.summary.id, "paid");
        assert!(resource.premium);
        assert!(!resource.external);
        assert!(resource.ensure_installable().is_err());
    }

    #[tokio::test]
    async fn test_latest_with_url_and_synthetic_history() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/plugins/7/latest")
            .with_status(200)
            .with_body(
                r#"{"version": "7.3.0", "downloadUrl": "https://cdn.example/files/WorldEdit.jar"}"#,
            )
            .expect(2)
            .create_async()
            .await;

        let source = source(config(&server.url()));
        let info = source.get_latest_version("7", &[]).await.unwrap();
        assert_eq!(info.version, "7.3.0");
        assert_eq!(info.file_name, "WorldEdit.jar");

        let versions = source.get_versions("7").await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].id, "7.3.0");
        assert!(versions[0].game_versions.is_none());
    }

    #[tokio::test]
    async fn test_latest_without_url_or_template() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/plugins/7/latest")
            .with_status(200)
            .with_body(r#"{"version": "7.3.0"}"#)
            .create_async()
            .await;

        let result = source(config(&server.url()))
            .get_latest_version("7", &[])
            .await;
        assert!(matches!(result, Err(RepositoryError::NoFilesFound { .. })));
    }

    #[tokio::test]
    async fn test_version_download_from_template() {
        let server = Server::new_async().await;
        let mut config = config(&server.url());
        config.endpoints.download = Some("/dl/{{id}}/{{version}}/{{fileName}}".to_string());

        let info = source(config)
            .get_version_download("7", "7.2.0", &[])
            .await
            .unwrap();
        assert_eq!(info.file_name, "7-7.2.0.jar");
        assert_eq!(
            info.download_url,
            format!("{}/dl/7/7.2.0/7-7.2.0.jar", server.url())
        );
    }

    #[tokio::test]
    async fn test_version_download_without_template_requires_latest() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/plugins/7/latest")
            .with_status(200)
            .with_body(r#"{"version": "7.3.0", "downloadUrl": "https://cdn.example/a.jar"}"#)
            .expect(2)
            .create_async()
            .await;

        let source = source(config(&server.url()));
        assert!(source.get_version_download("7", "7.3.0", &[]).await.is_ok());
        let old = source.get_version_download("7", "7.2.0", &[]).await;
        assert!(matches!(old, Err(RepositoryError::NotFound(_))));
    }
}
