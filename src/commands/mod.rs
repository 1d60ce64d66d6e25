// Commands module with the state shared by every subcommand

use crate::config::{self, RepositoryConfig};
use crate::manifest::Manifest;
use crate::sources::source_spec;
use crate::sources::source_trait::Repository;
use crate::sources::search::{exact_match_index, rank_search_results_stable};
use crate::sources::{RepositoryRegistry, SearchOptions, http, loaders};
use log::debug;
use reqwest::Client;
use std::sync::Arc;

pub mod add;
pub mod info;
pub mod init;
pub mod outdated;
pub mod remove;
pub mod repos;
pub mod search;
pub mod update;
pub mod versions;

/// Everything a command needs for one run
pub struct Context {
    pub client: Client,
    pub registry: RepositoryRegistry,
}

impl Context {
    pub fn load() -> anyhow::Result<Self> {
        let config = RepositoryConfig::load()?;
        let client = http::build_client(config.timeout())?;
        let registry = RepositoryRegistry::from_config(&client, &config, config::github_token());
        debug!("{} repositories registered", registry.all().len());
        Ok(Self { client, registry })
    }
}

pub fn load_manifest() -> anyhow::Result<Manifest> {
    Manifest::load().map_err(|e| {
        debug!("Manifest load failed: {:#}", e);
        anyhow::anyhow!("Manifest not found. Run 'craftpm init' first.")
    })
}

/// Loader tags for the manifest's server, or none without a manifest
pub fn manifest_loaders() -> Vec<String> {
    Manifest::load()
        .map(|m| loaders::compatible_loaders(&m.server.implementation))
        .unwrap_or_default()
}

/// A resource addressed by the user, resolved to one repository
pub struct Target<'a> {
    pub repository: &'a Arc<dyn Repository>,
    pub id: String,
    pub version: Option<String>,
}

/// Resolve `source:id@version` or a free-text query to a single resource.
///
/// Free text goes through every repository and must match a name exactly.
pub async fn resolve_target<'a>(
    registry: &'a RepositoryRegistry,
    spec: &str,
    loaders: &[String],
) -> anyhow::Result<Target<'a>> {
    let parsed = source_spec::parse(spec);
    if parsed.is_empty() {
        anyhow::bail!("Nothing to look up: expected 'source:id[@version]' or a name");
    }

    if let Some(source) = parsed.source
        && let Some(id) = parsed.resource_id
    {
        let repository_id = source
            .repository_id()
            .ok_or_else(|| anyhow::anyhow!("Source '{}' has no remote repository", source))?;
        return Ok(Target {
            repository: registry.get_or_error(repository_id)?,
            id,
            version: parsed.version,
        });
    }

    let query = parsed.query.unwrap_or_default();

    // Configured repositories are addressable by their id as a prefix
    if let Some((prefix, id)) = query.split_once(':')
        && !id.is_empty()
        && let Some(repository) = registry.get(prefix)
    {
        return Ok(Target {
            repository,
            id: id.to_string(),
            version: parsed.version,
        });
    }

    let mut results = registry
        .search_all(&query, &SearchOptions::with_loaders(loaders.to_vec()))
        .await;
    rank_search_results_stable(&mut results, &query);

    match exact_match_index(&results, &query) {
        Some(index) => {
            let hit = &results[index];
            debug!("'{}' resolved to {}:{}", query, hit.source, hit.id);
            Ok(Target {
                repository: registry.get_or_error(&hit.source)?,
                id: hit.id.clone(),
                version: parsed.version,
            })
        }
        None if results.is_empty() => anyhow::bail!("No resource named '{}' found", query),
        None => {
            let suggestions = results
                .iter()
                .take(5)
                .map(|r| format!("{}:{}", r.source, r.id))
                .collect::<Vec<_>>()
                .join(", ");
            anyhow::bail!(
                "No exact match for '{}'. Did you mean one of: {}",
                query,
                suggestions
            )
        }
    }
}

/// Manifest key for a resource name: lower-case, spaces as hyphens
pub fn dependency_name(name: &str) -> String {
    name.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}
