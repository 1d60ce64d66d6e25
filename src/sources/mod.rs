// Sources module for plugin repository implementations

use crate::config::RepositoryConfig;
use crate::error::{RepositoryError, Result};
use futures::future::join_all;
use log::{debug, warn};
use reqwest::Client;
use std::sync::Arc;

pub mod generic;
pub mod github;
pub mod hash;
pub mod http;
pub mod loaders;
pub mod modrinth;
pub mod search;
pub mod source_spec;
pub mod source_trait;
pub mod spigot;
pub mod version_compare;
pub mod version_matcher;

pub use generic::GenericSource;
pub use github::GitHubSource;
pub use modrinth::ModrinthSource;
pub use source_trait::{Repository, SearchOptions, SearchResult};
pub use spigot::SpigotSource;

/// The repositories available for one run, in registration order
#[derive(Default)]
pub struct RepositoryRegistry {
    repositories: Vec<Arc<dyn Repository>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in repositories followed by the configured ones.
    ///
    /// Priority: modrinth > spigot > github > configured
    pub fn from_config(client: &Client, config: &RepositoryConfig, token: Option<String>) -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(ModrinthSource::new(client.clone())));
        registry.register(Arc::new(SpigotSource::new(client.clone())));
        registry.register(Arc::new(GitHubSource::new(
            client.clone(),
            &config.github.repositories,
            token,
        )));

        for generic in &config.repositories {
            if registry.get(&generic.id).is_some() {
                warn!("Configured repository '{}' replaces the built-in one", generic.id);
            }
            registry.register(Arc::new(GenericSource::new(client.clone(), generic.clone())));
        }

        registry
    }

    /// Add a repository. One with the same id is replaced in place.
    pub fn register(&mut self, repository: Arc<dyn Repository>) {
        match self
            .repositories
            .iter_mut()
            .find(|r| r.id() == repository.id())
        {
            Some(slot) => *slot = repository,
            None => self.repositories.push(repository),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Repository>> {
        self.repositories.iter().find(|r| r.id() == id)
    }

    pub fn get_or_error(&self, id: &str) -> Result<&Arc<dyn Repository>> {
        self.get(id).ok_or_else(|| {
            RepositoryError::UnsupportedSource(format!(
                "'{}'. Available repositories: {}",
                id,
                self.repositories
                    .iter()
                    .map(|r| r.id())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
    }

    pub fn all(&self) -> &[Arc<dyn Repository>] {
        &self.repositories
    }

    /// Search every repository concurrently.
    ///
    /// A failing repository is logged and contributes nothing; the rest still count.
    pub async fn search_all(&self, query: &str, options: &SearchOptions) -> Vec<SearchResult> {
        let searches = self.repositories.iter().map(|repo| async move {
            match repo.search(query, options).await {
                Ok(results) => {
                    debug!("{}: {} results for '{}'", repo.id(), results.len(), query);
                    results
                }
                Err(e) => {
                    warn!("Search in {} failed: {}", repo.display_name(), e);
                    Vec::new()
                }
            }
        });

        join_all(searches).await.into_iter().flatten().collect()
    }
}
