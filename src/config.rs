// Config module for shared configuration utilities

use crate::constants::{MANIFEST_FILE, PLUGINS_DIR, REPOSITORIES_FILE};
use crate::sources::generic::GenericRepositoryConfig;
use crate::sources::github::ReleaseRepo;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub fn config_dir() -> String {
    std::env::var("CRAFTPM_DIR").unwrap_or_else(|_| ".".to_string())
}

fn in_config_dir(file: &str) -> String {
    let dir = config_dir();
    if dir == "." {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

pub fn plugins_dir() -> String {
    in_config_dir(PLUGINS_DIR)
}

pub fn manifest_path() -> String {
    in_config_dir(MANIFEST_FILE)
}

pub fn repositories_path() -> String {
    in_config_dir(REPOSITORIES_FILE)
}

/// Token sent to GitHub when present, raising the anonymous rate limit
pub fn github_token() -> Option<String> {
    std::env::var("GITHUB_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: crate::sources::http::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitHubSettings {
    #[serde(default)]
    pub repositories: Vec<ReleaseRepo>,
}

/// Contents of `repositories.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub github: GitHubSettings,
    #[serde(default, rename = "repository")]
    pub repositories: Vec<GenericRepositoryConfig>,
}

impl RepositoryConfig {
    /// Load from the config directory. A missing file means built-ins only.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new(&repositories_path()))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::debug!("No repository configuration at {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.settings.timeout_secs.max(1))
    }
}
