// Manifest module for the project descriptor and installed dependencies

use crate::config;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub server: ServerSpec,
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencyRecord>,
}

/// The server the dependencies are installed into
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSpec {
    /// Server implementation, e.g. "paper" or "fabric"
    pub implementation: String,
    /// Declared game version, e.g. "1.20.1"
    pub version: String,
}

/// Where an installed dependency came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Spigot,
    Modrinth,
    #[serde(rename = "github")]
    GitHub,
    Filesystem,
    Private,
}

impl SourceKind {
    /// Id of the built-in repository serving this source, if any
    pub fn repository_id(&self) -> Option<&'static str> {
        match self {
            SourceKind::Spigot => Some("spigot"),
            SourceKind::Modrinth => Some("modrinth"),
            SourceKind::GitHub => Some("github"),
            SourceKind::Filesystem | SourceKind::Private => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Spigot => "spigot",
            SourceKind::Modrinth => "modrinth",
            SourceKind::GitHub => "github",
            SourceKind::Filesystem => "filesystem",
            SourceKind::Private => "private",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub source: SourceKind,
    pub id: String,
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Configured repository id, only for `private` sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

impl DependencyRecord {
    /// Record for an artifact installed from the repository with id `repository_id`
    pub fn from_repository(
        repository_id: &str,
        id: impl Into<String>,
        version: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        let (source, repository) = match repository_id {
            "spigot" => (SourceKind::Spigot, None),
            "modrinth" => (SourceKind::Modrinth, None),
            "github" => (SourceKind::GitHub, None),
            other => (SourceKind::Private, Some(other.to_string())),
        };
        Self {
            source,
            id: id.into(),
            version: Some(version.into()),
            file_name: Some(file_name.into()),
            repository,
        }
    }

    /// Repository id to query for this record
    pub fn repository_id(&self) -> Option<&str> {
        match self.source {
            SourceKind::Private => self.repository.as_deref(),
            other => other.repository_id(),
        }
    }
}

impl Manifest {
    pub fn new(implementation: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            server: ServerSpec {
                implementation: implementation.into(),
                version: version.into(),
            },
            dependencies: BTreeMap::new(),
        }
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new(&config::manifest_path()))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(config::config_dir())?;
        self.save_to(Path::new(&config::manifest_path()))
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_toml_layout() {
        let text = r#"
            [server]
            implementation = "paper"
            version = "1.20.1"

            [dependencies.viaversion]
            source = "modrinth"
            id = "P1OZGk5p"
            version = "5.1.0"
            file_name = "ViaVersion-5.1.0.jar"

            [dependencies.shop]
            source = "private"
            id = "42"
            version = "1.0"
            repository = "polymart"

            [dependencies.local]
            source = "filesystem"
            id = "Local.jar"
            version = "1.0"
        "#;

        let manifest: Manifest = toml::from_str(text).unwrap();
        assert_eq!(manifest.server.implementation, "paper");
        assert_eq!(manifest.dependencies.len(), 3);

        let via = &manifest.dependencies["viaversion"];
        assert_eq!(via.source, SourceKind::Modrinth);
        assert_eq!(via.repository_id(), Some("modrinth"));

        assert_eq!(manifest.dependencies["shop"].repository_id(), Some("polymart"));
        assert_eq!(manifest.dependencies["local"].repository_id(), None);
    }

    #[test]
    fn test_github_source_tag() {
        let record: DependencyRecord =
            toml::from_str("source = \"github\"\nid = \"a/b\"\nversion = \"v1\"").unwrap();
        assert_eq!(record.source, SourceKind::GitHub);
        assert_eq!(record.source.to_string(), "github");
    }

    #[test]
    fn test_from_repository() {
        let record = DependencyRecord::from_repository("github", "a/b", "v1", "b.jar");
        assert_eq!(record.source, SourceKind::GitHub);
        assert_eq!(record.repository_id(), Some("github"));

        let record = DependencyRecord::from_repository("polymart", "42", "1.0", "shop.jar");
        assert_eq!(record.source, SourceKind::Private);
        assert_eq!(record.repository_id(), Some("polymart"));
    }

    #[test]
    fn test_save_and_load_in_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("craftpm.toml");

        let mut manifest = Manifest::new("paper", "1.20.1");
        manifest.dependencies.insert(
            "luckperms".to_string(),
            DependencyRecord::from_repository("modrinth", "Vebnzrzj", "5.4.0", "LuckPerms.jar"),
        );
        manifest.save_to(&path).unwrap();

        let loaded = Manifest::load_from(&path).unwrap();
        assert_eq!(loaded.server.version, "1.20.1");
        assert_eq!(loaded.dependencies["luckperms"], manifest.dependencies["luckperms"]);
    }

    #[test]
    fn test_empty_dependencies_default() {
        let manifest: Manifest =
            toml::from_str("[server]\nimplementation = \"fabric\"\nversion = \"1.21\"").unwrap();
        assert!(manifest.dependencies.is_empty());
    }
}
