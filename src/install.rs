// Install module for resolving and fetching a new dependency

use crate::error::Result;
use crate::sources::hash;
use crate::sources::http;
use crate::sources::source_trait::{DetailedResource, Repository, VersionInfo};
use anyhow::Context;
use log::{debug, info};
use reqwest::Client;
use std::fs;
use std::path::{Path, PathBuf};

/// Look up a resource and the artifact to install for it.
///
/// External and premium resources stop here with `ExternalOrPremium`; no
/// download operation is called for them.
pub async fn resolve_install(
    repository: &dyn Repository,
    id: &str,
    version: Option<&str>,
    loaders: &[String],
) -> Result<(DetailedResource, VersionInfo)> {
    let resource = repository.get_resource(id).await?;
    resource.ensure_installable()?;

    let info = match version {
        Some(version) => {
            repository
                .get_version_download(id, version, loaders)
                .await?
        }
        None => repository.get_latest_version(id, loaders).await?,
    };

    debug!(
        "Resolved {} from {} to {} ({})",
        id,
        repository.id(),
        info.version,
        info.download_url
    );
    Ok((resource, info))
}

/// Download an artifact into `dir`, verifying its checksum when one is known
pub async fn download_to(
    client: &Client,
    info: &VersionInfo,
    dir: &Path,
) -> anyhow::Result<PathBuf> {
    let data = http::fetch_bytes(client, &info.download_url)
        .await
        .with_context(|| format!("Failed to download {}", info.download_url))?;

    if let Some(expected) = &info.hash {
        hash::verify(&data, expected)
            .with_context(|| format!("Checksum mismatch for {}", info.file_name))?;
    }

    fs::create_dir_all(dir)?;
    let target = dir.join(http::sanitize_file_name(&info.file_name));
    fs::write(&target, &data)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    info!("Installed {} ({} bytes)", target.display(), data.len());
    Ok(target)
}

/// Remove a previously installed artifact; a missing file is not an error
pub fn remove_file(dir: &Path, file_name: &str) -> anyhow::Result<bool> {
    let target = dir.join(file_name);
    if !target.exists() {
        return Ok(false);
    }
    fs::remove_file(&target).with_context(|| format!("Failed to remove {}", target.display()))?;
    Ok(true)
}
