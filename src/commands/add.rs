// Add command for installing a resource and recording it in the manifest

use crate::commands::{self, Context};
use crate::config;
use crate::install;
use crate::manifest::DependencyRecord;
use crate::sources::{loaders, version_matcher};
use crate::ui;
use log::info;
use std::path::Path;

pub async fn add(ctx: &Context, spec: String) -> anyhow::Result<()> {
    let mut manifest = commands::load_manifest()?;
    let loaders = loaders::compatible_loaders(&manifest.server.implementation);

    let target = commands::resolve_target(&ctx.registry, &spec, &loaders).await?;
    let pb = ui::spinner(&format!("Resolving {}...", target.id));

    let (resource, version) = match install::resolve_install(
        target.repository.as_ref(),
        &target.id,
        target.version.as_deref(),
        &loaders,
    )
    .await
    {
        Ok(resolved) => resolved,
        Err(e) => {
            ui::finish_spinner_error(&pb, &format!("Cannot install {}", target.id));
            return Err(e.into());
        }
    };

    let name = match resource.summary.name.trim() {
        "" => commands::dependency_name(&target.id),
        display => commands::dependency_name(display),
    };

    let tested = resource.tested_versions.as_slice();
    if !version_matcher::is_compatible(Some(tested), &manifest.server.version) {
        ui::warning(&format!(
            "{} is not tested on Minecraft {} (tested: {})",
            resource.summary.name,
            manifest.server.version,
            resource.tested_versions.join(", ")
        ));
    }

    pb.set_message(format!("Downloading {} {}...", name, version.version));
    let plugins_dir = config::plugins_dir();
    let path = match install::download_to(&ctx.client, &version, Path::new(&plugins_dir)).await {
        Ok(path) => path,
        Err(e) => {
            ui::finish_spinner_error(&pb, &format!("Failed to download {}", name));
            return Err(e);
        }
    };
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| version.file_name.clone());

    // A reinstall under the same name replaces the previous artifact
    if let Some(previous) = manifest.dependencies.get(&name)
        && let Some(old_file) = &previous.file_name
        && *old_file != file_name
    {
        install::remove_file(Path::new(&plugins_dir), old_file)?;
    }

    let id = if resource.summary.id.is_empty() {
        target.id.clone()
    } else {
        resource.summary.id.clone()
    };
    manifest.dependencies.insert(
        name.clone(),
        DependencyRecord::from_repository(
            target.repository.id(),
            id,
            version.version.clone(),
            file_name,
        ),
    );
    manifest.save()?;

    info!("Added '{}' from {}", name, target.repository.id());
    ui::finish_spinner_resolved(&pb, &name, &version.version);
    Ok(())
}
