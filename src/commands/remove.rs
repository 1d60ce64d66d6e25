// Remove command for removing a dependency from the manifest

use crate::commands;
use crate::config;
use crate::install;
use crate::ui;
use std::path::Path;

pub fn remove(name: String) -> anyhow::Result<()> {
    let mut manifest = commands::load_manifest()?;

    let Some(record) = manifest.dependencies.remove(&name) else {
        anyhow::bail!("Dependency '{}' not found in manifest", name);
    };
    manifest.save()?;

    if let Some(file_name) = &record.file_name
        && install::remove_file(Path::new(&config::plugins_dir()), file_name)?
    {
        ui::dim(&format!("Deleted {}", file_name));
    }

    ui::success(&format!("Removed {}", name));
    Ok(())
}
