// Update command for installing available updates

use crate::cli::PlanFlags;
use crate::commands::outdated::{current_version, plan_options};
use crate::commands::{self, Context};
use crate::config;
use crate::install;
use crate::manifest::DependencyRecord;
use crate::planner::{self, UpdateOutcome};
use crate::ui;
use log::warn;
use std::path::Path;

pub async fn update(ctx: &Context, flags: PlanFlags, dry_run: bool) -> anyhow::Result<()> {
    let mut manifest = commands::load_manifest()?;
    if manifest.dependencies.is_empty() {
        ui::dim("No dependencies installed.");
        return Ok(());
    }

    let pb = ui::spinner("Checking for updates...");
    let plans = planner::plan_all(
        &manifest.dependencies,
        &ctx.registry,
        &plan_options(&manifest, flags),
    )
    .await;
    ui::clear_bar(&pb);

    let plugins_dir = config::plugins_dir();
    let plugins_dir = Path::new(&plugins_dir);
    let mut updated = 0;
    let mut failed = 0;

    for (name, outcome) in plans {
        let (target, download) = match outcome {
            UpdateOutcome::Available { target, download } => (target, download),
            UpdateOutcome::Skipped { reason } => {
                ui::dim(&format!("{} skipped: {}", name, reason));
                continue;
            }
            UpdateOutcome::UpToDate => continue,
        };

        let current = current_version(&manifest, &name).to_string();
        if dry_run {
            ui::status(
                "[DRY RUN]",
                &format!("Would update {} {} -> {}", name, current, target.display_name),
            );
            continue;
        }

        let pb = ui::spinner(&format!("Updating {}...", name));
        let path = match install::download_to(&ctx.client, &download, plugins_dir).await {
            Ok(path) => path,
            Err(e) => {
                warn!("Update of {} failed: {:#}", name, e);
                ui::finish_spinner_error(&pb, &format!("{}: {:#}", name, e));
                failed += 1;
                continue;
            }
        };
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| download.file_name.clone());

        if let Some(record) = manifest.dependencies.get_mut(&name)
            && let Err(e) = record_update(record, plugins_dir, &download.version, file_name)
        {
            warn!("Cleanup after updating {} failed: {:#}", name, e);
            ui::warning(&format!("{}: {:#}", name, e));
            failed += 1;
        }

        updated += 1;
        ui::finish_spinner_resolved(
            &pb,
            &name,
            &format!("{} -> {}", current, download.version),
        );
    }

    if updated > 0 {
        manifest.save()?;
    }

    if dry_run {
        ui::status("[DRY RUN]", "No changes made");
    } else if updated == 0 && failed == 0 {
        ui::success("Everything is up to date");
    } else {
        ui::success(&format!("Updated {} dependencies", updated));
    }

    if failed > 0 {
        anyhow::bail!("{} update(s) failed", failed);
    }
    Ok(())
}

/// Point the record at the new file, then delete the file it replaced.
///
/// The record is updated even when the old file cannot be removed, since the
/// new file is already in place.
fn record_update(
    record: &mut DependencyRecord,
    plugins_dir: &Path,
    version: &str,
    file_name: String,
) -> anyhow::Result<()> {
    let old_file = record.file_name.replace(file_name.clone());
    record.version = Some(version.to_string());

    match old_file {
        Some(old) if old != file_name => install::remove_file(plugins_dir, &old).map(|_| ()),
        _ => Ok(()),
    }
}
