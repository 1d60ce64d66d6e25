// Outdated command for reporting available updates

use crate::cli::PlanFlags;
use crate::commands::{self, Context};
use crate::manifest::Manifest;
use crate::planner::{self, PlanOptions, UpdateOutcome, UpdatePolicy};
use crate::sources::loaders;
use crate::ui;

pub fn plan_options(manifest: &Manifest, flags: PlanFlags) -> PlanOptions {
    PlanOptions {
        policy: if flags.latest {
            UpdatePolicy::Latest
        } else {
            UpdatePolicy::Minor
        },
        safe_mode: flags.safe,
        server_version: manifest.server.version.clone(),
        loaders: loaders::compatible_loaders(&manifest.server.implementation),
    }
}

/// Version recorded for a dependency, for display
pub fn current_version<'a>(manifest: &'a Manifest, name: &str) -> &'a str {
    manifest
        .dependencies
        .get(name)
        .and_then(|d| d.version.as_deref())
        .unwrap_or("?")
}

pub async fn outdated(ctx: &Context, flags: PlanFlags) -> anyhow::Result<()> {
    let manifest = commands::load_manifest()?;
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

    let mut available = 0;
    for (name, outcome) in &plans {
        let current = current_version(&manifest, name);
        match outcome {
            UpdateOutcome::UpToDate => ui::success(&format!("{} {} is up to date", name, current)),
            UpdateOutcome::Available { target, .. } => {
                available += 1;
                ui::action(&format!("{} {} -> {}", name, current, target.display_name));
            }
            UpdateOutcome::Skipped { reason } => {
                ui::dim(&format!("{} skipped: {}", name, reason));
            }
        }
    }

    if available == 0 {
        ui::success("Everything is up to date");
    } else {
        ui::status("Outdated", &format!("{} update(s) available", available));
    }
    Ok(())
}
