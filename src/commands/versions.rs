// Versions command for listing a resource's version history

use crate::commands::{self, Context};
use crate::ui;
use std::cmp::Reverse;

pub async fn versions(ctx: &Context, spec: String) -> anyhow::Result<()> {
    let loaders = commands::manifest_loaders();
    let target = commands::resolve_target(&ctx.registry, &spec, &loaders).await?;

    let mut versions = target.repository.get_versions(&target.id).await?;
    if versions.is_empty() {
        ui::warning(&format!("{} has no published versions", target.id));
        return Ok(());
    }

    // Newest first; undated entries go last in repository order
    versions.sort_by_key(|v| Reverse(v.released_at));

    for version in &versions {
        let released = version
            .released_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let games = version
            .game_versions
            .as_ref()
            .filter(|g| !g.is_empty())
            .map(|g| g.join(", "))
            .unwrap_or_else(|| "any".to_string());

        ui::status(
            &version.display_name,
            &format!("{}  {} downloads  mc: {}", released, version.downloads, games),
        );
    }
    Ok(())
}
