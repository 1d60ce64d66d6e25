// Repos command for listing the repositories of this run

use crate::commands::Context;
use crate::sources::source_trait::AssetType;
use crate::ui;

pub fn repos(ctx: &Context) -> anyhow::Result<()> {
    for repository in ctx.registry.all() {
        let types = repository
            .asset_types()
            .iter()
            .map(|t| match t {
                AssetType::Mod => "mods",
                AssetType::Plugin => "plugins",
            })
            .collect::<Vec<_>>()
            .join(", ");

        ui::status(repository.id(), &format!("{} ({})", repository.display_name(), types));
        ui::dim(&format!("  {}", repository.base_url()));
    }
    Ok(())
}
