// Info command for showing details of a single resource

use crate::commands::{self, Context};
use crate::ui;

pub async fn info(ctx: &Context, spec: String) -> anyhow::Result<()> {
    let loaders = commands::manifest_loaders();
    let target = commands::resolve_target(&ctx.registry, &spec, &loaders).await?;
    let resource = target.repository.get_resource(&target.id).await?;
    let summary = &resource.summary;

    ui::header(&format!("{} {}", summary.name, summary.version));
    ui::status("source", &format!("{}:{}", summary.source, summary.id));
    ui::status("author", &summary.author);
    ui::status("downloads", &summary.downloads.to_string());
    if !summary.url.is_empty() {
        ui::status("url", &summary.url);
    }
    if !resource.tested_versions.is_empty() {
        ui::status("tested", &resource.tested_versions.join(", "));
    }
    if !summary.description.is_empty() {
        ui::dim(&summary.description);
    }

    if let Err(halt) = resource.ensure_installable() {
        ui::warning(&halt.to_string());
    }
    Ok(())
}
