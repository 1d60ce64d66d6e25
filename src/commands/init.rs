// Init command for initializing a new project manifest

use crate::constants;
use crate::manifest::Manifest;
use crate::sources::loaders;
use crate::ui;

pub fn init(server: String, version: String) -> anyhow::Result<()> {
    if Manifest::load().is_ok() {
        ui::dim("Manifest detected. Skipping initialization.");
        return Ok(());
    }

    let server = server.trim().to_lowercase();
    if loaders::family(&server).is_none() {
        ui::warning(&format!(
            "Unknown server implementation '{}'; only its own loader tag will be matched",
            server
        ));
    }

    Manifest::new(server.as_str(), version.as_str()).save()?;
    ui::success(&format!(
        "Initialized {} for {} {}",
        constants::MANIFEST_FILE,
        server,
        version
    ));
    Ok(())
}
