// Constants module for shared string constants

pub const MANIFEST_FILE: &str = "craftpm.toml";
pub const REPOSITORIES_FILE: &str = "repositories.toml";
pub const PLUGINS_DIR: &str = "plugins";
pub const DEFAULT_SERVER: &str = "paper";
pub const DEFAULT_MC_VERSION: &str = "1.21.1";
