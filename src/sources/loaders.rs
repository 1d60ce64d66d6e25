// Loader compatibility table for server implementations

/// Broad family a loader tag belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderFamily {
    Plugin,
    Mod,
}

/// Compatible loader tags per server implementation, most specific first
const COMPATIBILITY: &[(&str, &[&str])] = &[
    ("folia", &["folia", "paper", "spigot", "bukkit"]),
    ("purpur", &["purpur", "paper", "spigot", "bukkit"]),
    ("pufferfish", &["pufferfish", "paper", "spigot", "bukkit"]),
    ("paper", &["paper", "spigot", "bukkit"]),
    ("spigot", &["spigot", "bukkit"]),
    ("craftbukkit", &["bukkit"]),
    ("bukkit", &["bukkit"]),
    ("velocity", &["velocity"]),
    ("waterfall", &["waterfall", "bungeecord"]),
    ("bungeecord", &["bungeecord"]),
    ("sponge", &["sponge"]),
    ("fabric", &["fabric"]),
    ("quilt", &["quilt", "fabric"]),
    ("forge", &["forge"]),
    ("neoforge", &["neoforge"]),
];

const PLUGIN_LOADERS: &[&str] = &[
    "bukkit",
    "spigot",
    "paper",
    "purpur",
    "folia",
    "pufferfish",
    "velocity",
    "bungeecord",
    "waterfall",
    "sponge",
];

const MOD_LOADERS: &[&str] = &["fabric", "quilt", "forge", "neoforge", "liteloader"];

/// Marketplace category tags a loader is published under.
///
/// BungeeCord plugins were historically tagged under the Waterfall category too.
pub fn category_tags(loader: &str) -> Vec<String> {
    match loader.to_lowercase().as_str() {
        "bungeecord" => vec!["bungeecord".to_string(), "waterfall".to_string()],
        other => vec![other.to_string()],
    }
}

/// Loader tags a server implementation can run, most specific first.
///
/// Unknown implementations yield just their own name, lower-cased.
pub fn compatible_loaders(server_implementation: &str) -> Vec<String> {
    let key = server_implementation.trim().to_lowercase();

    COMPATIBILITY
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, loaders)| loaders.iter().map(|l| l.to_string()).collect())
        .unwrap_or_else(|| vec![key])
}

/// Family of a single loader tag, if known
pub fn family(loader: &str) -> Option<LoaderFamily> {
    let loader = loader.to_lowercase();
    if PLUGIN_LOADERS.contains(&loader.as_str()) {
        Some(LoaderFamily::Plugin)
    } else if MOD_LOADERS.contains(&loader.as_str()) {
        Some(LoaderFamily::Mod)
    } else {
        None
    }
}

/// The single family shared by every loader in the set.
///
/// `None` when the set is empty, mixed, or contains unknown tags.
pub fn common_family(loaders: &[String]) -> Option<LoaderFamily> {
    let mut families = loaders.iter().map(|l| family(l));
    let first = families.next()??;
    families
        .all(|f| f == Some(first))
        .then_some(first)
}

/// True when any loader of a version is in the requested set
pub fn intersects(version_loaders: &[String], requested: &[String]) -> bool {
    version_loaders
        .iter()
        .any(|l| requested.iter().any(|r| r.eq_ignore_ascii_case(l)))
}
