// Version matching utility for Minecraft game version compatibility

/// Normalize a Minecraft version string for comparison
///
/// Strips build metadata and surrounding whitespace.
/// Examples:
/// - "1.20.1-R0.1-SNAPSHOT" -> "1.20.1"
/// - "1.20" -> "1.20"
pub fn normalize_mc_version(version: &str) -> String {
    version
        .split('-')
        .next()
        .unwrap_or(version)
        .trim()
        .to_string()
}

/// Reduce a game version to its "major.minor" line, e.g. "1.20.4" -> "1.20"
pub fn release_line(version: &str) -> String {
    let normalized = normalize_mc_version(version);
    normalized
        .split('.')
        .take(2)
        .collect::<Vec<_>>()
        .join(".")
}

/// Check whether two game versions are on the same major.minor line
///
/// # Examples
/// ```ignore
/// assert!(same_release_line("1.20.1", "1.20")); // same line
/// assert!(same_release_line("1.20-R0.1-SNAPSHOT", "1.20.6")); // with metadata
/// assert!(!same_release_line("1.2", "1.20")); // not a prefix match
/// ```
pub fn same_release_line(version: &str, target: &str) -> bool {
    let line = release_line(version);
    !line.is_empty() && line == release_line(target)
}

/// Check a version's declared game versions against the server's.
///
/// An absent or empty list is treated as compatible with everything.
pub fn is_compatible(game_versions: Option<&[String]>, server_version: &str) -> bool {
    match game_versions {
        None => true,
        Some([]) => true,
        Some(list) => list.iter().any(|gv| same_release_line(gv, server_version)),
    }
}
