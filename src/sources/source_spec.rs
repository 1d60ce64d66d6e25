// Parser for "source:id@version" style plugin references

use crate::manifest::SourceKind;
use std::collections::HashMap;

lazy_static::lazy_static! {
    /// Accepted source prefixes (lower-case) and the canonical source they select
    static ref SOURCE_ALIASES: HashMap<&'static str, SourceKind> = HashMap::from([
        ("modrinth", SourceKind::Modrinth),
        ("mr", SourceKind::Modrinth),
        ("spigot", SourceKind::Spigot),
        ("spigotmc", SourceKind::Spigot),
        // Legacy name of the Spigot API mirror
        ("spiget", SourceKind::Spigot),
        ("github", SourceKind::GitHub),
        ("gh", SourceKind::GitHub),
    ]);
}

/// Result of parsing a user-supplied plugin reference.
///
/// Exactly one of `resource_id` / `query` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    pub source: Option<SourceKind>,
    pub resource_id: Option<String>,
    pub query: Option<String>,
    pub version: Option<String>,
}

impl ParsedSource {
    /// True when the input was empty and there is nothing to look up
    pub fn is_empty(&self) -> bool {
        self.resource_id.is_none() && self.query.as_deref().is_none_or(str::is_empty)
    }
}

/// Look up a source alias, case-insensitively
pub fn source_from_alias(alias: &str) -> Option<SourceKind> {
    SOURCE_ALIASES.get(alias.to_lowercase().as_str()).copied()
}

/// Parse a plugin reference such as `modrinth:sodium@1.2.0`, `spigot:19254` or `viaversion`.
///
/// Never fails: anything without a known source prefix becomes a free-text query.
/// A leading `@` is kept in the name (reserved for scoped names).
pub fn parse(input: &str) -> ParsedSource {
    let (main, version) = match input.rfind('@') {
        Some(at) if at > 0 => (&input[..at], Some(input[at + 1..].to_string())),
        _ => (input, None),
    };

    if let Some(colon) = main.find(':')
        && colon > 0
        && let Some(source) = source_from_alias(&main[..colon])
    {
        return ParsedSource {
            source: Some(source),
            resource_id: Some(main[colon + 1..].to_string()),
            query: None,
            version,
        };
    }

    ParsedSource {
        source: None,
        resource_id: None,
        query: Some(main.to_string()),
        version,
    }
}
