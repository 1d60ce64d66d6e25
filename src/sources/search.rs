// Search utilities for plugin sources

use crate::sources::source_trait::SearchResult;
use std::cmp::Ordering;

/// Trait for items that can be searched
pub trait Searchable {
    /// Get the name to compare against the search query
    fn search_name(&self) -> &str;
}

impl Searchable for SearchResult {
    fn search_name(&self) -> &str {
        &self.name
    }
}

/// Parsed repository id that can be either a full identifier or a search term
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedId {
    /// Full identifier with owner and name (e.g., "ViaVersion/ViaVersion")
    Full { owner: String, name: String },
    /// Just a search term (e.g., "ViaVersion")
    SearchTerm(String),
}

/// Parse an owner/name style ID, also accepting a full repository URL
/// such as `https://github.com/owner/name` or `github.com/owner/name.git`.
/// Returns Full if it has two non-empty path parts, otherwise SearchTerm
pub fn parse_owner_name_id(id: &str) -> ParsedId {
    let trimmed = id.trim().trim_end_matches('/');
    let path = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let path = path
        .strip_prefix("www.github.com/")
        .or_else(|| path.strip_prefix("github.com/"))
        .unwrap_or(path);

    let parts: Vec<&str> = path.split('/').collect();

    if parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty() {
        ParsedId::Full {
            owner: parts[0].to_string(),
            name: parts[1].trim_end_matches(".git").to_string(),
        }
    } else {
        ParsedId::SearchTerm(id.to_string())
    }
}

fn is_exact(name: &str, query_lower: &str, query_spaced: &str) -> bool {
    let name_lower = name.to_lowercase();
    name_lower == query_lower || name_lower == query_spaced
}

/// Rank search results with exact matches first (case-insensitive)
/// Takes a mutable slice and sorts it in place
pub fn rank_search_results<T: Searchable>(results: &mut [T], query: &str) {
    let query_lower = query.to_lowercase();
    let query_spaced = query_lower.replace('-', " ");

    results.sort_by(|a, b| {
        let a_exact = is_exact(a.search_name(), &query_lower, &query_spaced);
        let b_exact = is_exact(b.search_name(), &query_lower, &query_spaced);

        match (a_exact, b_exact) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => {
                // If both or neither are exact, sort alphabetically by name
                a.search_name()
                    .to_lowercase()
                    .cmp(&b.search_name().to_lowercase())
            }
        }
    });
}

/// Rank search results with exact matches first, preserving original order for ties
/// Useful when the original order has meaning (e.g., sorted by popularity)
pub fn rank_search_results_stable<T: Searchable>(results: &mut [T], query: &str) {
    let query_lower = query.to_lowercase();
    let query_spaced = query_lower.replace('-', " ");

    results.sort_by(|a, b| {
        let a_exact = is_exact(a.search_name(), &query_lower, &query_spaced);
        let b_exact = is_exact(b.search_name(), &query_lower, &query_spaced);

        match (a_exact, b_exact) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal, // Preserve original order
        }
    });
}

/// Index of the first exact (case-insensitive) name match, if any
pub fn exact_match_index<T: Searchable>(results: &[T], query: &str) -> Option<usize> {
    let query_lower = query.to_lowercase();
    let query_spaced = query_lower.replace('-', " ");
    results
        .iter()
        .position(|r| is_exact(r.search_name(), &query_lower, &query_spaced))
}
