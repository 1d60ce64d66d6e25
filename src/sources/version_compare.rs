// Loose version comparison used by the outdated/update flows
//
// This is deliberately not semver precedence. Plugin authors publish all kinds
// of version strings and manifests written by earlier releases rely on this
// exact ordering, including the degraded fallbacks below.

use std::cmp::Ordering;

/// A dotted version split into numeric parts and an opaque tail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LooseVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Everything after the numeric parts, verbatim (e.g. "-SNAPSHOT", ".4")
    pub prerelease: String,
}

impl LooseVersion {
    /// Parse a version string. Never fails.
    ///
    /// Missing minor/patch components default to 0. A string that does not
    /// start with a number (after an optional `v`) becomes `0.0.0` with the
    /// whole input kept as `prerelease`, which sorts below any real version.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let Some((major, mut rest)) = take_number(body) else {
            return Self {
                major: 0,
                minor: 0,
                patch: 0,
                prerelease: raw.to_string(),
            };
        };

        let mut minor = 0;
        let mut patch = 0;

        if let Some((value, tail)) = rest.strip_prefix('.').and_then(take_number) {
            minor = value;
            rest = tail;

            if let Some((value, tail)) = rest.strip_prefix('.').and_then(take_number) {
                patch = value;
                rest = tail;
            }
        }

        Self {
            major,
            minor,
            patch,
            prerelease: rest.to_string(),
        }
    }

    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    /// Compare numerically, then stable above pre-release. Two different
    /// pre-release tails compare equal.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (self.is_prerelease(), other.is_prerelease()) {
                (false, true) => Ordering::Greater,
                (true, false) => Ordering::Less,
                _ => Ordering::Equal,
            })
    }
}

/// Split a leading run of ASCII digits off `input`
fn take_number(input: &str) -> Option<(u64, &str)> {
    let end = input
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(input.len());

    if end == 0 {
        return None;
    }

    // Absurdly long digit runs saturate rather than fail
    let value = input[..end].parse::<u64>().unwrap_or(u64::MAX);
    Some((value, &input[end..]))
}

/// Parse a version string
pub fn parse(raw: &str) -> LooseVersion {
    LooseVersion::parse(raw)
}

/// Compare two version strings
pub fn compare(a: &str, b: &str) -> Ordering {
    LooseVersion::parse(a).compare(&LooseVersion::parse(b))
}

/// True when `candidate` is strictly newer than `current`
pub fn is_newer(candidate: &str, current: &str) -> bool {
    compare(candidate, current) == Ordering::Greater
}
