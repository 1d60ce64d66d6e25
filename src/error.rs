// Error types shared by all repository adapters

use std::fmt;
use thiserror::Error;

/// Errors produced by repository lookups.
///
/// `search` swallows `NotFound` from the upstream into an empty result list;
/// every other operation hands these back to the caller untouched.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No files found for version '{version}' of '{id}'")]
    NoFilesFound { id: String, version: String },

    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    #[error("Invalid identifier '{id}': {message}")]
    InvalidId { id: String, message: String },

    /// Halt state, not a failure: the artifact must be fetched by hand.
    #[error("'{name}' {reason} and must be downloaded manually from {url}")]
    ExternalOrPremium {
        name: String,
        url: String,
        reason: HaltReason,
    },
}

/// Why a resource cannot be downloaded automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    External,
    Premium,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::External => write!(f, "is hosted externally"),
            HaltReason::Premium => write!(f, "is a premium resource"),
        }
    }
}

impl RepositoryError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_id(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidId {
            id: id.into(),
            message: message.into(),
        }
    }

    /// True for the upstream signal that a query simply matched nothing
    pub fn is_no_results(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for RepositoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::UpstreamUnavailable(format!("request timed out: {}", err));
        }
        Self::UpstreamUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
