// Planner module for deciding which version an installed dependency should move to

use crate::manifest::{DependencyRecord, SourceKind};
use crate::sources::RepositoryRegistry;
use crate::sources::source_trait::{Repository, VersionEntry, VersionInfo};
use crate::sources::version_compare;
use crate::sources::{loaders, version_matcher};
use futures::future::join_all;
use log::{debug, warn};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePolicy {
    /// Stay on the current major version
    #[default]
    Minor,
    /// Whatever the repository lists first
    Latest,
}

#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub policy: UpdatePolicy,
    /// Reject targets that don't declare support for `server_version`
    pub safe_mode: bool,
    pub server_version: String,
    pub loaders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    UpToDate,
    Available {
        target: VersionEntry,
        download: VersionInfo,
    },
    Skipped {
        reason: String,
    },
}

impl UpdateOutcome {
    fn skipped(reason: impl Into<String>) -> Self {
        UpdateOutcome::Skipped {
            reason: reason.into(),
        }
    }
}

/// Greatest version with the same major that is strictly newer than `current`
pub fn select_minor_update<'a>(
    current: &str,
    versions: &'a [VersionEntry],
) -> Option<&'a VersionEntry> {
    let current_parsed = version_compare::parse(current);

    versions
        .iter()
        .filter(|v| {
            let parsed = version_compare::parse(&v.display_name);
            parsed.major == current_parsed.major
                && parsed.compare(&current_parsed) == Ordering::Greater
        })
        .fold(None, |best: Option<&VersionEntry>, v| match best {
            Some(b) if !version_compare::is_newer(&v.display_name, &b.display_name) => Some(b),
            _ => Some(v),
        })
}

/// Head of the list, if newer than `current`. List order is trusted as-is.
pub fn select_latest<'a>(current: &str, versions: &'a [VersionEntry]) -> Option<&'a VersionEntry> {
    versions
        .first()
        .filter(|v| version_compare::is_newer(&v.display_name, current))
}

/// Entries installable with `requested`; entries that declare no loaders always pass
pub fn filter_by_loaders(versions: Vec<VersionEntry>, requested: &[String]) -> Vec<VersionEntry> {
    if requested.is_empty() {
        return versions;
    }
    versions
        .into_iter()
        .filter(|v| v.loaders.is_empty() || loaders::intersects(&v.loaders, requested))
        .collect()
}

/// Plan a single dependency against its repository
pub async fn plan_update(
    record: &DependencyRecord,
    repository: &dyn Repository,
    options: &PlanOptions,
) -> UpdateOutcome {
    let Some(current) = record.version.as_deref() else {
        return UpdateOutcome::skipped("no installed version recorded");
    };

    let versions = match repository.get_versions(&record.id).await {
        Ok(versions) => filter_by_loaders(versions, &options.loaders),
        Err(e) => {
            warn!("Could not list versions of {}: {}", record.id, e);
            return UpdateOutcome::skipped(e.to_string());
        }
    };

    let target = match options.policy {
        UpdatePolicy::Minor => select_minor_update(current, &versions),
        UpdatePolicy::Latest => select_latest(current, &versions),
    };
    let Some(target) = target else {
        debug!("{} {} is up to date", record.id, current);
        return UpdateOutcome::UpToDate;
    };

    if options.safe_mode
        && !version_matcher::is_compatible(target.game_versions.as_deref(), &options.server_version)
    {
        return UpdateOutcome::skipped(format!(
            "incompatible: {} does not declare support for Minecraft {}",
            target.display_name, options.server_version
        ));
    }

    match repository
        .get_version_download(&record.id, &target.id, &options.loaders)
        .await
    {
        Ok(download) => UpdateOutcome::Available {
            target: target.clone(),
            download,
        },
        Err(e) => {
            warn!(
                "Could not resolve download for {} {}: {}",
                record.id, target.display_name, e
            );
            UpdateOutcome::skipped(e.to_string())
        }
    }
}

/// Plan every dependency concurrently; results keep the input order
pub async fn plan_all<'a, I>(
    dependencies: I,
    registry: &RepositoryRegistry,
    options: &PlanOptions,
) -> Vec<(String, UpdateOutcome)>
where
    I: IntoIterator<Item = (&'a String, &'a DependencyRecord)>,
{
    let plans = dependencies.into_iter().map(|(name, record)| async move {
        let outcome = if record.source == SourceKind::Filesystem {
            UpdateOutcome::skipped("not managed by a remote repository")
        } else {
            match record
                .repository_id()
                .ok_or_else(|| {
                    crate::error::RepositoryError::UnsupportedSource(format!(
                        "'{}' has no repository recorded",
                        name
                    ))
                })
                .and_then(|id| registry.get_or_error(id))
            {
                Ok(repository) => plan_update(record, repository.as_ref(), options).await,
                Err(e) => UpdateOutcome::skipped(e.to_string()),
            }
        };
        (name.clone(), outcome)
    });

    join_all(plans).await
}
