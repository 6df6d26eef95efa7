// ABOUTME: Deregistration of old task definition revisions after a deployment.
// ABOUTME: Keeps the newest revisions of a family and collects per-revision failures.

use crate::cluster::{ApiError, ClusterApi, DefinitionStatus, SortOrder};
use crate::types::RevisionArn;

/// A revision that could not be deregistered.
#[derive(Debug)]
pub struct PruneFailure {
    pub revision: RevisionArn,
    pub error: String,
}

/// Result of a prune pass.
#[derive(Debug, Default)]
pub struct PruneResult {
    /// Revisions deregistered, oldest first.
    pub deregistered: Vec<RevisionArn>,
    /// Revisions that failed to deregister.
    pub failed: Vec<PruneFailure>,
}

impl PruneResult {
    pub fn is_empty(&self) -> bool {
        self.deregistered.is_empty() && self.failed.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Listing the family's revisions failed.
#[derive(Debug, thiserror::Error)]
#[error("failed to list revisions of {family}: {source}")]
pub struct PruneError {
    pub family: String,
    #[source]
    pub source: ApiError,
}

/// Deregister all but the newest `retain` ACTIVE revisions of `family`.
///
/// Revisions are removed oldest first. `keep` is never deregistered, even
/// when it falls outside the retained window. A `retain` of 0 disables
/// pruning.
///
/// # Errors
///
/// Returns `PruneError` only if the revision listing fails; individual
/// deregistration failures are collected in the result.
pub async fn prune_revisions<A: ClusterApi + ?Sized>(
    api: &A,
    family: &str,
    retain: usize,
    keep: &RevisionArn,
) -> Result<PruneResult, PruneError> {
    let mut result = PruneResult::default();
    if retain == 0 {
        return Ok(result);
    }

    let listed = api
        .list_task_definitions(family, DefinitionStatus::Active, SortOrder::Asc)
        .await
        .map_err(|source| PruneError {
            family: family.to_string(),
            source,
        })?;

    // The listing matches by prefix; `web` would also return `web-worker`.
    let revisions: Vec<RevisionArn> = listed.into_iter().filter(|r| r.family() == family).collect();

    let excess = revisions.len().saturating_sub(retain);
    tracing::debug!(family, active = revisions.len(), retain, excess, "pruning revisions");

    for revision in revisions.into_iter().take(excess) {
        if &revision == keep {
            continue;
        }
        match api.deregister_task_definition(&revision).await {
            Ok(()) => {
                tracing::info!(%revision, "deregistered revision");
                result.deregistered.push(revision);
            }
            Err(e) => {
                tracing::warn!(%revision, error = %e, "failed to deregister revision");
                result.failed.push(PruneFailure {
                    revision,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(result)
}
