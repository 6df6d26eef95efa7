// ABOUTME: Error types for deployment operations.
// ABOUTME: Covers registration, service update, polling, timeout, and rollback failures.

use std::fmt;
use std::time::Duration;

use crate::cluster::ApiError;
use crate::taskdef::BuildError;
use crate::types::RevisionArn;

/// What a deployment was waiting for when it timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStage {
    /// A task of the new revision passing the health predicate.
    HealthyTasks,
    /// Old deployments draining until one remains.
    Drain,
}

impl fmt::Display for WaitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitStage::HealthyTasks => f.write_str("healthy tasks"),
            WaitStage::Drain => f.write_str("old deployments to drain"),
        }
    }
}

/// Errors that can occur during deployment state transitions.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Describing the service or its task definition failed.
    #[error("failed to describe {what}: {source}")]
    Describe {
        what: String,
        #[source]
        source: ApiError,
    },

    /// The service's family has no ACTIVE revision.
    #[error("no active revision found for family {0}")]
    NoActiveRevision(String),

    /// The described definition could not be turned into a new revision.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Registering the new revision was rejected.
    #[error("failed to register task definition: {0}")]
    Registration(#[source] ApiError),

    /// Updating the service was rejected.
    #[error("failed to update service: {0}")]
    ServiceUpdate(#[source] ApiError),

    /// A status query failed while waiting.
    #[error("failed while waiting for {stage}: {source}")]
    Polling {
        stage: WaitStage,
        #[source]
        source: ApiError,
    },

    /// The wait exceeded the configured timeout.
    #[error("timed out after {}s waiting for {stage}", .timeout.as_secs())]
    Timeout { stage: WaitStage, timeout: Duration },

    /// Pointing the service back at the previous revision failed.
    #[error("rollback to {revision} failed: {source}")]
    RollbackFailed {
        revision: RevisionArn,
        #[source]
        source: ApiError,
    },

    /// The deployment did not change the revision, so there is nothing to restore.
    #[error("no previous revision to roll back to")]
    NothingToRollBack,
}

impl DeployError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeployError::Timeout { .. })
    }

    /// The underlying cluster API error, if there is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            DeployError::Describe { source, .. }
            | DeployError::Polling { source, .. }
            | DeployError::RollbackFailed { source, .. } => Some(source),
            DeployError::Registration(source) | DeployError::ServiceUpdate(source) => Some(source),
            _ => None,
        }
    }
}
