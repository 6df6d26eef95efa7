// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports state markers, the Deployment struct, rollback, and revision pruning.

use std::time::Duration;

mod deployment;
mod error;
mod health;
mod prune;
mod rollback;
mod state;
mod transitions;

pub use deployment::{Deployment, DeploymentTarget};
pub use error::{DeployError, WaitStage};
pub use health::HealthPredicate;
pub use prune::{PruneError, PruneFailure, PruneResult, prune_revisions};
pub use rollback::Rollbackable;
pub use state::{Completed, Healthy, Initialized, Registered, RolledBack, Updated};
pub use transitions::{TransitionResult, describe_source, register_revision};

/// Pause between task status checks.
pub const TASK_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Pause between drain checks.
pub const DEPLOYMENT_POLL_INTERVAL: Duration = Duration::from_secs(2);
