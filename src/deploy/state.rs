// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: States carry the new revision once it exists, so it cannot be read too early.

use crate::types::RevisionArn;

use super::health::HealthPredicate;

/// Initial state: service described, nothing changed yet.
/// Available actions: `register()`, `force_new_deployment()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// New revision registered; the service still runs the previous one.
/// Available actions: `update_service()`
#[derive(Debug, Clone)]
pub struct Registered {
    pub(crate) revision: RevisionArn,
    pub(crate) predicate: HealthPredicate,
}

/// Service pointed at the new revision, tasks not yet confirmed.
/// Available actions: `wait_for_healthy()`, `rollback()`
#[derive(Debug, Clone)]
pub struct Updated {
    pub(crate) revision: RevisionArn,
    pub(crate) predicate: HealthPredicate,
}

/// A task of the new revision satisfies the health predicate.
/// Available actions: `wait_for_drain()`, `skip_drain()`, `rollback()`
#[derive(Debug, Clone)]
pub struct Healthy {
    pub(crate) revision: RevisionArn,
}

/// Completed: the service settled on the new revision.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Completed {
    pub(crate) revision: RevisionArn,
}

/// Rolled back: the service points at the previous revision again.
#[derive(Debug, Clone)]
pub struct RolledBack {
    pub(crate) abandoned: RevisionArn,
}
