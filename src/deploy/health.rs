// ABOUTME: Health predicate and the task readiness check used while polling.
// ABOUTME: Tasks count as ready once they run the new revision and pass the predicate.

use nonempty::NonEmpty;

use crate::cluster::{ApiError, ClusterApi, DesiredStatus, TaskDescription};
use crate::taskdef::TaskDefinitionDraft;
use crate::types::{RevisionArn, ServiceName};

const HEALTHY: &str = "HEALTHY";
const RUNNING: &str = "RUNNING";

/// What "healthy" means for a task of the new revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthPredicate {
    /// The container health check reports HEALTHY.
    HealthCheck,
    /// The task has reached RUNNING.
    Running,
}

impl HealthPredicate {
    /// Decided by whether the first container declares a health check.
    pub fn for_draft(draft: &TaskDefinitionDraft) -> Self {
        if draft.first_container_has_health_check() {
            HealthPredicate::HealthCheck
        } else {
            HealthPredicate::Running
        }
    }

    pub fn is_satisfied(&self, task: &TaskDescription) -> bool {
        match self {
            HealthPredicate::HealthCheck => task.health_status.as_deref() == Some(HEALTHY),
            HealthPredicate::Running => task.last_status == RUNNING,
        }
    }
}

/// One check: does any running task of `service` run `revision` and pass
/// `predicate`?
pub(crate) async fn revision_ready<A: ClusterApi + ?Sized>(
    api: &A,
    cluster: &str,
    service: &ServiceName,
    revision: &RevisionArn,
    predicate: HealthPredicate,
) -> Result<bool, ApiError> {
    let arns = api.list_tasks(cluster, service, DesiredStatus::Running).await?;
    let Some(arns) = NonEmpty::from_vec(arns) else {
        tracing::debug!(%service, "no running tasks yet");
        return Ok(false);
    };

    let tasks = api.describe_tasks(cluster, &arns).await?;
    let ready = tasks
        .iter()
        .filter(|t| t.task_definition_arn == *revision)
        .filter(|t| predicate.is_satisfied(t))
        .count();
    tracing::debug!(%service, tasks = tasks.len(), ready, "checked tasks");
    Ok(ready > 0)
}
