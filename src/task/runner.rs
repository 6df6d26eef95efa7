// ABOUTME: Runs a one-off task and waits for it to stop.
// ABOUTME: Success is a first-container exit code of zero.

use std::time::Duration;

use nonempty::NonEmpty;
use tokio::time::{Instant, sleep};

use crate::cluster::{ApiError, ClusterApi, RunTaskRequest, TaskDescription};
use crate::deploy::TASK_POLL_INTERVAL;
use crate::types::TaskArn;

use super::error::TaskError;

const STOPPED: &str = "STOPPED";

/// Last observed state of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub task: TaskArn,
    pub last_status: String,
    pub exit_code: Option<i32>,
}

impl TaskSnapshot {
    fn from_description(task: &TaskDescription) -> Self {
        Self {
            task: task.task_arn.clone(),
            last_status: task.last_status.clone(),
            exit_code: task.first_exit_code(),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.last_status == STOPPED
    }
}

/// Start a one-off task.
///
/// # Errors
///
/// Returns `TaskError::Launch` if the API rejects the request.
pub async fn run_task<A: ClusterApi + ?Sized>(
    api: &A,
    request: &RunTaskRequest,
) -> Result<TaskArn, TaskError> {
    let task = api.run_task(request).await.map_err(TaskError::Launch)?;
    tracing::info!(%task, revision = %request.task_definition, "started task");
    Ok(task)
}

/// Poll `task` until it stops, then judge it by its exit code.
///
/// # Errors
///
/// Returns `TaskError::ExecutionFailed` for a non-zero or missing exit
/// code, `TaskError::Timeout` if the task is still running at `timeout`,
/// and `TaskError::Polling` if describing the task fails.
pub async fn wait_for_task<A: ClusterApi + ?Sized>(
    api: &A,
    cluster: &str,
    task: &TaskArn,
    timeout: Duration,
) -> Result<TaskSnapshot, TaskError> {
    let tasks = NonEmpty::new(task.clone());
    let start = Instant::now();

    while start.elapsed() < timeout {
        let described = api
            .describe_tasks(cluster, &tasks)
            .await
            .map_err(|source| TaskError::Polling {
                task: task.clone(),
                source,
            })?;

        let description = described
            .into_iter()
            .find(|t| t.task_arn == *task)
            .ok_or_else(|| TaskError::Polling {
                task: task.clone(),
                source: ApiError::not_found(
                    format!("task {task}"),
                    "not returned by describe-tasks",
                ),
            })?;

        let snapshot = TaskSnapshot::from_description(&description);
        tracing::debug!(%task, status = %snapshot.last_status, "task status");

        if snapshot.is_stopped() {
            return match snapshot.exit_code {
                Some(0) => {
                    tracing::info!(%task, "task succeeded");
                    Ok(snapshot)
                }
                exit_code => Err(TaskError::ExecutionFailed {
                    task: task.clone(),
                    exit_code,
                    reason: description.stopped_reason,
                }),
            };
        }

        sleep(TASK_POLL_INTERVAL).await;
    }

    Err(TaskError::Timeout {
        task: task.clone(),
        timeout,
    })
}
