// ABOUTME: Error types for one-off task runs.
// ABOUTME: Distinguishes launch failures, failed executions, and timeouts.

use std::time::Duration;

use crate::cluster::ApiError;
use crate::types::TaskArn;

/// Errors from running a one-off task.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The task could not be started.
    #[error("failed to start task: {0}")]
    Launch(#[source] ApiError),

    /// Describing the task failed while waiting.
    #[error("failed to check task {task}: {source}")]
    Polling {
        task: TaskArn,
        #[source]
        source: ApiError,
    },

    /// The task stopped with a non-zero or missing exit code.
    #[error("task {task} failed: {}", failure_detail(.exit_code, .reason))]
    ExecutionFailed {
        task: TaskArn,
        exit_code: Option<i32>,
        reason: Option<String>,
    },

    /// The task was still running at the timeout.
    #[error("task {task} still running after {}s", .timeout.as_secs())]
    Timeout { task: TaskArn, timeout: Duration },
}

impl TaskError {
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            TaskError::Launch(source) | TaskError::Polling { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn failure_detail(exit_code: &Option<i32>, reason: &Option<String>) -> String {
    let code = match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    };
    match reason {
        Some(reason) => format!("{code} ({reason})"),
        None => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_failure_message() {
        let err = TaskError::ExecutionFailed {
            task: TaskArn::new("arn:aws:ecs:eu-west-1:1:task/jobs/abc"),
            exit_code: Some(137),
            reason: Some("OutOfMemoryError".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "task arn:aws:ecs:eu-west-1:1:task/jobs/abc failed: exit code 137 (OutOfMemoryError)"
        );
    }

    #[test]
    fn missing_exit_code_message() {
        let err = TaskError::ExecutionFailed {
            task: TaskArn::new("t"),
            exit_code: None,
            reason: None,
        };
        assert!(err.to_string().ends_with("no exit code"));
    }
}
