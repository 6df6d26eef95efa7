// ABOUTME: Application-wide error types for ecs-deploy.
// ABOUTME: Wraps module errors with thiserror and maps each class to a process exit code.

use std::path::PathBuf;
use thiserror::Error;

use crate::cluster::{ApiError, ApiErrorKind};
use crate::deploy::DeployError;
use crate::taskdef::BuildError;
use crate::task::TaskError;
use crate::types::{ParseImageRefError, ServiceNameError};

/// Unexpected internal failure.
pub const EXIT_INTERNAL: i32 = 1;
/// Bad arguments or invalid configuration.
pub const EXIT_CONFIG: i32 = 2;
/// The aws command-line tool is not available.
pub const EXIT_TOOLING: i32 = 3;
/// Unparseable image reference or task definition.
pub const EXIT_PARSE: i32 = 4;
/// The cluster API rejected a request.
pub const EXIT_API: i32 = 5;
/// A deployment or task run timed out.
pub const EXIT_TIMEOUT: i32 = 6;
/// Rolling back after a failed deployment also failed.
pub const EXIT_ROLLBACK: i32 = 7;
/// A one-off task stopped with a failure.
pub const EXIT_TASK_FAILED: i32 = 8;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("settings file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid service name: {0}")]
    ServiceName(#[from] ServiceNameError),

    #[error("invalid image reference: {0}")]
    ImageRef(#[from] ParseImageRefError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_)
            | Error::ConfigNotFound(_)
            | Error::ServiceName(_)
            | Error::Yaml(_) => EXIT_CONFIG,
            Error::ImageRef(_) | Error::Build(_) => EXIT_PARSE,
            Error::Api(e) => api_exit_code(e),
            Error::Deploy(e) => match e {
                DeployError::Timeout { .. } => EXIT_TIMEOUT,
                DeployError::RollbackFailed { .. } => EXIT_ROLLBACK,
                DeployError::Build(_) => EXIT_PARSE,
                DeployError::NoActiveRevision(_) => EXIT_API,
                DeployError::NothingToRollBack => EXIT_INTERNAL,
                other => other.api_error().map_or(EXIT_INTERNAL, api_exit_code),
            },
            Error::Task(e) => match e {
                TaskError::Timeout { .. } => EXIT_TIMEOUT,
                TaskError::ExecutionFailed { .. } => EXIT_TASK_FAILED,
                other => other.api_error().map_or(EXIT_INTERNAL, api_exit_code),
            },
            Error::Io(_) => EXIT_INTERNAL,
        }
    }
}

fn api_exit_code(err: &ApiError) -> i32 {
    match err.kind() {
        ApiErrorKind::ToolingMissing => EXIT_TOOLING,
        ApiErrorKind::Rejected | ApiErrorKind::NotFound => EXIT_API,
        ApiErrorKind::InvalidResponse => EXIT_INTERNAL,
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::WaitStage;
    use crate::types::TaskArn;
    use std::time::Duration;

    #[test]
    fn exit_codes_are_distinct_per_class() {
        let cases = [
            (Error::InvalidConfig("x".into()), EXIT_CONFIG),
            (Error::ImageRef(ParseImageRefError::MissingImageName), EXIT_PARSE),
            (
                Error::Api(ApiError::ToolingMissing {
                    message: "aws".into(),
                }),
                EXIT_TOOLING,
            ),
            (Error::Api(ApiError::rejected("ecs update-service", "denied")), EXIT_API),
            (
                Error::Deploy(DeployError::Timeout {
                    stage: WaitStage::HealthyTasks,
                    timeout: Duration::from_secs(90),
                }),
                EXIT_TIMEOUT,
            ),
            (
                Error::Deploy(DeployError::RollbackFailed {
                    revision: crate::types::RevisionArn::new("web:1"),
                    source: ApiError::rejected("ecs update-service", "denied"),
                }),
                EXIT_ROLLBACK,
            ),
            (
                Error::Task(TaskError::ExecutionFailed {
                    task: TaskArn::new("t"),
                    exit_code: Some(137),
                    reason: None,
                }),
                EXIT_TASK_FAILED,
            ),
            (
                Error::Task(TaskError::Timeout {
                    task: TaskArn::new("t"),
                    timeout: Duration::from_secs(90),
                }),
                EXIT_TIMEOUT,
            ),
        ];

        for (err, code) in cases {
            assert_eq!(err.exit_code(), code, "{err}");
        }
    }

    #[test]
    fn api_failure_inside_deploy_keeps_api_code() {
        let err = Error::Deploy(DeployError::Registration(ApiError::rejected(
            "ecs register-task-definition",
            "bad document",
        )));
        assert_eq!(err.exit_code(), EXIT_API);
    }
}
