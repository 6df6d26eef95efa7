// ABOUTME: ClusterApi implementation that drives the aws command-line tool.
// ABOUTME: Builds `aws ecs ...` invocations, applies scoped credentials, and parses JSON output.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use nonempty::NonEmpty;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use tokio::process::Command;

use super::api::ClusterApi;
use super::credentials::{AssumeRoleOutput, CredentialScope};
use super::error::{ApiError, InvalidResponseSnafu};
use super::types::{
    DefinitionStatus, DesiredStatus, RunTaskRequest, ServiceDescription, SortOrder, Tag,
    TaskDefinitionDescription, TaskDescription, UpdateServiceRequest,
};
use crate::types::{RevisionArn, ServiceName, TaskArn};

const DEFAULT_PROGRAM: &str = "aws";

/// `describe-tasks` accepts at most this many task ARNs per call.
const DESCRIBE_TASKS_BATCH: usize = 100;

/// Connection settings shared by every aws invocation.
#[derive(Debug, Clone, Default)]
pub struct AwsCliConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// Cluster API backed by the `aws` executable.
#[derive(Debug)]
pub struct AwsCli {
    program: PathBuf,
    config: AwsCliConfig,
    credentials: Option<CredentialScope>,
}

impl AwsCli {
    pub fn new(config: AwsCliConfig) -> Self {
        let credentials = match (&config.access_key_id, &config.secret_access_key) {
            (Some(key), Some(secret)) => Some(CredentialScope::static_keys(key, secret)),
            _ => None,
        };
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            config,
            credentials,
        }
    }

    /// Use a different executable (tests, non-standard installs).
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Check that the tool is installed; returns its version banner.
    pub async fn detect(&self) -> Result<String, ApiError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ApiError::ToolingMissing {
                message: format!("{}: {}", self.program.display(), e),
            })?;

        if !output.status.success() {
            return Err(ApiError::ToolingMissing {
                message: format!(
                    "{} --version exited with {}",
                    self.program.display(),
                    output.status
                ),
            });
        }

        // aws v1 printed its banner to stderr.
        let banner = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        Ok(String::from_utf8_lossy(&banner).trim().to_string())
    }

    /// Replace the current credentials with a temporary session for `role_arn`.
    pub async fn assume_role(
        &mut self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<(), ApiError> {
        let args = vec![
            "--role-arn".to_string(),
            role_arn.to_string(),
            "--role-session-name".to_string(),
            session_name.to_string(),
        ];
        let output: AssumeRoleOutput = self.call("sts", "assume-role", args).await?;
        let scope = CredentialScope::assumed(role_arn, output);
        tracing::info!(role = role_arn, expiration = ?scope.expiration(), "assumed role");
        self.credentials = Some(scope);
        Ok(())
    }

    /// Drop any scoped credentials. Returns whether there were some.
    pub fn release_credentials(&mut self) -> bool {
        self.credentials.take().is_some()
    }

    pub fn credentials(&self) -> Option<&CredentialScope> {
        self.credentials.as_ref()
    }

    fn command(&self, service: &str, operation: &str, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(service).arg(operation).args(args);
        cmd.args(["--output", "json"]);

        if let Some(ref region) = self.config.region {
            cmd.args(["--region", region]);
        }
        if let Some(ref endpoint) = self.config.endpoint_url {
            cmd.args(["--endpoint-url", endpoint]);
        }

        match &self.credentials {
            // A profile would take precedence over the assumed session.
            Some(scope) if scope.is_assumed_role() => {
                cmd.envs(scope.env());
            }
            Some(scope) => {
                cmd.envs(scope.env());
                cmd.env_remove("AWS_SESSION_TOKEN");
                if let Some(ref profile) = self.config.profile {
                    cmd.args(["--profile", profile]);
                }
            }
            None => {
                if let Some(ref profile) = self.config.profile {
                    cmd.args(["--profile", profile]);
                }
            }
        }

        cmd.env("AWS_PAGER", "")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    async fn invoke(
        &self,
        service: &str,
        operation: &str,
        args: Vec<String>,
    ) -> Result<Vec<u8>, ApiError> {
        let label = format!("{service} {operation}");
        tracing::debug!(operation = %label, ?args, "invoking aws");

        let output = self
            .command(service, operation, &args)
            .output()
            .await
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    ApiError::ToolingMissing {
                        message: format!("{} not found", self.program.display()),
                    }
                } else {
                    ApiError::Spawn {
                        operation: label.clone(),
                        source,
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(ApiError::rejected(label, message));
        }

        Ok(output.stdout)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        service: &str,
        operation: &str,
        args: Vec<String>,
    ) -> Result<T, ApiError> {
        let stdout = self.invoke(service, operation, args).await?;
        serde_json::from_slice(&stdout).context(InvalidResponseSnafu {
            operation: format!("{service} {operation}"),
        })
    }

    async fn ecs<T: DeserializeOwned>(
        &self,
        operation: &str,
        args: Vec<String>,
    ) -> Result<T, ApiError> {
        self.call("ecs", operation, args).await
    }
}

#[async_trait]
impl ClusterApi for AwsCli {
    async fn describe_service(
        &self,
        cluster: &str,
        service: &ServiceName,
    ) -> Result<ServiceDescription, ApiError> {
        let args = strings(["--cluster", cluster, "--services", service.as_str()]);
        let output: DescribeServicesOutput = self.ecs("describe-services", args).await?;

        match output.services.into_iter().next() {
            Some(found) if !found.is_inactive() => Ok(found),
            Some(_) => Err(ApiError::not_found(
                format!("service {service}"),
                format!("service is INACTIVE in cluster {cluster}"),
            )),
            None => Err(ApiError::not_found(
                format!("service {service}"),
                failure_reason(&output.failures),
            )),
        }
    }

    async fn describe_task_definition(
        &self,
        task_definition: &str,
        include_tags: bool,
    ) -> Result<TaskDefinitionDescription, ApiError> {
        let mut args = strings(["--task-definition", task_definition]);
        if include_tags {
            args.extend(strings(["--include", "TAGS"]));
        }
        self.ecs("describe-task-definition", args).await
    }

    async fn register_task_definition(
        &self,
        document: &serde_json::Map<String, serde_json::Value>,
        tags: &[Tag],
    ) -> Result<RevisionArn, ApiError> {
        let input = register_input(document, tags);
        let args = vec!["--cli-input-json".to_string(), input.to_string()];
        let output: RegisterOutput = self.ecs("register-task-definition", args).await?;
        Ok(output.task_definition.task_definition_arn)
    }

    async fn update_service(&self, request: &UpdateServiceRequest) -> Result<(), ApiError> {
        let args = update_service_args(request);
        let _: serde::de::IgnoredAny = self.ecs("update-service", args).await?;
        Ok(())
    }

    async fn list_tasks(
        &self,
        cluster: &str,
        service: &ServiceName,
        status: DesiredStatus,
    ) -> Result<Vec<TaskArn>, ApiError> {
        let args = strings([
            "--cluster",
            cluster,
            "--service-name",
            service.as_str(),
            "--desired-status",
            status.as_str(),
        ]);
        let output: ListTasksOutput = self.ecs("list-tasks", args).await?;
        Ok(output.task_arns)
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        tasks: &NonEmpty<TaskArn>,
    ) -> Result<Vec<TaskDescription>, ApiError> {
        let mut found = Vec::with_capacity(tasks.len());
        let mut failures = Vec::new();
        for args in describe_tasks_args(cluster, tasks) {
            let output: DescribeTasksOutput = self.ecs("describe-tasks", args).await?;
            found.extend(output.tasks);
            failures.extend(output.failures);
        }
        if found.is_empty() && !failures.is_empty() {
            return Err(ApiError::not_found("tasks", failure_reason(&failures)));
        }
        Ok(found)
    }

    async fn list_task_definitions(
        &self,
        family_prefix: &str,
        status: DefinitionStatus,
        sort: SortOrder,
    ) -> Result<Vec<RevisionArn>, ApiError> {
        let args = strings([
            "--family-prefix",
            family_prefix,
            "--status",
            status.as_str(),
            "--sort",
            sort.as_str(),
        ]);
        let output: ListTaskDefinitionsOutput = self.ecs("list-task-definitions", args).await?;
        Ok(output.task_definition_arns)
    }

    async fn deregister_task_definition(&self, revision: &RevisionArn) -> Result<(), ApiError> {
        let args = strings(["--task-definition", revision.as_str()]);
        let _: serde::de::IgnoredAny = self.ecs("deregister-task-definition", args).await?;
        Ok(())
    }

    async fn run_task(&self, request: &RunTaskRequest) -> Result<TaskArn, ApiError> {
        let output: RunTaskOutput = self.ecs("run-task", run_task_args(request)).await?;
        output
            .tasks
            .into_iter()
            .next()
            .map(|t| t.task_arn)
            .ok_or_else(|| ApiError::rejected("ecs run-task", failure_reason(&output.failures)))
    }
}

/// Arguments for each `aws ecs describe-tasks` call, in batches the API accepts.
pub fn describe_tasks_args(cluster: &str, tasks: &NonEmpty<TaskArn>) -> Vec<Vec<String>> {
    let tasks: Vec<&TaskArn> = tasks.iter().collect();
    tasks
        .chunks(DESCRIBE_TASKS_BATCH)
        .map(|batch| {
            let mut args = strings(["--cluster", cluster, "--tasks"]);
            args.extend(batch.iter().map(|t| t.to_string()));
            args
        })
        .collect()
}

/// Arguments for `aws ecs update-service`.
pub fn update_service_args(request: &UpdateServiceRequest) -> Vec<String> {
    let mut args = strings([
        "--cluster",
        request.cluster.as_str(),
        "--service",
        request.service.as_str(),
    ]);
    if let Some(ref revision) = request.task_definition {
        args.extend(strings(["--task-definition", revision.as_str()]));
    }
    if let Some(count) = request.desired_count {
        args.extend(["--desired-count".to_string(), count.to_string()]);
    }
    if !request.deployment_configuration.is_empty() {
        args.extend([
            "--deployment-configuration".to_string(),
            request.deployment_configuration.shorthand(),
        ]);
    }
    if request.force_new_deployment {
        args.push("--force-new-deployment".to_string());
    }
    args
}

/// Arguments for `aws ecs run-task`.
pub fn run_task_args(request: &RunTaskRequest) -> Vec<String> {
    let mut args = strings([
        "--cluster",
        request.cluster.as_str(),
        "--task-definition",
        request.task_definition.as_str(),
    ]);
    if let Some(ref launch_type) = request.launch_type {
        args.extend(strings(["--launch-type", launch_type]));
    }
    if let Some(ref version) = request.platform_version {
        args.extend(strings(["--platform-version", version]));
    }
    if let Some(ref network) = request.network_configuration {
        args.extend(strings(["--network-configuration", network]));
    }
    args
}

/// `--cli-input-json` payload for `register-task-definition`.
pub fn register_input(
    document: &serde_json::Map<String, serde_json::Value>,
    tags: &[Tag],
) -> serde_json::Value {
    let mut input = document.clone();
    if !tags.is_empty() {
        input.insert("tags".to_string(), serde_json::json!(tags));
    }
    serde_json::Value::Object(input)
}

fn strings<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn failure_reason(failures: &[Failure]) -> String {
    if failures.is_empty() {
        return "no result returned".to_string();
    }
    failures
        .iter()
        .map(|f| match (&f.arn, &f.reason) {
            (Some(arn), Some(reason)) => format!("{arn}: {reason}"),
            (None, Some(reason)) => reason.clone(),
            (Some(arn), None) => arn.clone(),
            (None, None) => "unknown failure".to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Deserialize)]
struct Failure {
    #[serde(default)]
    arn: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DescribeServicesOutput {
    #[serde(default)]
    services: Vec<ServiceDescription>,
    #[serde(default)]
    failures: Vec<Failure>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterOutput {
    task_definition: RegisteredDefinition,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisteredDefinition {
    task_definition_arn: RevisionArn,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksOutput {
    #[serde(default)]
    task_arns: Vec<TaskArn>,
}

#[derive(Debug, Deserialize)]
struct DescribeTasksOutput {
    #[serde(default)]
    tasks: Vec<TaskDescription>,
    #[serde(default)]
    failures: Vec<Failure>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTaskDefinitionsOutput {
    #[serde(default)]
    task_definition_arns: Vec<RevisionArn>,
}

#[derive(Debug, Deserialize)]
struct RunTaskOutput {
    #[serde(default)]
    tasks: Vec<TaskDescription>,
    #[serde(default)]
    failures: Vec<Failure>,
}
