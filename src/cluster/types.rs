// ABOUTME: Request and response types shared across cluster API operations.
// ABOUTME: ServiceDescription, TaskDescription, UpdateServiceRequest, RunTaskRequest, etc.

use crate::types::{RevisionArn, ServiceName, TaskArn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status ECS reports for deployments that no longer run tasks.
const INACTIVE: &str = "INACTIVE";

/// A service as reported by `describe-services`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescription {
    pub service_name: String,
    #[serde(default)]
    pub service_arn: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Revision the service currently points at.
    pub task_definition: RevisionArn,
    #[serde(default)]
    pub desired_count: u32,
    #[serde(default)]
    pub running_count: u32,
    #[serde(default)]
    pub deployments: Vec<ServiceDeployment>,
}

impl ServiceDescription {
    /// Deleted services are still described, with status INACTIVE.
    pub fn is_inactive(&self) -> bool {
        self.status.as_deref() == Some(INACTIVE)
    }

    /// Number of deployments still running tasks (PRIMARY and ACTIVE).
    pub fn active_deployments(&self) -> usize {
        self.deployments
            .iter()
            .filter(|d| d.status != INACTIVE)
            .count()
    }
}

/// One entry of a service's `deployments` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDeployment {
    #[serde(default)]
    pub id: String,
    pub status: String,
    pub task_definition: RevisionArn,
    #[serde(default)]
    pub desired_count: u32,
    #[serde(default)]
    pub running_count: u32,
    #[serde(default)]
    pub rollout_state: Option<String>,
}

/// A task definition document and its resource tags.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionDescription {
    /// The raw definition document.
    pub task_definition: serde_json::Value,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Resource tag in the ECS wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Rolling-update limits for a service update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeploymentConfiguration {
    pub minimum_healthy_percent: Option<u32>,
    pub maximum_percent: Option<u32>,
}

impl DeploymentConfiguration {
    pub fn is_empty(&self) -> bool {
        self.minimum_healthy_percent.is_none() && self.maximum_percent.is_none()
    }

    /// Shorthand form accepted by the aws CLI, e.g.
    /// `maximumPercent=200,minimumHealthyPercent=100`.
    pub fn shorthand(&self) -> String {
        let mut parts = Vec::new();
        if let Some(max) = self.maximum_percent {
            parts.push(format!("maximumPercent={max}"));
        }
        if let Some(min) = self.minimum_healthy_percent {
            parts.push(format!("minimumHealthyPercent={min}"));
        }
        parts.join(",")
    }
}

/// Parameters of an `update-service` call.
#[derive(Debug, Clone)]
pub struct UpdateServiceRequest {
    pub cluster: String,
    pub service: ServiceName,
    pub task_definition: Option<RevisionArn>,
    pub desired_count: Option<u32>,
    pub deployment_configuration: DeploymentConfiguration,
    pub force_new_deployment: bool,
}

impl UpdateServiceRequest {
    /// Point `service` at `revision`.
    pub fn to_revision(cluster: &str, service: &ServiceName, revision: &RevisionArn) -> Self {
        Self {
            cluster: cluster.to_string(),
            service: service.clone(),
            task_definition: Some(revision.clone()),
            desired_count: None,
            deployment_configuration: DeploymentConfiguration::default(),
            force_new_deployment: false,
        }
    }

    /// Redeploy the current revision without changing it.
    pub fn force_redeploy(cluster: &str, service: &ServiceName) -> Self {
        Self {
            cluster: cluster.to_string(),
            service: service.clone(),
            task_definition: None,
            desired_count: None,
            deployment_configuration: DeploymentConfiguration::default(),
            force_new_deployment: true,
        }
    }
}

/// A task as reported by `describe-tasks`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescription {
    pub task_arn: TaskArn,
    pub task_definition_arn: RevisionArn,
    pub last_status: String,
    #[serde(default)]
    pub health_status: Option<String>,
    #[serde(default)]
    pub stopped_reason: Option<String>,
    #[serde(default)]
    pub containers: Vec<ContainerDescription>,
}

impl TaskDescription {
    /// Exit code of the first container, once it has one.
    pub fn first_exit_code(&self) -> Option<i32> {
        self.containers.first().and_then(|c| c.exit_code)
    }
}

/// One container of a described task.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDescription {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub last_status: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Task status filter for `list-tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredStatus {
    Running,
}

impl DesiredStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesiredStatus::Running => "RUNNING",
        }
    }
}

impl fmt::Display for DesiredStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Revision status filter for `list-task-definitions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionStatus {
    Active,
    Inactive,
}

impl DefinitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionStatus::Active => "ACTIVE",
            DefinitionStatus::Inactive => "INACTIVE",
        }
    }
}

/// Revision ordering for `list-task-definitions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest revision first.
    Asc,
    /// Newest revision first.
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Parameters of a one-off `run-task` call. Optional values are passed
/// through unchanged.
#[derive(Debug, Clone)]
pub struct RunTaskRequest {
    pub cluster: String,
    pub task_definition: RevisionArn,
    pub launch_type: Option<String>,
    pub platform_version: Option<String>,
    pub network_configuration: Option<String>,
}
