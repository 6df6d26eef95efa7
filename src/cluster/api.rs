// ABOUTME: Cluster API trait consumed by the deployment engine.
// ABOUTME: Describe, register, update, list, deregister, and run-task operations.

use super::error::ApiError;
use super::types::{
    DefinitionStatus, DesiredStatus, RunTaskRequest, ServiceDescription, SortOrder, Tag,
    TaskDefinitionDescription, TaskDescription, UpdateServiceRequest,
};
use crate::types::{RevisionArn, ServiceName, TaskArn};
use async_trait::async_trait;
use nonempty::NonEmpty;

/// The container-cluster operations the deployment engine relies on.
///
/// Every call is a synchronous request/response; any non-success response is
/// an [`ApiError`] and the engine never retries it.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Describe one service of a cluster.
    async fn describe_service(
        &self,
        cluster: &str,
        service: &ServiceName,
    ) -> Result<ServiceDescription, ApiError>;

    /// Describe a task definition by family, `family:revision` or ARN.
    async fn describe_task_definition(
        &self,
        task_definition: &str,
        include_tags: bool,
    ) -> Result<TaskDefinitionDescription, ApiError>;

    /// Register a new revision from a definition document.
    async fn register_task_definition(
        &self,
        document: &serde_json::Map<String, serde_json::Value>,
        tags: &[Tag],
    ) -> Result<RevisionArn, ApiError>;

    /// Update a service (revision, desired count, limits or forced redeploy).
    async fn update_service(&self, request: &UpdateServiceRequest) -> Result<(), ApiError>;

    /// List task ARNs of a service with the given desired status.
    async fn list_tasks(
        &self,
        cluster: &str,
        service: &ServiceName,
        status: DesiredStatus,
    ) -> Result<Vec<TaskArn>, ApiError>;

    /// Describe specific tasks.
    async fn describe_tasks(
        &self,
        cluster: &str,
        tasks: &NonEmpty<TaskArn>,
    ) -> Result<Vec<TaskDescription>, ApiError>;

    /// List revisions whose family starts with `family_prefix`.
    async fn list_task_definitions(
        &self,
        family_prefix: &str,
        status: DefinitionStatus,
        sort: SortOrder,
    ) -> Result<Vec<RevisionArn>, ApiError>;

    /// Mark a revision INACTIVE.
    async fn deregister_task_definition(&self, revision: &RevisionArn) -> Result<(), ApiError>;

    /// Launch a one-off task and return its ARN.
    async fn run_task(&self, request: &RunTaskRequest) -> Result<TaskArn, ApiError>;
}
