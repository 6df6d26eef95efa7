// ABOUTME: Cluster API abstraction and the aws command-line implementation.
// ABOUTME: The deployment engine only talks to clusters through the ClusterApi trait.

mod api;
mod aws_cli;
mod credentials;
mod error;
mod types;

pub use api::ClusterApi;
pub use aws_cli::{AwsCli, AwsCliConfig, register_input, run_task_args, update_service_args};
pub use credentials::{CredentialScope, default_session_name};
pub use error::{ApiError, ApiErrorKind};
pub use types::{
    ContainerDescription, DefinitionStatus, DeploymentConfiguration, DesiredStatus, RunTaskRequest,
    ServiceDeployment, ServiceDescription, SortOrder, Tag, TaskDefinitionDescription,
    TaskDescription, UpdateServiceRequest,
};
