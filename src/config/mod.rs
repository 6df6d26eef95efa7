// ABOUTME: Deployment configuration built from command-line flags and an optional YAML file.
// ABOUTME: Validates mutually exclusive options and freezes everything into one DeployConfig.

mod settings;

pub use settings::Settings;

use crate::cli::Cli;
use crate::cluster::{AwsCliConfig, DeploymentConfiguration};
use crate::error::{Error, Result};
use crate::types::{ImageTarget, ServiceName};
use std::time::Duration;

/// Default wait for each polling stage.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

/// Where the new revision is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionSource {
    /// The revision a service currently runs.
    Service(ServiceName),
    /// A family name, `family:revision` or revision ARN.
    TaskDefinition(String),
}

/// What the run does with the new revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Update the service and wait for it to settle.
    ServiceUpdate,
    /// Launch the revision as a one-off task.
    RunTask,
    /// Only register the revision.
    RegisterOnly,
}

/// One-off task options, passed to the API unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTaskOptions {
    pub launch_type: Option<String>,
    pub platform_version: Option<String>,
    pub network_configuration: Option<String>,
    pub wait_for_success: bool,
}

/// Role assumed for the duration of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRole {
    pub role_arn: String,
    pub session_name: Option<String>,
}

/// Everything a run needs, validated and immutable.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub cluster: String,
    pub source: RevisionSource,
    /// `None` only for a forced redeploy.
    pub image: Option<ImageTarget>,
    pub desired_count: Option<u32>,
    pub deployment_configuration: DeploymentConfiguration,
    pub timeout: Duration,
    pub enable_rollback: bool,
    pub use_latest_revision: bool,
    pub force_new_deployment: bool,
    pub skip_deployments_check: bool,
    /// Revisions to keep after a successful deployment; 0 disables pruning.
    pub max_definitions: usize,
    pub run_task: Option<RunTaskOptions>,
    pub copy_tags: bool,
    pub aws: AwsCliConfig,
    pub assume_role: Option<AssumeRole>,
}

impl DeployConfig {
    /// Load the settings file named by `--config`, if any, and resolve.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let settings = match cli.config {
            Some(ref path) => Settings::load(path)?,
            None => Settings::default(),
        };
        Self::resolve(cli, settings)
    }

    /// Merge flags over file settings and validate the result.
    ///
    /// The tag fallback is read from the environment variable named by
    /// `tag_env_var` at this point.
    pub fn resolve(cli: &Cli, settings: Settings) -> Result<Self> {
        let cluster = cli
            .cluster
            .clone()
            .or(settings.cluster)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| invalid("a cluster is required"))?;

        let service = cli.service.clone().or(settings.service);
        let task_definition = cli.task_definition.clone().or(settings.task_definition);
        let source = match (service, task_definition) {
            (Some(_), Some(_)) => {
                return Err(invalid(
                    "a service and a task definition are mutually exclusive",
                ));
            }
            (Some(service), None) => RevisionSource::Service(ServiceName::new(&service)?),
            (None, Some(family)) if !family.trim().is_empty() => {
                RevisionSource::TaskDefinition(family.trim().to_string())
            }
            _ => return Err(invalid("either a service or a task definition is required")),
        };

        let force_new_deployment = cli.force_new_deployment || settings.force_new_deployment;
        let run_task = cli.run_task || settings.run_task;
        let wait_for_success = cli.wait_for_success || settings.wait_for_success;
        let launch_type = cli.launch_type.clone().or(settings.launch_type);
        let platform_version = cli.platform_version.clone().or(settings.platform_version);
        let network_configuration = cli
            .network_configuration
            .clone()
            .or(settings.network_configuration);

        if force_new_deployment && !matches!(source, RevisionSource::Service(_)) {
            return Err(invalid("forcing a new deployment requires a service"));
        }
        if force_new_deployment && run_task {
            return Err(invalid(
                "forcing a new deployment and running a task are mutually exclusive",
            ));
        }
        let has_task_options = wait_for_success
            || launch_type.is_some()
            || platform_version.is_some()
            || network_configuration.is_some();
        if has_task_options && !run_task {
            return Err(invalid("task launch options require run-task mode"));
        }

        let image = cli.image.clone().or(settings.image);
        let tag_only = cli.tag_only.clone().or(settings.tag_only);
        let tag_env_var = cli.tag_env_var.clone().or(settings.tag_env_var);
        let tag_fallback = tag_env_var.and_then(|name| std::env::var(name).ok());

        let image = match (image, tag_only) {
            (Some(_), Some(_)) => {
                return Err(invalid("an image and a tag-only value are mutually exclusive"));
            }
            (Some(_), None) | (None, Some(_)) if force_new_deployment => {
                return Err(invalid(
                    "forcing a new deployment keeps the current image; drop the image option",
                ));
            }
            (Some(image), None) => {
                Some(ImageTarget::parse(&image, false, tag_fallback.as_deref())?)
            }
            (None, Some(tag)) => Some(ImageTarget::parse(&tag, true, tag_fallback.as_deref())?),
            (None, None) if force_new_deployment => None,
            (None, None) => {
                return Err(invalid("an image or a tag-only value is required"));
            }
        };

        let desired_count = cli.desired_count.or(settings.desired_count);
        let deployment_configuration = DeploymentConfiguration {
            minimum_healthy_percent: cli.min_healthy_percent.or(settings.min_healthy_percent),
            maximum_percent: cli.max_percent.or(settings.max_percent),
        };
        let service_only = desired_count.is_some() || !deployment_configuration.is_empty();
        if service_only && !matches!(source, RevisionSource::Service(_)) {
            return Err(invalid(
                "desired count and rollout limits only apply to a service",
            ));
        }
        if let (Some(min), Some(max)) = (
            deployment_configuration.minimum_healthy_percent,
            deployment_configuration.maximum_percent,
        ) && max < min
        {
            return Err(invalid(format!(
                "maximum percent ({max}) is below minimum healthy percent ({min})"
            )));
        }

        let timeout = cli
            .timeout
            .map(Duration::from_secs)
            .or(settings.timeout)
            .unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(invalid("timeout must be greater than zero"));
        }

        let assume_role = cli
            .assume_role
            .clone()
            .or(settings.assume_role)
            .map(|role_arn| AssumeRole {
                role_arn,
                session_name: cli.role_session_name.clone().or(settings.role_session_name),
            });

        Ok(Self {
            cluster,
            source,
            image,
            desired_count,
            deployment_configuration,
            timeout,
            enable_rollback: cli.enable_rollback || settings.enable_rollback,
            use_latest_revision: cli.use_latest_task_def || settings.use_latest_task_def,
            force_new_deployment,
            skip_deployments_check: cli.skip_deployments_check || settings.skip_deployments_check,
            max_definitions: cli.max_definitions.or(settings.max_definitions).unwrap_or(0),
            run_task: run_task.then_some(RunTaskOptions {
                launch_type,
                platform_version,
                network_configuration,
                wait_for_success,
            }),
            copy_tags: cli.copy_tags || settings.copy_tags,
            aws: AwsCliConfig {
                region: cli.region.clone().or(settings.region),
                profile: cli.profile.clone().or(settings.profile),
                endpoint_url: cli.endpoint_url.clone().or(settings.endpoint_url),
                access_key_id: cli.access_key_id.clone(),
                secret_access_key: cli.secret_access_key.clone(),
            },
            assume_role,
        })
    }

    pub fn mode(&self) -> Mode {
        match (&self.run_task, &self.source) {
            (Some(_), _) => Mode::RunTask,
            (None, RevisionSource::Service(_)) => Mode::ServiceUpdate,
            (None, RevisionSource::TaskDefinition(_)) => Mode::RegisterOnly,
        }
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidConfig(message.into())
}
