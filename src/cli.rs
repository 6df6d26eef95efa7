// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Flags for the target, image, rollout limits, run-task mode, and aws connection.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Default, Parser)]
#[command(name = "ecs-deploy")]
#[command(about = "Blue/green deployments for Amazon ECS services and one-off tasks")]
#[command(version)]
pub struct Cli {
    /// Cluster that runs the service or task
    #[arg(short, long)]
    pub cluster: Option<String>,

    /// Service to update
    #[arg(short = 'n', long = "service-name", conflicts_with = "task_definition")]
    pub service: Option<String>,

    /// Task definition family or revision to build from
    #[arg(short = 'd', long)]
    pub task_definition: Option<String>,

    /// New image, e.g. 123.dkr.ecr.eu-west-1.amazonaws.com/shop/web:v2
    #[arg(short, long)]
    pub image: Option<String>,

    /// Environment variable holding the tag to use when the image has none
    #[arg(short = 'e', long)]
    pub tag_env_var: Option<String>,

    /// Replace only the tag of every container image
    #[arg(long, value_name = "TAG", conflicts_with = "image")]
    pub tag_only: Option<String>,

    /// Desired count for the service after the update
    #[arg(short = 'D', long)]
    pub desired_count: Option<u32>,

    /// Minimum healthy percent during the rollout
    #[arg(short = 'm', long = "min")]
    pub min_healthy_percent: Option<u32>,

    /// Maximum percent during the rollout
    #[arg(short = 'M', long = "max")]
    pub max_percent: Option<u32>,

    /// Seconds to wait for each stage [default: 90]
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Roll back to the previous revision when the rollout times out
    #[arg(long)]
    pub enable_rollback: bool,

    /// Build from the newest active revision of the family
    #[arg(long)]
    pub use_latest_task_def: bool,

    /// Redeploy the current revision without changing the image
    #[arg(long)]
    pub force_new_deployment: bool,

    /// Do not wait for old deployments to drain
    #[arg(long)]
    pub skip_deployments_check: bool,

    /// Number of revisions to keep; older ones are deregistered (0 keeps all)
    #[arg(long, value_name = "COUNT")]
    pub max_definitions: Option<usize>,

    /// Run the new revision as a one-off task instead of updating a service
    #[arg(long, conflicts_with = "force_new_deployment")]
    pub run_task: bool,

    /// Launch type for the one-off task
    #[arg(long)]
    pub launch_type: Option<String>,

    /// Platform version for the one-off task
    #[arg(long)]
    pub platform_version: Option<String>,

    /// Network configuration for the one-off task, in aws shorthand
    #[arg(long)]
    pub network_configuration: Option<String>,

    /// Wait for the one-off task to stop and require exit code 0
    #[arg(long)]
    pub wait_for_success: bool,

    /// Copy the source revision's tags to the new revision
    #[arg(long = "copy-task-definition-tags")]
    pub copy_tags: bool,

    /// AWS region
    #[arg(short, long)]
    pub region: Option<String>,

    /// AWS named profile
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Alternative API endpoint
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// AWS access key id
    #[arg(short = 'k', long = "aws-access-key", requires = "secret_access_key")]
    pub access_key_id: Option<String>,

    /// AWS secret access key
    #[arg(short = 's', long = "aws-secret-key", requires = "access_key_id")]
    pub secret_access_key: Option<String>,

    /// Role to assume for the whole run
    #[arg(short = 'a', long = "aws-assume-role", value_name = "ROLE_ARN")]
    pub assume_role: Option<String>,

    /// Session name for the assumed role
    #[arg(long)]
    pub role_session_name: Option<String>,

    /// YAML settings file; flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Print only the final result
    #[arg(short, long, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines
    #[arg(long)]
    pub json: bool,
}
