// ABOUTME: Run-task command implementation.
// ABOUTME: Registers a new revision, launches it once, and optionally waits for exit code 0.

use super::revision::{prepare_draft, source_revision};
use crate::cluster::{ClusterApi, RunTaskRequest};
use crate::config::{DeployConfig, RunTaskOptions};
use crate::deploy::register_revision;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::output::Output;
use crate::task::{run_task as start_task, wait_for_task};

/// Register a new revision and run it as a one-off task.
pub async fn run_task<A: ClusterApi + ?Sized>(
    api: &A,
    config: &DeployConfig,
    options: &RunTaskOptions,
    output: &Output,
) -> Result<()> {
    let mut diag = Diagnostics::default();

    let source = source_revision(api, config).await?;
    output.progress(&format!(
        "Running a new revision of {} in cluster {}",
        source.family(),
        config.cluster
    ));

    let draft = prepare_draft(api, &source, config, output, &mut diag).await?;
    let revision = register_revision(api, &draft).await?;
    output.progress(&format!("  → Registered {revision}"));

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    let request = RunTaskRequest {
        cluster: config.cluster.clone(),
        task_definition: revision,
        launch_type: options.launch_type.clone(),
        platform_version: options.platform_version.clone(),
        network_configuration: options.network_configuration.clone(),
    };
    let task = start_task(api, &request).await?;
    output.progress(&format!("  → Started task {task}"));

    if !options.wait_for_success {
        output.success(&format!("Task started: {task}"));
        return Ok(());
    }

    output.progress(&format!(
        "  → Waiting for the task to stop (up to {}s)...",
        config.timeout.as_secs()
    ));
    wait_for_task(api, &config.cluster, &task, config.timeout).await?;
    output.success(&format!("Task {task} exited successfully"));
    Ok(())
}
