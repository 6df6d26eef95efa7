// ABOUTME: Deploy command implementation.
// ABOUTME: Drives the service deployment state machine, rollback, and revision pruning.

use super::revision::prepare_draft;
use crate::cluster::ClusterApi;
use crate::config::DeployConfig;
use crate::deploy::{
    DeployError, Deployment, DeploymentTarget, Healthy, Rollbackable, prune_revisions,
};
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::output::Output;
use crate::types::{RevisionArn, ServiceName};

/// Deploy a new revision (or force a redeploy) of `service`.
pub async fn deploy<A: ClusterApi + ?Sized>(
    api: &A,
    config: &DeployConfig,
    service: &ServiceName,
    output: &Output,
) -> Result<()> {
    let mut diag = Diagnostics::default();

    output.progress(&format!("Deploying {service} in cluster {}", config.cluster));
    let result = deploy_service(api, config, service, output, &mut diag).await;

    // Emit collected warnings
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    let revision = result?;
    output.success(&format!("Deployed {revision} to {service}"));
    Ok(())
}

/// Run one service deployment, collecting warnings into `diag`.
///
/// Pruning only happens after the new revision has settled. On a timeout
/// with rollback enabled the service is pointed back first and the timeout
/// is still returned.
pub async fn deploy_service<A: ClusterApi + ?Sized>(
    api: &A,
    config: &DeployConfig,
    service: &ServiceName,
    output: &Output,
    diag: &mut Diagnostics,
) -> Result<RevisionArn> {
    let target = DeploymentTarget {
        cluster: config.cluster.clone(),
        service: service.clone(),
        desired_count: config.desired_count,
        timeout: config.timeout,
    };
    let deployment = Deployment::start(api, target).await?;
    output.progress(&format!("  → Current revision: {}", deployment.previous_revision()));

    let healthy = if config.force_new_deployment {
        output.progress("  → Forcing a new deployment of the current revision...");
        deployment
            .force_new_deployment(api, config.deployment_configuration)
            .await
            .map_err(|(_, e)| e)?
    } else {
        let draft = prepare_draft(api, deployment.previous_revision(), config, output, diag).await?;

        output.progress("  → Registering new revision...");
        let registered = deployment.register(api, &draft).await.map_err(|(_, e)| e)?;
        output.progress(&format!("  → Registered {}", registered.revision()));

        output.progress("  → Updating service...");
        let updated = registered
            .update_service(api, config.deployment_configuration)
            .await
            .map_err(|(_, e)| e)?;

        output.progress(&format!(
            "  → Waiting for healthy tasks (up to {}s)...",
            config.timeout.as_secs()
        ));
        match updated.wait_for_healthy(api).await {
            Ok(healthy) => healthy,
            Err((failed, e)) => return Err(recover(api, failed, e, config, output, diag).await),
        }
    };

    let revision = settle(api, healthy, config, output, diag).await?;

    if config.max_definitions > 0 {
        prune(api, &revision, config, output, diag).await;
    }

    Ok(revision)
}

/// Wait for old deployments to drain unless that check is skipped.
async fn settle<A: ClusterApi + ?Sized>(
    api: &A,
    healthy: Deployment<Healthy>,
    config: &DeployConfig,
    output: &Output,
    diag: &mut Diagnostics,
) -> Result<RevisionArn> {
    if config.skip_deployments_check {
        return Ok(healthy.skip_drain().finish());
    }

    output.progress("  → Waiting for old deployments to drain...");
    match healthy.wait_for_drain(api).await {
        Ok(completed) => Ok(completed.finish()),
        Err((failed, e)) => Err(recover(api, failed, e, config, output, diag).await),
    }
}

/// Turn a failed wait into the error to report, rolling back first when the
/// wait timed out and rollback is enabled.
async fn recover<A, S>(
    api: &A,
    failed: Deployment<S>,
    error: DeployError,
    config: &DeployConfig,
    output: &Output,
    diag: &mut Diagnostics,
) -> Error
where
    A: ClusterApi + ?Sized,
    S: Rollbackable,
{
    output.progress(&format!("  ✗ {error}"));
    if !error.is_timeout() || !config.enable_rollback {
        return error.into();
    }
    if config.force_new_deployment {
        diag.warn(Warning::rollback_skipped(format!(
            "not rolling back {}: a forced redeploy has no earlier revision to restore",
            failed.service()
        )));
        return error.into();
    }

    output.progress(&format!("  → Rolling back to {}...", failed.previous_revision()));
    match failed.rollback(api).await {
        Ok(rolled_back) => {
            output.progress(&format!(
                "  ✓ Rolled back {} to {}",
                rolled_back.service(),
                rolled_back.previous_revision()
            ));
            error.into()
        }
        Err(rollback_error) => rollback_error.into(),
    }
}

/// Deregister old revisions; failures only produce warnings.
async fn prune<A: ClusterApi + ?Sized>(
    api: &A,
    revision: &RevisionArn,
    config: &DeployConfig,
    output: &Output,
    diag: &mut Diagnostics,
) {
    output.progress(&format!(
        "  → Keeping the newest {} revision(s) of {}...",
        config.max_definitions,
        revision.family()
    ));

    match prune_revisions(api, revision.family(), config.max_definitions, revision).await {
        Ok(result) => {
            if !result.deregistered.is_empty() {
                output.progress(&format!(
                    "  → Deregistered {} old revision(s)",
                    result.deregistered.len()
                ));
            }
            for failure in &result.failed {
                diag.warn(Warning::prune_failed(format!(
                    "failed to deregister {}: {}",
                    failure.revision, failure.error
                )));
            }
        }
        Err(e) => diag.warn(Warning::prune_failed(e.to_string())),
    }
}
