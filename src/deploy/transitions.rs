// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use tokio::time::{Instant, sleep};

use crate::cluster::{
    ClusterApi, DefinitionStatus, DeploymentConfiguration, SortOrder, TaskDefinitionDescription,
    UpdateServiceRequest,
};
use crate::taskdef::TaskDefinitionDraft;
use crate::types::RevisionArn;

use super::error::{DeployError, WaitStage};
use super::health::{HealthPredicate, revision_ready};
use super::state::{Completed, Healthy, Initialized, Registered, Updated};
use super::{DEPLOYMENT_POLL_INTERVAL, Deployment, TASK_POLL_INTERVAL};

/// Result type for transitions that may need rollback on failure.
pub type TransitionResult<T, S> = Result<Deployment<T>, (Deployment<S>, DeployError)>;

/// Register `draft` as a new revision of its family.
///
/// # Errors
///
/// Returns `DeployError::Registration` if the API rejects the document.
pub async fn register_revision<A: ClusterApi + ?Sized>(
    api: &A,
    draft: &TaskDefinitionDraft,
) -> Result<RevisionArn, DeployError> {
    let revision = api
        .register_task_definition(draft.document(), draft.tags())
        .await
        .map_err(DeployError::Registration)?;
    tracing::info!(%revision, tags = draft.tags().len(), "registered task definition");
    Ok(revision)
}

/// Describe the definition a new revision is built from.
///
/// With `use_latest` this is the newest ACTIVE revision of `family`;
/// otherwise `revision` itself.
pub async fn describe_source<A: ClusterApi + ?Sized>(
    api: &A,
    revision: &RevisionArn,
    use_latest: bool,
    include_tags: bool,
) -> Result<TaskDefinitionDescription, DeployError> {
    let source = if use_latest {
        latest_revision(api, revision.family()).await?
    } else {
        revision.clone()
    };

    api.describe_task_definition(source.as_str(), include_tags)
        .await
        .map_err(|e| DeployError::Describe {
            what: format!("task definition {source}"),
            source: e,
        })
}

async fn latest_revision<A: ClusterApi + ?Sized>(
    api: &A,
    family: &str,
) -> Result<RevisionArn, DeployError> {
    let revisions = api
        .list_task_definitions(family, DefinitionStatus::Active, SortOrder::Desc)
        .await
        .map_err(|source| DeployError::Describe {
            what: format!("revisions of {family}"),
            source,
        })?;

    // The listing matches by prefix.
    revisions
        .into_iter()
        .find(|r| r.family() == family)
        .ok_or_else(|| DeployError::NoActiveRevision(family.to_string()))
}

// =============================================================================
// Initialized -> Registered
// =============================================================================

impl Deployment<Initialized> {
    /// Register the new revision and pick its health predicate.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Registration` if the API rejects the document.
    #[must_use = "deployment state must be used"]
    pub async fn register<A: ClusterApi + ?Sized>(
        self,
        api: &A,
        draft: &TaskDefinitionDraft,
    ) -> TransitionResult<Registered, Initialized> {
        match register_revision(api, draft).await {
            Ok(revision) => {
                let predicate = HealthPredicate::for_draft(draft);
                Ok(self.transition(Registered {
                    revision,
                    predicate,
                }))
            }
            Err(e) => Err((self, e)),
        }
    }

    /// Redeploy the current revision without registering a new one.
    ///
    /// Task health is not checked; the returned deployment goes straight to
    /// the drain check and cannot be rolled back.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::ServiceUpdate` if the API rejects the update.
    #[must_use = "deployment state must be used"]
    pub async fn force_new_deployment<A: ClusterApi + ?Sized>(
        self,
        api: &A,
        deployment_configuration: DeploymentConfiguration,
    ) -> TransitionResult<Healthy, Initialized> {
        let mut request = UpdateServiceRequest::force_redeploy(&self.cluster, &self.service);
        request.desired_count = self.desired_override;
        request.deployment_configuration = deployment_configuration;

        if let Err(e) = api.update_service(&request).await {
            return Err((self, DeployError::ServiceUpdate(e)));
        }
        tracing::info!(service = %self.service, revision = %self.previous, "forced new deployment");

        let revision = self.previous.clone();
        Ok(self.transition(Healthy { revision }))
    }
}

// =============================================================================
// Registered -> Updated
// =============================================================================

impl Deployment<Registered> {
    /// Point the service at the new revision.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::ServiceUpdate` if the API rejects the update.
    #[must_use = "deployment state must be used"]
    pub async fn update_service<A: ClusterApi + ?Sized>(
        self,
        api: &A,
        deployment_configuration: DeploymentConfiguration,
    ) -> TransitionResult<Updated, Registered> {
        let mut request =
            UpdateServiceRequest::to_revision(&self.cluster, &self.service, &self.state.revision);
        request.desired_count = self.desired_override;
        request.deployment_configuration = deployment_configuration;

        if let Err(e) = api.update_service(&request).await {
            return Err((self, DeployError::ServiceUpdate(e)));
        }
        tracing::info!(
            service = %self.service,
            from = %self.previous,
            to = %self.state.revision,
            "service updated"
        );

        let Registered {
            revision,
            predicate,
        } = self.state.clone();
        Ok(self.transition(Updated {
            revision,
            predicate,
        }))
    }
}

// =============================================================================
// Updated -> Healthy
// =============================================================================

impl Deployment<Updated> {
    /// Poll until a task of the new revision passes the health predicate.
    ///
    /// A desired count of zero succeeds immediately without probing.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Timeout` when no task is ready within the
    /// timeout, and `DeployError::Polling` if a status query fails. Both
    /// hand the deployment back so the caller can roll back.
    #[must_use = "deployment state must be used"]
    pub async fn wait_for_healthy<A: ClusterApi + ?Sized>(
        self,
        api: &A,
    ) -> TransitionResult<Healthy, Updated> {
        if self.desired_count == 0 {
            tracing::info!(service = %self.service, "desired count is 0, not waiting for tasks");
            return Ok(self.into_healthy());
        }

        let start = Instant::now();
        while start.elapsed() < self.timeout {
            let ready = revision_ready(
                api,
                &self.cluster,
                &self.service,
                &self.state.revision,
                self.state.predicate,
            )
            .await;

            match ready {
                Ok(true) => {
                    tracing::info!(
                        service = %self.service,
                        elapsed = ?start.elapsed(),
                        "new revision is healthy"
                    );
                    return Ok(self.into_healthy());
                }
                Ok(false) => {}
                Err(source) => {
                    return Err((
                        self,
                        DeployError::Polling {
                            stage: WaitStage::HealthyTasks,
                            source,
                        },
                    ));
                }
            }

            sleep(TASK_POLL_INTERVAL).await;
        }

        let timeout = self.timeout;
        Err((
            self,
            DeployError::Timeout {
                stage: WaitStage::HealthyTasks,
                timeout,
            },
        ))
    }

    fn into_healthy(self) -> Deployment<Healthy> {
        let revision = self.state.revision.clone();
        self.transition(Healthy { revision })
    }
}

// =============================================================================
// Healthy -> Completed
// =============================================================================

impl Deployment<Healthy> {
    /// Poll until the service reports a single non-INACTIVE deployment.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Timeout` if older deployments are still around
    /// at the timeout, and `DeployError::Polling` if describing the service
    /// fails.
    #[must_use = "deployment state must be used"]
    pub async fn wait_for_drain<A: ClusterApi + ?Sized>(
        self,
        api: &A,
    ) -> TransitionResult<Completed, Healthy> {
        let start = Instant::now();
        while start.elapsed() < self.timeout {
            match api.describe_service(&self.cluster, &self.service).await {
                Ok(service) => {
                    let active = service.active_deployments();
                    tracing::debug!(service = %self.service, active, "deployments in flight");
                    if active == 1 {
                        tracing::info!(service = %self.service, "old deployments drained");
                        return Ok(self.skip_drain());
                    }
                }
                Err(source) => {
                    return Err((
                        self,
                        DeployError::Polling {
                            stage: WaitStage::Drain,
                            source,
                        },
                    ));
                }
            }

            sleep(DEPLOYMENT_POLL_INTERVAL).await;
        }

        let timeout = self.timeout;
        Err((
            self,
            DeployError::Timeout {
                stage: WaitStage::Drain,
                timeout,
            },
        ))
    }

    /// Finish without waiting for old deployments to drain.
    pub fn skip_drain(self) -> Deployment<Completed> {
        let revision = self.state.revision.clone();
        self.transition(Completed { revision })
    }
}

// =============================================================================
// Completed - Terminal State
// =============================================================================

impl Deployment<Completed> {
    /// Consume the deployment and return the revision now running.
    pub fn finish(self) -> RevisionArn {
        self.state.revision
    }
}
