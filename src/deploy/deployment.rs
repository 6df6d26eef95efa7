// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Holds the target service and its previous revision for the whole attempt.

use std::time::Duration;

use crate::cluster::{ClusterApi, ServiceDescription};
use crate::types::{RevisionArn, ServiceName};

use super::error::DeployError;
use super::state::{Completed, Healthy, Initialized, Registered, RolledBack, Updated};

/// Which service to deploy and how long to wait for it.
#[derive(Debug, Clone)]
pub struct DeploymentTarget {
    pub cluster: String,
    pub service: ServiceName,
    /// Overrides the service's own desired count.
    pub desired_count: Option<u32>,
    pub timeout: Duration,
}

/// A deployment in progress, parameterized by its current state.
///
/// The previous revision is captured when the deployment starts and is the
/// rollback target for every later state. The state type `S` carries the
/// new revision once one has been registered.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) cluster: String,
    pub(crate) service: ServiceName,
    pub(crate) previous: RevisionArn,
    pub(crate) desired_override: Option<u32>,
    pub(crate) desired_count: u32,
    pub(crate) timeout: Duration,
    pub(crate) state: S,
}

impl Deployment<Initialized> {
    /// Start a deployment from an already-described service.
    pub fn new(target: DeploymentTarget, current: &ServiceDescription) -> Self {
        Deployment {
            desired_count: target.desired_count.unwrap_or(current.desired_count),
            cluster: target.cluster,
            service: target.service,
            previous: current.task_definition.clone(),
            desired_override: target.desired_count,
            timeout: target.timeout,
            state: Initialized,
        }
    }

    /// Describe the target service and start a deployment against it.
    pub async fn start<A: ClusterApi + ?Sized>(
        api: &A,
        target: DeploymentTarget,
    ) -> Result<Self, DeployError> {
        let current = api
            .describe_service(&target.cluster, &target.service)
            .await
            .map_err(|source| DeployError::Describe {
                what: format!("service {}", target.service),
                source,
            })?;
        tracing::info!(
            service = %target.service,
            revision = %current.task_definition,
            desired = current.desired_count,
            "current service state"
        );
        Ok(Self::new(target, &current))
    }
}

impl<S> Deployment<S> {
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    /// Revision the service ran before this deployment.
    pub fn previous_revision(&self) -> &RevisionArn {
        &self.previous
    }

    /// Desired count after the update (override, else the service's).
    pub fn desired_count(&self) -> u32 {
        self.desired_count
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            cluster: self.cluster,
            service: self.service,
            previous: self.previous,
            desired_override: self.desired_override,
            desired_count: self.desired_count,
            timeout: self.timeout,
            state,
        }
    }
}

// State-specific accessors for the new revision
impl Deployment<Registered> {
    pub fn revision(&self) -> &RevisionArn {
        &self.state.revision
    }
}

impl Deployment<Updated> {
    pub fn revision(&self) -> &RevisionArn {
        &self.state.revision
    }
}

impl Deployment<Healthy> {
    pub fn revision(&self) -> &RevisionArn {
        &self.state.revision
    }
}

impl Deployment<Completed> {
    pub fn revision(&self) -> &RevisionArn {
        &self.state.revision
    }
}

impl Deployment<RolledBack> {
    /// The revision that was deployed and then abandoned.
    pub fn abandoned_revision(&self) -> &RevisionArn {
        &self.state.abandoned
    }
}
