// ABOUTME: Automatic rollback to the revision a service ran before the deployment.
// ABOUTME: Issues exactly one service update back to the previous revision.

use crate::cluster::{ClusterApi, UpdateServiceRequest};
use crate::types::RevisionArn;

use super::Deployment;
use super::error::DeployError;
use super::state::{Healthy, RolledBack, Updated};

mod private {
    pub trait Sealed {}
}

/// States in which the service already points at the deployed revision and
/// can be pointed back.
pub trait Rollbackable: private::Sealed {
    /// The revision the service was pointed at by this deployment.
    fn deployed_revision(&self) -> &RevisionArn;
}

impl private::Sealed for Updated {}
impl Rollbackable for Updated {
    fn deployed_revision(&self) -> &RevisionArn {
        &self.revision
    }
}

impl private::Sealed for Healthy {}
impl Rollbackable for Healthy {
    fn deployed_revision(&self) -> &RevisionArn {
        &self.revision
    }
}

impl<S: Rollbackable> Deployment<S> {
    /// Point the service back at the previous revision.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::NothingToRollBack` after a forced redeploy of the
    /// same revision, and `DeployError::RollbackFailed` if the update is
    /// rejected.
    #[must_use = "deployment state must be used"]
    pub async fn rollback<A: ClusterApi + ?Sized>(
        self,
        api: &A,
    ) -> Result<Deployment<RolledBack>, DeployError> {
        let abandoned = self.state.deployed_revision().clone();
        if abandoned == self.previous {
            return Err(DeployError::NothingToRollBack);
        }

        tracing::warn!(
            service = %self.service,
            from = %abandoned,
            to = %self.previous,
            "rolling back"
        );
        let request =
            UpdateServiceRequest::to_revision(&self.cluster, &self.service, &self.previous);
        api.update_service(&request)
            .await
            .map_err(|source| DeployError::RollbackFailed {
                revision: self.previous.clone(),
                source,
            })?;

        Ok(self.transition(RolledBack { abandoned }))
    }
}
