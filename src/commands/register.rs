// ABOUTME: Register-only command implementation.
// ABOUTME: Creates the new revision of a task definition family and stops there.

use super::revision::{prepare_draft, source_revision};
use crate::cluster::ClusterApi;
use crate::config::DeployConfig;
use crate::deploy::register_revision;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::output::Output;

/// Register a new revision without deploying it anywhere.
pub async fn register<A: ClusterApi + ?Sized>(
    api: &A,
    config: &DeployConfig,
    output: &Output,
) -> Result<()> {
    let mut diag = Diagnostics::default();

    let source = source_revision(api, config).await?;
    output.progress(&format!("Registering a new revision of {}", source.family()));

    let draft = prepare_draft(api, &source, config, output, &mut diag).await?;
    let revision = register_revision(api, &draft).await?;

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
    output.success(&format!("Registered {revision}"));
    Ok(())
}
