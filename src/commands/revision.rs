// ABOUTME: Shared steps for producing a new task definition revision.
// ABOUTME: Describes the source definition, rewrites images, and warns when nothing matched.

use crate::cluster::ClusterApi;
use crate::config::{DeployConfig, RevisionSource};
use crate::deploy::describe_source;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::output::Output;
use crate::taskdef::TaskDefinitionDraft;
use crate::types::RevisionArn;

/// The revision named by the configuration: a service's current one or the
/// given task definition.
pub async fn source_revision<A: ClusterApi + ?Sized>(
    api: &A,
    config: &DeployConfig,
) -> Result<RevisionArn> {
    match config.source {
        RevisionSource::Service(ref service) => {
            let current = api.describe_service(&config.cluster, service).await?;
            Ok(current.task_definition)
        }
        RevisionSource::TaskDefinition(ref name) => Ok(RevisionArn::new(name.clone())),
    }
}

/// Describe the source definition and build the new revision from it.
pub async fn prepare_draft<A: ClusterApi + ?Sized>(
    api: &A,
    revision: &RevisionArn,
    config: &DeployConfig,
    output: &Output,
    diag: &mut Diagnostics,
) -> Result<TaskDefinitionDraft> {
    let image = config
        .image
        .as_ref()
        .ok_or_else(|| Error::InvalidConfig("an image or a tag-only value is required".into()))?;

    output.progress(&format!("  → Reading task definition {revision}..."));
    let source =
        describe_source(api, revision, config.use_latest_revision, config.copy_tags).await?;
    let draft = TaskDefinitionDraft::build(&source, image, config.copy_tags)?;

    if draft.rewritten_containers() == 0 {
        diag.warn(Warning::unmatched_image(format!(
            "no container in {} uses {}; the new revision keeps the current images",
            draft.family(),
            image
        )));
    }
    for image in draft.images() {
        output.progress(&format!("  → Image: {image}"));
    }

    Ok(draft)
}
