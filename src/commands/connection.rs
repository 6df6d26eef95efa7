// ABOUTME: Shared helper for preparing the aws command-line client.
// ABOUTME: Checks the tool is installed and assumes the configured role.

use crate::cluster::{AwsCli, default_session_name};
use crate::config::DeployConfig;
use crate::error::Result;
use crate::output::Output;

/// Build the cluster client for a run.
///
/// This handles the common pattern of:
/// 1. Verifying the aws tool is available
/// 2. Assuming the configured role, if any
pub async fn connect(config: &DeployConfig, output: &Output) -> Result<AwsCli> {
    let mut aws = AwsCli::new(config.aws.clone());

    output.progress("→ Checking aws CLI...");
    let version = aws.detect().await?;
    output.progress(&format!("  → Found {version}"));

    if let Some(ref role) = config.assume_role {
        let session_name = role
            .session_name
            .clone()
            .unwrap_or_else(default_session_name);
        output.progress(&format!("  → Assuming role {}...", role.role_arn));
        aws.assume_role(&role.role_arn, &session_name).await?;
    }

    Ok(aws)
}
