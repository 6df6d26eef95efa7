// ABOUTME: YAML settings file mirroring the command-line flags.
// ABOUTME: Every field is optional; flags given on the command line take precedence.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub cluster: Option<String>,
    pub service: Option<String>,
    pub task_definition: Option<String>,
    pub image: Option<String>,
    pub tag_env_var: Option<String>,
    pub tag_only: Option<String>,
    pub desired_count: Option<u32>,
    pub min_healthy_percent: Option<u32>,
    pub max_percent: Option<u32>,
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub enable_rollback: bool,
    pub use_latest_task_def: bool,
    pub force_new_deployment: bool,
    pub skip_deployments_check: bool,
    pub max_definitions: Option<usize>,
    pub run_task: bool,
    pub launch_type: Option<String>,
    pub platform_version: Option<String>,
    pub network_configuration: Option<String>,
    pub wait_for_success: bool,
    pub copy_tags: bool,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
    pub assume_role: Option<String>,
    pub role_session_name: Option<String>,
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_humantime_timeout() {
        let settings = Settings::from_yaml("cluster: prod\ntimeout: 2m\n").unwrap();
        assert_eq!(settings.cluster.as_deref(), Some("prod"));
        assert_eq!(settings.timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn empty_document_is_default() {
        let settings = Settings::from_yaml("{}").unwrap();
        assert!(settings.cluster.is_none());
        assert!(!settings.enable_rollback);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_yaml("clustr: prod\n").is_err());
    }
}
