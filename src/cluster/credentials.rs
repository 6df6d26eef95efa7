// ABOUTME: Scoped AWS credentials for child aws processes.
// ABOUTME: Static keys or an assumed role, injected into each child command and nowhere else.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Role session names are limited to 64 characters.
const MAX_SESSION_NAME: usize = 64;

/// Where a credential scope came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialOrigin {
    /// Keys given on the command line or in settings.
    Static,
    /// Temporary credentials from `sts assume-role`.
    AssumedRole { role_arn: String },
}

/// Credentials handed to every aws child process while the scope is alive.
///
/// Nothing is written to this process's environment, so later children
/// started without the scope do not inherit the keys. The values are plain
/// strings and are not zeroed when the scope is dropped.
pub struct CredentialScope {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
    expiration: Option<DateTime<Utc>>,
    origin: CredentialOrigin,
}

impl CredentialScope {
    pub fn static_keys(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            expiration: None,
            origin: CredentialOrigin::Static,
        }
    }

    pub(crate) fn assumed(role_arn: &str, output: AssumeRoleOutput) -> Self {
        let creds = output.credentials;
        Self {
            access_key_id: creds.access_key_id,
            secret_access_key: creds.secret_access_key,
            session_token: Some(creds.session_token),
            expiration: creds.expiration,
            origin: CredentialOrigin::AssumedRole {
                role_arn: role_arn.to_string(),
            },
        }
    }

    pub fn is_assumed_role(&self) -> bool {
        matches!(self.origin, CredentialOrigin::AssumedRole { .. })
    }

    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    /// Environment variables for a child process.
    pub fn env(&self) -> Vec<(&'static str, &str)> {
        let mut env = vec![
            ("AWS_ACCESS_KEY_ID", self.access_key_id.as_str()),
            ("AWS_SECRET_ACCESS_KEY", self.secret_access_key.as_str()),
        ];
        if let Some(ref token) = self.session_token {
            env.push(("AWS_SESSION_TOKEN", token.as_str()));
        }
        env
    }
}

impl std::fmt::Debug for CredentialScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialScope")
            .field("origin", &self.origin)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

impl Drop for CredentialScope {
    fn drop(&mut self) {
        tracing::debug!(origin = ?self.origin, "released credentials");
    }
}

/// Default role session name: `ecs-deploy-<host>-<timestamp>`, trimmed to
/// the characters and length STS accepts.
pub fn default_session_name() -> String {
    let host = gethostname::gethostname().to_string_lossy().into_owned();
    let raw = format!("ecs-deploy-{}-{}", host, Utc::now().format("%Y%m%d%H%M%S"));
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || "+=,.@_-".contains(*c))
        .take(MAX_SESSION_NAME)
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AssumeRoleOutput {
    credentials: StsCredentials,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StsCredentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    #[serde(default)]
    expiration: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_keys_have_no_session_token() {
        let scope = CredentialScope::static_keys("AKIA", "secret");
        let env = scope.env();
        assert_eq!(env.len(), 2);
        assert!(env.iter().all(|(name, _)| *name != "AWS_SESSION_TOKEN"));
        assert!(!scope.is_assumed_role());
    }

    #[test]
    fn assumed_role_parses_sts_output() {
        let json = r#"{
            "Credentials": {
                "AccessKeyId": "ASIA123",
                "SecretAccessKey": "s3cr3t",
                "SessionToken": "token",
                "Expiration": "2030-01-01T00:00:00+00:00"
            },
            "AssumedRoleUser": {"Arn": "arn:aws:sts::1:assumed-role/deploy/x"}
        }"#;
        let output: AssumeRoleOutput = serde_json::from_str(json).unwrap();
        let scope = CredentialScope::assumed("arn:aws:iam::1:role/deploy", output);
        assert!(scope.is_assumed_role());
        assert!(scope.expiration().is_some());
        assert!(scope.env().contains(&("AWS_SESSION_TOKEN", "token")));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let scope = CredentialScope::static_keys("AKIA", "very-secret");
        let debug = format!("{scope:?}");
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("AKIA"));
    }

    #[test]
    fn keys_never_reach_this_process_environment() {
        temp_env::with_vars_unset(["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"], || {
            let scope = CredentialScope::static_keys("AKIA", "very-secret");
            assert_eq!(scope.env().len(), 2);
            drop(scope);
            assert!(std::env::var("AWS_ACCESS_KEY_ID").is_err());
            assert!(std::env::var("AWS_SECRET_ACCESS_KEY").is_err());
        });
    }

    #[test]
    fn session_name_is_valid_for_sts() {
        let name = default_session_name();
        assert!(name.starts_with("ecs-deploy-"));
        assert!(name.len() <= MAX_SESSION_NAME);
    }
}
