// ABOUTME: Integration tests for the ecs-deploy binary.
// ABOUTME: Validates --help output, argument conflicts, and exit codes for invalid input.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn ecs_deploy_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ecs-deploy"));
    cmd.env_remove("AWS_PROFILE");
    cmd
}

#[test]
fn help_lists_deployment_flags() {
    ecs_deploy_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--cluster"))
        .stdout(predicate::str::contains("--service-name"))
        .stdout(predicate::str::contains("--tag-only"))
        .stdout(predicate::str::contains("--enable-rollback"))
        .stdout(predicate::str::contains("--run-task"))
        .stdout(predicate::str::contains("--aws-assume-role"));
}

#[test]
fn missing_cluster_exits_with_config_error() {
    ecs_deploy_cmd()
        .args(["-n", "web", "-i", "registry.example.com/shop/web:v2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cluster"));
}

#[test]
fn unparseable_image_exits_with_parse_error() {
    ecs_deploy_cmd()
        .args(["-c", "prod", "-n", "web", "-i", "/web:v2"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("invalid image reference"));
}

#[test]
fn service_and_task_definition_conflict() {
    ecs_deploy_cmd()
        .args(["-c", "prod", "-n", "web", "-d", "web", "-i", "nginx:1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn json_mode_reports_errors_as_json() {
    ecs_deploy_cmd()
        .args(["-n", "web", "-i", "nginx:1", "--json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("\"event\":\"error\""));
}

#[test]
fn missing_settings_file_is_a_config_error() {
    ecs_deploy_cmd()
        .args(["--config", "/nonexistent/ecs-deploy.yml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn settings_file_is_validated_before_any_aws_call() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("deploy.yml");
    fs::write(&path, "cluster: prod\nservice: web\n").unwrap();

    ecs_deploy_cmd()
        .arg("--config")
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("image"));
}

#[test]
fn plain_mode_reports_errors_as_text() {
    ecs_deploy_cmd()
        .args(["-n", "web", "-i", "nginx:1", "--quiet"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error: "))
        .stderr(predicate::str::contains("\"event\"").not());
}
