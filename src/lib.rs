// ABOUTME: Library root for ecs-deploy - exposes the deployment engine for the binary and tests.
// ABOUTME: The main binary in main.rs only parses flags and dispatches to commands.

pub mod cli;
pub mod cluster;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod task;
pub mod taskdef;
pub mod types;
