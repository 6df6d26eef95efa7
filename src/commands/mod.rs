// ABOUTME: Command module aggregator for the ecs-deploy CLI.
// ABOUTME: Re-exports the service deploy, run-task, and register-only pipelines.

mod connection;
mod deploy;
mod register;
mod revision;
mod run_task;

pub use connection::connect;
pub use deploy::{deploy, deploy_service};
pub use register::register;
pub use run_task::run_task;
