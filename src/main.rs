// ABOUTME: Entry point for the ecs-deploy CLI application.
// ABOUTME: Parses arguments, resolves configuration, and dispatches to the selected pipeline.

use clap::Parser;
use ecs_deploy::cli::Cli;
use ecs_deploy::commands;
use ecs_deploy::config::{DeployConfig, Mode, RevisionSource};
use ecs_deploy::error::{Error, Result};
use ecs_deploy::output::{Output, OutputMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    if let Err(e) = run(&cli, &mut output).await {
        output.error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: &Cli, output: &mut Output) -> Result<()> {
    let config = DeployConfig::from_cli(cli)?;
    output.start_timer();

    let mut aws = commands::connect(&config, output).await?;

    let result = match (config.mode(), &config.source, &config.run_task) {
        (Mode::RunTask, _, Some(options)) => {
            commands::run_task(&aws, &config, options, output).await
        }
        (Mode::ServiceUpdate, RevisionSource::Service(service), _) => {
            commands::deploy(&aws, &config, service, output).await
        }
        (Mode::RegisterOnly, _, _) => commands::register(&aws, &config, output).await,
        _ => Err(Error::InvalidConfig("inconsistent deployment mode".to_string())),
    };

    if aws.release_credentials() {
        tracing::debug!("released scoped credentials");
    }
    result
}
