//! slicedb CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use slicedb::{pipeline, Cli, PipelineConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            e.exit_code()
        }
    }
}

fn init_logging(debug: bool) {
    let directive = if debug { "slicedb=debug" } else { "slicedb=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> slicedb::Result<()> {
    let config = PipelineConfig::from_cli(cli)?;
    tracing::debug!("Parsed config: {:?}", redacted(&config));

    let stats = pipeline::run(&config)?;
    if let Ok(json) = serde_json::to_string(&stats) {
        tracing::debug!("Snapshot stats: {}", json);
    }
    Ok(())
}

fn redacted(config: &PipelineConfig) -> PipelineConfig {
    let mut shown = config.clone();
    if shown.token.is_some() {
        shown.token = Some("***".to_string());
    }
    shown
}
