use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use ontoscan::cli_types::{Cli, Commands, ExtractArgs};
use ontoscan::CliApp;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v flags when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let app = CliApp::new(&cli)?;

    match cli.command {
        None => app.extract(ExtractArgs::default())?,
        Some(Commands::Extract(args)) => app.extract(args)?,
        Some(Commands::Analyze(args)) => app.analyze(args)?,
        Some(Commands::Insights(args)) => app.insights(args)?,
        Some(Commands::Verify(args)) => {
            if !app.verify(args)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(Commands::Config) => app.show_config()?,
    }

    Ok(ExitCode::SUCCESS)
}
