#![recursion_limit = "256"]

mod adapters;
mod application;
mod cli;
mod data;
mod domain;
mod editor;
mod infra;
mod ml;
mod profiling;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ml_pipeline=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
