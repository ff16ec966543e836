use anyhow::{Context, Result};
use clap::Parser;
use qbench::{Args, Harness, RunConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = RunConfig::resolve(&args);
    let report = Harness::new(config)
        .run()
        .context("benchmark run failed")?;

    print!("{report}");
    Ok(())
}
