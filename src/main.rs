use clap::Parser;
use mountrouter::cli::{run_cli, Cli};
use mountrouter::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    init_logging(&LogConfig::from_env())?;
    run_cli(Cli::parse())
}
