//! CLI entry point for grid-cli.

use clap::Parser;
use cli::CliConfig;

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .with_target(false)
        .init();
    config.run()
}
