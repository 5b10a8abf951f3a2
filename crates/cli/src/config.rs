//! Command-line configuration.
//!
//! Settings resolve in three layers: [`GridConfig`] defaults, then the JSON
//! file given with `--config`, then explicit flags.

use crate::commands::{Command, CommandResult};
use anyhow::Context;
use clap::{ArgAction, Parser};
use corelib::{HashKind, RingKind};
use grid::GridConfig;
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "grid-cli", version, about = "Inspect and exercise the actor grid's hash ring")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    /// Ring variant: array, list or map
    #[arg(long, global = true)]
    pub ring: Option<RingKind>,

    /// Hash function: murmur3, md5 or xxh3
    #[arg(long, global = true)]
    pub hash: Option<HashKind>,

    /// Points per node
    #[arg(long, global = true)]
    pub points: Option<usize>,

    /// JSON grid configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CliConfig {
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Effective grid configuration.
    pub fn grid_config(&self) -> anyhow::Result<GridConfig> {
        let mut config = match &self.config {
            Some(path) => GridConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => GridConfig::default(),
        };
        if let Some(ring) = self.ring {
            config.ring = ring;
        }
        if let Some(hash) = self.hash {
            config.hash = hash;
        }
        if let Some(points) = self.points {
            config.points_per_node = points;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn execute(&self) -> anyhow::Result<CommandResult> {
        let config = self.grid_config()?;
        self.command.execute(&config)
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let result = self.execute()?;
        println!("{result}");
        Ok(())
    }
}
