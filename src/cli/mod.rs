use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusty_loadsheet::Config;
use simplelog::LevelFilter;

mod columns;
mod fill;

/// Builds per-truck load record workbooks from recognised schedule tables.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Logging level.
    #[arg(long, default_value = "Warn")]
    log_level: LevelFilter,
}

#[derive(Subcommand)]
enum Command {
    Fill(fill::Command),
    Columns(columns::Command),
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default())
        .with_context(|| "configuring logging")?;

    use Command::*;
    match &args.command {
        Fill(cmd) => fill::run(cmd),
        Columns(cmd) => columns::run(cmd),
    }
}

/// Loads the YAML configuration at `path`, or the defaults when none is given.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => rusty_loadsheet::load_config(path)
            .with_context(|| format!("loading configuration from {:?}", path)),
        None => Ok(Config::default()),
    }
}
