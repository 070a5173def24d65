use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rusty_loadsheet::{ColumnRole, RawTable, TableNormalizer};

/// Shows which table header each column role resolves to.
#[derive(Args, Debug)]
pub struct Command {
    /// Path to the JSON export of the recognised table.
    #[arg(long)]
    table: PathBuf,

    /// Path to a YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn run(cmd: &Command) -> Result<()> {
    let config = super::load_config(cmd.config.as_deref())?;
    let bytes = fs::read(&cmd.table).with_context(|| format!("reading table from {:?}", cmd.table))?;
    let table = RawTable::from_json(&bytes).with_context(|| format!("parsing table {:?}", cmd.table))?;

    let columns = TableNormalizer::from_config(&config).resolve(&table.headers)?;
    for role in ColumnRole::ALL {
        match columns.index(role) {
            Some(index) => println!("{:<10}{:?}", role.to_string(), table.headers[index]),
            None => println!("{:<10}(not found)", role.to_string()),
        }
    }
    println!("{} rows", table.rows.len());
    Ok(())
}
