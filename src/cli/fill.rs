use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use rusty_loadsheet::{Clock, FileTemplateSource, FixedClock, JsonTableExtractor, Pipeline, SystemClock};

/// Fills one copy of the template per row of a recognised schedule table.
#[derive(Args, Debug)]
pub struct Command {
    /// Path to the JSON export of the recognised table.
    #[arg(long)]
    table: PathBuf,

    /// Path to the template workbook. Defaults to `template_path` from the
    /// configuration.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Path of the generated workbook. Defaults to `output_filename` from the
    /// configuration.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Path to a YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Date the delivery date is counted from, as YYYY-MM-DD. Defaults to the
    /// local date.
    #[arg(long)]
    today: Option<NaiveDate>,
}

/// Runs the subcommand.
pub fn run(cmd: &Command) -> Result<()> {
    let config = super::load_config(cmd.config.as_deref())?;
    let template = cmd.template.clone().unwrap_or_else(|| config.template_path.clone());
    let today = FixedClock(cmd.today.unwrap_or_else(|| SystemClock.today()));

    let pipeline = Pipeline::new(&config, JsonTableExtractor, FileTemplateSource::new(template), today);
    let table = fs::read(&cmd.table).with_context(|| format!("reading table from {:?}", cmd.table))?;
    let delivery = pipeline.run(&table)?;

    let output = cmd
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&delivery.filename));
    delivery
        .save(&output)
        .with_context(|| format!("writing workbook to {:?}", output))?;

    for warning in &delivery.warnings {
        eprintln!("warning: {warning}");
    }
    println!("Wrote {} sheets to {}", delivery.workbook.len(), output.display());
    Ok(())
}
