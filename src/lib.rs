//! # Truck Load Sheets
//!
//! Turns a recognised driver-schedule table into a workbook of per-truck load
//! records. Each table row becomes one sheet cloned from a template workbook,
//! with the run numbers, truck, drivers and delivery date filled in.
//!
//! ## Stages
//!
//! - [`TableNormalizer`]: locates the Run, Driver 1, Driver 2 and Truck columns
//!   from free-form headers and cleans every cell
//! - [`TemplateReplicator`]: copies the template sheet once per record, with
//!   every cell style, merged range, column width and row height
//! - [`OutputWorkbook`]: serializes the generated sheets as an xlsx package
//!
//! [`Pipeline`] chains the stages behind the [`TableExtractor`],
//! [`TemplateSource`] and [`Clock`] collaborators.
//!
//! ## Example
//!
//! ```no_run
//! use rusty_loadsheet::{Config, FileTemplateSource, JsonTableExtractor, Pipeline, SystemClock};
//!
//! # fn main() -> Result<(), rusty_loadsheet::LoadSheetError> {
//! let config = Config::default();
//! let template = FileTemplateSource::new(&config.template_path);
//! let pipeline = Pipeline::new(&config, JsonTableExtractor, template, SystemClock);
//! let delivery = pipeline.run(&std::fs::read("schedule.json")?)?;
//! delivery.save(std::path::Path::new(&delivery.filename))?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod helpers;
pub mod normalize;
pub mod pipeline;
pub mod replicate;
pub mod spreadsheet;
pub mod table;

#[cfg(test)]
mod testutil;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{load_config, Config, FieldCells};
pub use error::{ErrorKind, LoadSheetError, RowProcessingWarning};
pub use normalize::{CanonicalRecord, ColumnRole, TableNormalizer};
pub use pipeline::{
    BytesTemplateSource, Delivery, FileTemplateSource, JsonTableExtractor, Pipeline, TableExtractor, TemplateSource,
};
pub use replicate::{Replication, TemplateReplicator};
pub use spreadsheet::{OutputWorkbook, TemplateWorkbook};
pub use table::RawTable;
