//! # Table Normalization
//!
//! Turns the raw OCR table into canonical `{run numbers, drivers, truck}` records.
//! Columns are located through an ordered alias table, so header spellings such as
//! `"DRIVER_1"`, `"driver 1"` or `"Driver1"` all resolve to the same role, and each
//! cell is scrubbed by a role-specific cleaner.

pub mod clean;
pub mod column;

pub use clean::{clean_driver, clean_truck, extract_run_numbers, FIELD_SEPARATOR};
pub use column::{clean_header, resolve_columns, AliasTable, ColumnRole, ResolvedColumns};

use crate::config::Config;
use crate::error::LoadSheetError;
use crate::table::{RawTable, Row};
use log::debug;

/// One schedule row after cleaning.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CanonicalRecord {
    /// Zero or more 4-digit run numbers joined by `" / "`
    pub run_numbers: String,
    pub driver1: String,
    pub driver2: String,
    pub truck: String,
}

impl CanonicalRecord {
    /// Both drivers joined by `" / "`, leaving out whichever side is empty.
    pub fn drivers(&self) -> String {
        [self.driver1.as_str(), self.driver2.as_str()]
            .into_iter()
            .filter(|driver| !driver.is_empty())
            .collect::<Vec<_>>()
            .join(FIELD_SEPARATOR)
    }
}

/// Locates the role columns of a [`RawTable`] and cleans every row.
#[derive(Clone, Debug)]
pub struct TableNormalizer {
    aliases: AliasTable,
    truck_length: usize,
}

impl TableNormalizer {
    pub fn new(aliases: AliasTable, truck_length: usize) -> Self {
        TableNormalizer { aliases, truck_length }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.aliases.clone(), config.truck_length)
    }

    /// Resolves the role columns for `headers` without touching any rows.
    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedColumns, LoadSheetError> {
        resolve_columns(&self.aliases, headers)
    }

    /// Normalizes `table` into one record per row, in row order.
    ///
    /// # Errors
    ///
    /// * [`LoadSheetError::EmptyExtraction`] when the table has no rows
    /// * [`LoadSheetError::MissingColumns`] when a required role has no header
    pub fn normalize(&self, table: RawTable) -> Result<Vec<CanonicalRecord>, LoadSheetError> {
        if table.is_empty() {
            return Err(LoadSheetError::EmptyExtraction);
        }
        let columns = self.resolve(&table.headers)?;
        let records = table
            .rows
            .iter()
            .map(|row| self.clean_row(&columns, row))
            .collect::<Vec<_>>();
        debug!("Normalized {} rows", records.len());
        Ok(records)
    }

    fn clean_row(&self, columns: &ResolvedColumns, row: &Row) -> CanonicalRecord {
        let text = |column: usize| row.cell(column).unwrap_or_default();
        CanonicalRecord {
            run_numbers: extract_run_numbers(text(columns.run)),
            driver1: clean_driver(row.cell(columns.driver1)),
            driver2: columns
                .driver2
                .map(|column| clean_driver(row.cell(column)))
                .unwrap_or_default(),
            truck: clean_truck(text(columns.truck), self.truck_length),
        }
    }
}
