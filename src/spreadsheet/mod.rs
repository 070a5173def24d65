//! # Spreadsheet Module
//!
//! In-memory worksheets with owned cell styles, plus the xlsx package reader
//! and writer that move them in and out of files.

pub mod cell;
pub mod reference;
pub mod sheet;
pub mod style;
pub mod writer;
pub mod xlsx;

pub use cell::{Cell, CellValue};
pub use reference::{CellRange, CellRef};
pub use sheet::{ColumnFormat, RowFormat, SheetLayout, Worksheet};
pub use style::{Alignment, Border, CellFormat, CellStyle, Fill, Font, NumberFormat, Protection};
pub use writer::OutputWorkbook;
pub use xlsx::{TemplateWorkbook, XlsxPackage};

use thiserror::Error;

/// Errors raised while reading or writing xlsx packages
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Missing package part '{0}'")]
    FileError(String),

    #[error("Workbook has no sheets")]
    EmptyWorkbook,

    #[error("Package is encrypted or is not an xlsx file")]
    EncryptedPackage,

    #[error("Sheet {0} does not exist")]
    SheetIndexError(usize),

    #[error("Invalid cell value at {reference}: '{value}'")]
    CellValueError { reference: String, value: String },

    #[error("Sheet name '{0}' is already used")]
    DuplicateSheetName(String),

    #[error("Invalid sheet name '{0}'")]
    InvalidSheetName(String),
}
