//! # Template Replication
//!
//! Builds the output workbook: one clone of the template sheet per record, each
//! with the record's fields written into four fixed cells.

use crate::config::{Config, ConfigError, FieldCells};
use crate::error::{LoadSheetError, RowProcessingWarning};
use crate::normalize::CanonicalRecord;
use crate::spreadsheet::writer::{INVALID_SHEET_NAME_CHARS, MAX_SHEET_NAME_LENGTH};
use crate::spreadsheet::{CellFormat, OutputWorkbook, TemplateWorkbook, Worksheet};
use chrono::{NaiveDate, TimeDelta};
use log::{debug, info, warn};
use std::fmt::Write;

/// Name used when a record has neither a truck nor run numbers
pub const DEFAULT_SHEET_NAME: &str = "Sheet";

/// Output of one replication pass.
#[derive(Clone, Debug)]
pub struct Replication {
    pub workbook: OutputWorkbook,
    /// Styling that could not be carried over, one entry per affected slot and sheet
    pub warnings: Vec<RowProcessingWarning>,
}

/// Replicates a template sheet once per record.
#[derive(Clone, Debug)]
pub struct TemplateReplicator {
    fields: FieldCells,
    date_format: String,
    date_offset_days: i64,
}

impl TemplateReplicator {
    pub fn new(fields: FieldCells, date_format: impl Into<String>, date_offset_days: i64) -> Self {
        TemplateReplicator {
            fields,
            date_format: date_format.into(),
            date_offset_days,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.fields, config.date_format.as_str(), config.date_offset_days)
    }

    /// Text written into the date field for a pass run on `today`.
    pub fn date_text(&self, today: NaiveDate) -> Result<String, LoadSheetError> {
        let out_of_range = || ConfigError::DateOutOfRange {
            today,
            offset: self.date_offset_days,
        };
        let date = TimeDelta::try_days(self.date_offset_days)
            .and_then(|delta| today.checked_add_signed(delta))
            .ok_or_else(out_of_range)?;

        // `to_string` would panic on a pattern chrono cannot render
        let mut text = String::new();
        write!(text, "{}", date.format(&self.date_format))
            .map_err(|_| ConfigError::InvalidDateFormat(self.date_format.to_owned()))?;
        Ok(text)
    }

    /// Produces one sheet per record, in record order.
    ///
    /// # Errors
    ///
    /// * [`LoadSheetError::EmptyExtraction`] when `records` is empty
    /// * [`LoadSheetError::ConfigError`] when the date field cannot be rendered
    pub fn replicate(
        &self,
        template: &TemplateWorkbook,
        records: Vec<CanonicalRecord>,
        today: NaiveDate,
    ) -> Result<Replication, LoadSheetError> {
        if records.is_empty() {
            return Err(LoadSheetError::EmptyExtraction);
        }
        let date = self.date_text(today)?;

        let mut workbook = OutputWorkbook::new(template.default_style.clone(), template.theme.clone())
            .with_colors(template.colors.clone());
        let mut warnings = Vec::new();
        for (row_index, record) in records.into_iter().enumerate() {
            let name = unique_sheet_name(&workbook, &sheet_name_candidate(&record), row_index);
            let mut sheet = clone_template(&template.sheet, name, &mut warnings);
            self.inject(&mut sheet, &record, &date);
            debug!("Row {} -> sheet '{}'", row_index + 1, sheet.name);
            workbook.push_sheet(sheet)?;
        }

        info!(
            "Replicated template '{}' into {} sheets with {} warnings",
            template.source_name,
            workbook.len(),
            warnings.len()
        );
        Ok(Replication { workbook, warnings })
    }

    fn inject(&self, sheet: &mut Worksheet, record: &CanonicalRecord, date: &str) {
        sheet.set_value(self.fields.run_numbers, record.run_numbers.as_str());
        sheet.set_value(self.fields.truck, record.truck.as_str());
        sheet.set_value(self.fields.drivers, record.drivers());
        sheet.set_value(self.fields.date, date);
    }
}

/// Copies `template` under `name`. Formats that could not be resolved when the
/// template was read are reset to the default and reported in `warnings`.
fn clone_template(template: &Worksheet, name: String, warnings: &mut Vec<RowProcessingWarning>) -> Worksheet {
    let mut sheet = template.clone();
    for (location, format) in sheet.formats_mut() {
        if let CellFormat::Unreadable { index, reason } = format {
            let warning = RowProcessingWarning {
                sheet: name.to_owned(),
                location,
                reason: format!("style {index} dropped: {reason}"),
            };
            warn!("{}", warning);
            warnings.push(warning);
            *format = CellFormat::Default;
        }
    }
    sheet.name = name;
    sheet
}

/// Sheet name for `record` before collision handling: the truck, else the run
/// numbers, else [`DEFAULT_SHEET_NAME`]. Characters Excel rejects become `-`.
pub fn sheet_name_candidate(record: &CanonicalRecord) -> String {
    let source = [record.truck.as_str(), record.run_numbers.as_str()]
        .into_iter()
        .find(|value| !value.is_empty())
        .unwrap_or(DEFAULT_SHEET_NAME);

    let replaced = source
        .chars()
        .map(|c| if INVALID_SHEET_NAME_CHARS.contains(&c) || c.is_control() { '-' } else { c })
        .collect::<String>();
    let truncated = trim_sheet_name(&replaced)
        .chars()
        .take(MAX_SHEET_NAME_LENGTH)
        .collect::<String>();

    match trim_sheet_name(&truncated) {
        "" => DEFAULT_SHEET_NAME.to_owned(),
        name => name.to_owned(),
    }
}

/// Returns `candidate` if `workbook` has no sheet by that name, otherwise
/// `candidate_<row_index + 1>`, counting upward until the name is free.
pub fn unique_sheet_name(workbook: &OutputWorkbook, candidate: &str, row_index: usize) -> String {
    if !workbook.contains_sheet(candidate) {
        return candidate.to_owned();
    }
    let mut counter = row_index + 1;
    loop {
        let suffix = format!("_{counter}");
        let base = candidate
            .chars()
            .take(MAX_SHEET_NAME_LENGTH.saturating_sub(suffix.len()))
            .collect::<String>();
        let name = format!("{}{}", base.trim_end(), suffix);
        if !workbook.contains_sheet(&name) {
            return name;
        }
        counter += 1;
    }
}

fn trim_sheet_name(name: &str) -> &str {
    name.trim_matches(|c: char| c == '\'' || c.is_whitespace())
}
