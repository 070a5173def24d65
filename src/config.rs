//! Pipeline configuration, loaded from YAML with a default for every key.

use crate::error::LoadSheetError;
use crate::normalize::{AliasTable, ColumnRole};
use crate::spreadsheet::reference::CellRef;
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Date format '{0}' is not a valid strftime pattern")]
    InvalidDateFormat(String),

    #[error("No aliases configured for required column {0}")]
    NoAliases(ColumnRole),

    #[error("Date offset of {offset} days from {today} is out of range")]
    DateOutOfRange { today: chrono::NaiveDate, offset: i64 },
}

/// Explicit settings for one pipeline. An empty YAML document yields
/// [`Config::default`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Number of characters kept from the trimmed truck cell
    pub truck_length: usize,
    /// Ordered header aliases per column role
    pub aliases: AliasTable,
    /// Template coordinates receiving the record fields
    pub fields: FieldCells,
    /// Days added to the current date for the date field
    pub date_offset_days: i64,
    /// chrono strftime pattern for the date field
    pub date_format: String,
    /// Template workbook used when no other is given
    pub template_path: PathBuf,
    /// Suggested file name of the generated workbook
    pub output_filename: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            truck_length: 8,
            aliases: AliasTable::default(),
            fields: FieldCells::default(),
            date_offset_days: 1,
            date_format: "%d/%m/%Y".to_owned(),
            template_path: PathBuf::from("Truck_Load_Record_Template.xlsx"),
            output_filename: "truck_load_records.xlsx".to_owned(),
        }
    }
}

/// Fixed cells overwritten on every generated sheet.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldCells {
    pub run_numbers: CellRef,
    pub truck: CellRef,
    pub drivers: CellRef,
    pub date: CellRef,
}

impl Default for FieldCells {
    fn default() -> Self {
        FieldCells {
            run_numbers: CellRef::new(2, 1),
            truck: CellRef::new(2, 8),
            drivers: CellRef::new(3, 1),
            date: CellRef::new(3, 8),
        }
    }
}

impl Config {
    /// Parses and validates a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, LoadSheetError> {
        // An empty document deserializes as unit, not as an empty mapping.
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks settings that deserialization alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidDateFormat(self.date_format.to_owned()));
        }
        for role in ColumnRole::ALL.into_iter().filter(ColumnRole::is_required) {
            if self.aliases.aliases(role).is_empty() {
                return Err(ConfigError::NoAliases(role));
            }
        }
        Ok(())
    }
}

/// Loads the configuration from the YAML file at `path`.
pub fn load_config(path: &Path) -> Result<Config, LoadSheetError> {
    let yaml = fs::read_to_string(path)?;
    Config::from_yaml_str(&yaml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use std::io::Write;

    #[googletest::test]
    fn empty_document_is_default() {
        let config = Config::from_yaml_str("").unwrap();
        expect_that!(config, eq(&Config::default()));
    }

    #[googletest::test]
    fn partial_document_overrides_named_keys() {
        let config = Config::from_yaml_str(
            r#"
            truck_length: 6
            fields:
              date: K5
            aliases:
              truck: [unit]
            "#,
        )
        .unwrap();

        expect_that!(config.truck_length, eq(6));
        expect_that!(config.fields.date, eq(CellRef::new(4, 10)));
        expect_that!(config.fields.run_numbers, eq(CellRef::new(2, 1)));
        expect_that!(config.aliases.truck, eq(&vec!["unit".to_owned()]));
        expect_that!(config.aliases.run, eq(&vec!["run".to_owned()]));
        expect_that!(config.date_format.as_str(), eq("%d/%m/%Y"));
    }

    #[googletest::test]
    fn invalid_cell_reference_is_rejected() {
        let result = Config::from_yaml_str("fields:\n  truck: 3I\n");
        assert_that!(result, err(anything()));
    }

    #[googletest::test]
    fn unknown_keys_are_rejected() {
        let result = Config::from_yaml_str("truck_lenght: 4\n");
        assert_that!(result, err(anything()));
    }

    #[googletest::test]
    fn invalid_date_format_is_rejected() {
        let error = Config::from_yaml_str("date_format: \"%d/%m/%\"\n").unwrap_err();
        assert!(matches!(error, LoadSheetError::ConfigError(ConfigError::InvalidDateFormat(_))));
    }

    #[googletest::test]
    fn required_roles_need_aliases() {
        let error = Config::from_yaml_str("aliases:\n  driver1: []\n").unwrap_err();
        assert!(matches!(
            error,
            LoadSheetError::ConfigError(ConfigError::NoAliases(ColumnRole::Driver1))
        ));
    }

    #[googletest::test]
    fn loads_from_file() -> googletest::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "date_offset_days: 2")?;
        let config = load_config(file.path())?;
        expect_that!(config.date_offset_days, eq(2));
        Ok(())
    }
}
