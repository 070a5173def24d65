use crate::normalize::ColumnRole;
use thiserror::Error;

/// Main error type for the load sheet pipeline.
/// Aggregates errors from the standard library, dependencies and internal modules,
/// alongside the pipeline outcomes a caller is expected to branch on.
#[derive(Error, Debug)]
pub enum LoadSheetError {
    /// The extracted table had no data rows.
    #[error("No table detected")]
    EmptyExtraction,

    /// One or more required columns could not be located from the table headers.
    #[error("Missing required columns [{}]; observed headers: {headers:?}", join_roles(.missing))]
    MissingColumns {
        missing: Vec<ColumnRole>,
        headers: Vec<String>,
    },

    /// The template workbook has no sheets or could not be parsed.
    #[error("Invalid template '{source_name}': {reason}")]
    InvalidTemplate { source_name: String, reason: String },

    /// The table extraction collaborator failed.
    #[error("Table extraction failed: {0}")]
    Extraction(#[source] anyhow::Error),

    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    #[error("{0}")]
    StringConversionError(#[from] std::string::FromUtf8Error),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Internal module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    ReferenceError(#[from] crate::spreadsheet::reference::ReferenceError),

    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

/// Discriminant of a [`LoadSheetError`], for callers that branch on the failure
/// class without inspecting messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    EmptyExtraction,
    MissingColumns,
    InvalidTemplate,
    Extraction,
    Config,
    Internal,
}

impl LoadSheetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyExtraction => ErrorKind::EmptyExtraction,
            Self::MissingColumns { .. } => ErrorKind::MissingColumns,
            Self::InvalidTemplate { .. } => ErrorKind::InvalidTemplate,
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::ConfigError(_) | Self::YamlError(_) => ErrorKind::Config,
            _ => ErrorKind::Internal,
        }
    }
}

/// A non-fatal anomaly met while copying template styling into one output sheet.
/// The affected cell is still written, without its styling.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Sheet '{sheet}', {location}: {reason}")]
pub struct RowProcessingWarning {
    /// Name of the output sheet being built
    pub sheet: String,
    /// Cell reference, or the row/column the format belongs to
    pub location: String,
    /// Why the styling was dropped
    pub reason: String,
}

fn join_roles(roles: &[ColumnRole]) -> String {
    roles
        .iter()
        .map(ColumnRole::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, LoadSheetError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| LoadSheetError::WithContextError(format!("{}: {}", message, e)))
    }
}
