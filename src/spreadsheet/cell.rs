use crate::spreadsheet::style::CellFormat;
use std::fmt::Display;

/// Value held by a worksheet cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    /// Plain text, from a shared or inline string
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Error literal such as `#N/A`
    Error(String),
    /// Formula text without the leading `=`; cached results are not kept
    Formula(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<&str> for CellValue {
    /// Empty text becomes [`CellValue::Empty`], so the cell is written blank.
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_owned())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(text) | Self::Error(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
            Self::Boolean(value) => f.write_str(if *value { "TRUE" } else { "FALSE" }),
            Self::Formula(formula) => write!(f, "={formula}"),
        }
    }
}

/// One worksheet cell: its value and its own copy of the formatting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub format: CellFormat,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Cell {
            value: value.into(),
            format: CellFormat::Default,
        }
    }

    pub fn with_format(mut self, format: CellFormat) -> Self {
        self.format = format;
        self
    }

    /// A cell is worth writing when it has a value or non-default formatting.
    pub fn is_blank(&self) -> bool {
        self.value.is_empty() && self.format.is_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_empty_value() {
        assert_eq!(CellValue::from(""), CellValue::Empty);
        assert_eq!(CellValue::from("AB12".to_owned()), CellValue::Text("AB12".to_owned()));
    }

    #[test]
    fn display_values() {
        assert_eq!(CellValue::Number(12.5).to_string(), "12.5");
        assert_eq!(CellValue::Number(3.0).to_string(), "3");
        assert_eq!(CellValue::Boolean(true).to_string(), "TRUE");
        assert_eq!(CellValue::Formula("SUM(A1:A3)".to_owned()).to_string(), "=SUM(A1:A3)");
    }

    #[test]
    fn blank_cells() {
        assert!(Cell::default().is_blank());
        assert!(!Cell::new("x").is_blank());
    }
}
