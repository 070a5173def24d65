//! The raw table handed over by the OCR collaborator.

use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Headers and body rows as recognised from a schedule image, before any
/// cleaning. Cells are positionally aligned with `headers`; a cell the
/// recogniser could not read is `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl RawTable {
    pub fn new<H, S, R>(headers: H, rows: R) -> Self
    where
        H: IntoIterator<Item = S>,
        S: Into<String>,
        R: IntoIterator,
        R::Item: Into<Row>,
    {
        RawTable {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: rows.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses the JSON export of a recognised table.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub Vec<Option<String>>);

impl Row {
    /// Returns the cell text at `column`, or `None` when the cell is null or the
    /// row is shorter than the header list.
    pub fn cell(&self, column: usize) -> Option<&str> {
        self.0.get(column).and_then(|cell| cell.as_deref())
    }
}

impl Deref for Row {
    type Target = Vec<Option<String>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<C, S> From<C> for Row
where
    C: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from(value: C) -> Self {
        Row(value.into_iter().map(|cell| Some(cell.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;

    #[googletest::test]
    fn parses_json_with_null_cells() {
        let table = RawTable::from_json(
            br#"{"headers": ["Run", "Driver 1"], "rows": [["1234", null], ["5678"]]}"#,
        )
        .unwrap();

        expect_that!(table.headers, eq(&vec!["Run".to_owned(), "Driver 1".to_owned()]));
        assert_eq!(table.rows[0].cell(0), Some("1234"));
        assert_eq!(table.rows[0].cell(1), None);
        assert_eq!(table.rows[1].cell(1), None);
    }

    #[googletest::test]
    fn missing_rows_key_is_an_empty_table() {
        let table = RawTable::from_json(br#"{"headers": ["Run"]}"#).unwrap();
        expect_that!(table.is_empty(), eq(true));
    }

    #[googletest::test]
    fn builds_from_string_slices() {
        let table = RawTable::new(["Run", "Truck"], [["1234", "AB12"]]);
        assert_eq!(table.rows[0].cell(1), Some("AB12"));
        expect_that!(table.rows[0].len(), eq(2));
    }
}
