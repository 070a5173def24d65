//! A1-style cell references and their zero-based `(row, col)` counterparts.

use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Largest zero-based row index in an xlsx worksheet
pub const MAX_ROW: usize = 1_048_575;
/// Largest zero-based column index in an xlsx worksheet
pub const MAX_COL: usize = 16_383;

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Invalid cell reference '{0}'")]
    CellFormatError(String),

    #[error("Invalid range reference '{0}'")]
    RangeFormatError(String),
}

/// Converts column letters to a zero-based index ("A" → 0, "AA" → 26).
pub fn col_to_index(col: &str) -> Option<usize> {
    if col.is_empty() || col.len() > 3 {
        return None;
    }
    let mut index = 0usize;
    for character in col.chars() {
        if !character.is_ascii_alphabetic() {
            return None;
        }
        index = index * 26 + (character.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(index - 1).filter(|index| *index <= MAX_COL)
}

/// Converts a one-based row number to a zero-based index ("1" → 0).
pub fn row_to_index(row: &str) -> Option<usize> {
    if row.is_empty() || !row.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    row.parse::<usize>()
        .ok()
        .filter(|row| (1..=MAX_ROW + 1).contains(row))
        .map(|row| row - 1)
}

/// Converts a zero-based column index to its letters (0 → "A").
pub fn index_to_col(col: usize) -> String {
    let mut column = col + 1;
    let mut letters = Vec::new();
    while column > 0 {
        column -= 1;
        letters.push(b'A' + (column % 26) as u8);
        column /= 26;
    }
    letters.iter().rev().map(|byte| *byte as char).collect()
}

/// Parses an A1 reference (absolute markers allowed) into `(row, col)`.
pub fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|character: char| character.is_ascii_digit())?;
    let (col, row) = reference.split_at(split);
    Some((row_to_index(row)?, col_to_index(col)?))
}

/// Formats zero-based `(row, col)` as an A1 reference.
pub fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_col(col), row + 1)
}

/// Zero-based cell coordinate. Ordering is row-major.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub const fn new(row: usize, col: usize) -> Self {
        CellRef { row, col }
    }
}

impl FromStr for CellRef {
    type Err = ReferenceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        reference_to_index(value.trim())
            .map(|(row, col)| CellRef { row, col })
            .ok_or_else(|| ReferenceError::CellFormatError(value.to_owned()))
    }
}

impl TryFrom<String> for CellRef {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&index_to_reference(self.row, self.col))
    }
}

/// Rectangular block of cells, inclusive on both corners.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub first: CellRef,
    pub last: CellRef,
}

impl CellRange {
    /// Builds the range spanning both corners, whatever their order.
    pub fn new(a: CellRef, b: CellRef) -> Self {
        CellRange {
            first: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            last: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.first.row..=self.last.row).contains(&cell.row)
            && (self.first.col..=self.last.col).contains(&cell.col)
    }

    /// Smallest range covering both `self` and `cell`.
    pub fn extend(self, cell: CellRef) -> Self {
        CellRange {
            first: CellRef::new(self.first.row.min(cell.row), self.first.col.min(cell.col)),
            last: CellRef::new(self.last.row.max(cell.row), self.last.col.max(cell.col)),
        }
    }
}

impl FromStr for CellRange {
    type Err = ReferenceError;

    /// Parses `"A1:C3"`, or a single cell `"B2"` as a one-cell range.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let error = || ReferenceError::RangeFormatError(value.to_owned());
        let (first, last) = value.split_once(':').unwrap_or((value, value));
        let first = first.parse::<CellRef>().map_err(|_| error())?;
        let last = last.parse::<CellRef>().map_err(|_| error())?;
        Ok(CellRange::new(first, last))
    }
}

impl Display for CellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}:{}", self.first, self.last)
        }
    }
}
