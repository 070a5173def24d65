use crate::spreadsheet::cell::{Cell, CellValue};
use crate::spreadsheet::reference::{CellRange, CellRef};
use crate::spreadsheet::style::CellFormat;
use std::collections::BTreeMap;

/// Explicit `<col>` entry: width and formatting for columns `first..=last`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnFormat {
    /// First column (0-based)
    pub first: usize,
    /// Last column (0-based, inclusive)
    pub last: usize,
    pub width: Option<f64>,
    pub custom_width: bool,
    pub hidden: bool,
    pub format: CellFormat,
}

/// Explicit `<row>` attributes for one row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowFormat {
    pub height: Option<f64>,
    pub custom_height: bool,
    pub hidden: bool,
    pub format: CellFormat,
}

/// Sheet-level elements copied as markup, in the order they are written back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetLayout {
    pub properties: Option<String>,
    pub views: Option<String>,
    pub format: Option<String>,
    pub protection: Option<String>,
    pub protected_ranges: Option<String>,
    pub data_validations: Option<String>,
    pub print_options: Option<String>,
    pub page_margins: Option<String>,
    pub page_setup: Option<String>,
    pub header_footer: Option<String>,
    pub row_breaks: Option<String>,
    pub col_breaks: Option<String>,
    pub ignored_errors: Option<String>,
}

/// In-memory worksheet: values, per-cell formatting and geometry.
///
/// Every part is an owned value, so `clone()` yields a fully independent sheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Worksheet {
    pub name: String,
    pub cells: BTreeMap<CellRef, Cell>,
    pub merged_ranges: Vec<CellRange>,
    pub columns: Vec<ColumnFormat>,
    /// Row formats keyed by zero-based row index
    pub rows: BTreeMap<usize, RowFormat>,
    pub layout: SheetLayout,
}

impl Worksheet {
    pub fn new(name: &str) -> Self {
        Worksheet {
            name: name.to_owned(),
            ..Worksheet::default()
        }
    }

    pub fn cell(&self, at: CellRef) -> Option<&Cell> {
        self.cells.get(&at)
    }

    pub fn cell_mut(&mut self, at: CellRef) -> &mut Cell {
        self.cells.entry(at).or_default()
    }

    /// Replaces the value at `at`, keeping whatever formatting the cell already has.
    pub fn set_value(&mut self, at: CellRef, value: impl Into<CellValue>) {
        self.cell_mut(at).value = value.into();
    }

    /// Range covering every non-blank cell.
    pub fn used_range(&self) -> Option<CellRange> {
        self.cells
            .iter()
            .filter(|(_, cell)| !cell.is_blank())
            .map(|(at, _)| *at)
            .fold(None, |range: Option<CellRange>, at| {
                Some(match range {
                    Some(range) => range.extend(at),
                    None => CellRange::new(at, at),
                })
            })
    }

    /// Width of column `col`, if an explicit entry covers it.
    pub fn column_width(&self, col: usize) -> Option<f64> {
        self.columns
            .iter()
            .find(|column| (column.first..=column.last).contains(&col))
            .and_then(|column| column.width)
    }

    pub fn row_height(&self, row: usize) -> Option<f64> {
        self.rows.get(&row).and_then(|format| format.height)
    }

    /// Every formatting slot on the sheet with a printable location, for
    /// callers that need to inspect or rewrite formats in bulk.
    pub fn formats_mut(&mut self) -> impl Iterator<Item = (String, &mut CellFormat)> {
        let cells = self
            .cells
            .iter_mut()
            .map(|(at, cell)| (format!("cell {at}"), &mut cell.format));
        let rows = self
            .rows
            .iter_mut()
            .map(|(row, format)| (format!("row {}", row + 1), &mut format.format));
        let columns = self.columns.iter_mut().map(|column| {
            let location = format!(
                "columns {}-{}",
                crate::spreadsheet::reference::index_to_col(column.first),
                crate::spreadsheet::reference::index_to_col(column.last)
            );
            (location, &mut column.format)
        });
        cells.chain(rows).chain(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::style::CellStyle;

    #[test]
    fn set_value_keeps_format() {
        let mut sheet = Worksheet::new("Template");
        let at = CellRef::new(2, 1);
        *sheet.cell_mut(at) = Cell::default().with_format(CellFormat::Styled(CellStyle::default()));
        sheet.set_value(at, "1234");

        let cell = sheet.cell(at).unwrap();
        assert_eq!(cell.value, CellValue::Text("1234".to_owned()));
        assert!(cell.format.style().is_some());
    }

    #[test]
    fn used_range_skips_blank_cells() {
        let mut sheet = Worksheet::new("Template");
        assert_eq!(sheet.used_range(), None);

        sheet.set_value(CellRef::new(1, 1), "a");
        sheet.set_value(CellRef::new(4, 3), "b");
        sheet.cell_mut(CellRef::new(9, 9));
        assert_eq!(sheet.used_range().unwrap().to_string(), "B2:D5");
    }

    #[test]
    fn dimension_lookups() {
        let mut sheet = Worksheet::new("Template");
        sheet.columns.push(ColumnFormat {
            first: 1,
            last: 3,
            width: Some(14.5),
            custom_width: true,
            ..ColumnFormat::default()
        });
        sheet.rows.insert(2, RowFormat { height: Some(30.0), custom_height: true, ..RowFormat::default() });

        assert_eq!(sheet.column_width(2), Some(14.5));
        assert_eq!(sheet.column_width(4), None);
        assert_eq!(sheet.row_height(2), Some(30.0));
        assert_eq!(sheet.row_height(3), None);
    }

    #[test]
    fn clones_are_independent() {
        let mut template = Worksheet::new("Template");
        template.set_value(CellRef::new(0, 0), "title");
        let mut copy = template.clone();
        copy.set_value(CellRef::new(0, 0), "changed");
        assert_eq!(template.cell(CellRef::new(0, 0)).unwrap().value, CellValue::Text("title".to_owned()));
    }
}
