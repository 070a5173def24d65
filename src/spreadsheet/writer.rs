//! xlsx package writer.
//!
//! Sheets hold owned style values; the writer interns them into a fresh
//! `styles.xml`, collects text into a shared string table and emits every
//! worksheet element in schema order.

use crate::error::LoadSheetError;
use crate::helpers::xml::element;
use crate::helpers::xml::XmlWriter;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::reference::CellRef;
use crate::spreadsheet::sheet::RowFormat;
use crate::spreadsheet::sheet::Worksheet;
use crate::spreadsheet::style::Alignment;
use crate::spreadsheet::style::CellFormat;
use crate::spreadsheet::style::CellStyle;
use crate::spreadsheet::style::NumberFormat;
use crate::spreadsheet::style::Protection;
use crate::spreadsheet::style::DEFAULT_BORDER;
use crate::spreadsheet::style::DEFAULT_FILL;
use crate::spreadsheet::style::DEFAULT_FONT;
use crate::spreadsheet::style::GRAY_FILL;
use crate::spreadsheet::SpreadsheetError;
use log::debug;
use regex::Regex;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

/// Longest sheet name Excel accepts
pub const MAX_SHEET_NAME_LENGTH: usize = 31;
/// Characters Excel rejects in sheet names
pub const INVALID_SHEET_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PACKAGE_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_MARKUP_COMPATIBILITY: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
const NS_X14AC: &str = "http://schemas.microsoft.com/office/spreadsheetml/2009/9/ac";

const RELATIONSHIP_OFFICE_DOCUMENT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const RELATIONSHIP_WORKSHEET: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const RELATIONSHIP_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const RELATIONSHIP_SHARED_STRINGS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
const RELATIONSHIP_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

const CONTENT_TYPE_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CONTENT_TYPE_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CONTENT_TYPE_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CONTENT_TYPE_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const CONTENT_TYPE_SHARED_STRINGS: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
const CONTENT_TYPE_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

static TAB_SELECTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s+tabSelected\s*=\s*("[^"]*"|'[^']*')"#).expect("Hardcode regex pattern"));
static SHEET_VIEW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<sheetView([\s/>])").expect("Hardcode regex pattern"));

/// Workbook under construction: ordered sheets with unique names.
#[derive(Clone, Debug, Default)]
pub struct OutputWorkbook {
    sheets: Vec<Worksheet>,
    default_style: CellStyle,
    theme: Option<Vec<u8>>,
    colors: Option<String>,
}

impl OutputWorkbook {
    /// Creates an empty workbook whose unstyled cells render with `default_style`.
    pub fn new(default_style: CellStyle, theme: Option<Vec<u8>>) -> Self {
        OutputWorkbook {
            sheets: Vec::new(),
            default_style,
            theme,
            colors: None,
        }
    }

    /// Sets the `<colors>` markup written into `styles.xml`.
    pub fn with_colors(mut self, colors: Option<String>) -> Self {
        self.colors = colors;
        self
    }

    /// Appends a sheet. Its name must be a valid, not yet used sheet name.
    pub fn push_sheet(&mut self, sheet: Worksheet) -> Result<(), LoadSheetError> {
        let name = &sheet.name;
        if name.is_empty()
            || name.chars().count() > MAX_SHEET_NAME_LENGTH
            || name.contains(INVALID_SHEET_NAME_CHARS)
            || name.starts_with('\'')
            || name.ends_with('\'')
        {
            Err(SpreadsheetError::InvalidSheetName(name.to_owned()))?
        }
        if self.contains_sheet(name) {
            Err(SpreadsheetError::DuplicateSheetName(name.to_owned()))?
        }
        self.sheets.push(sheet);
        Ok(())
    }

    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    /// Mutable access to a sheet. Renaming through this handle is not checked.
    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.sheets.iter_mut().find(|sheet| sheet.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    /// Sheet names compare case-insensitively, as in Excel.
    pub fn contains_sheet(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.sheets.iter().any(|sheet| sheet.name.to_lowercase() == name)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn default_style(&self) -> &CellStyle {
        &self.default_style
    }

    /// Serializes the workbook as an xlsx package.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LoadSheetError> {
        if self.sheets.is_empty() {
            Err(SpreadsheetError::EmptyWorkbook)?
        }

        let mut styles = StyleTable::new(&self.default_style);
        let mut shared_strings = SharedStrings::default();
        let mut worksheets = Vec::with_capacity(self.sheets.len());
        for (index, sheet) in self.sheets.iter().enumerate() {
            worksheets.push(write_worksheet(sheet, index == 0, &mut styles, &mut shared_strings)?);
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        add_part(&mut zip, "[Content_Types].xml", &self.write_content_types()?)?;
        add_part(&mut zip, "_rels/.rels", &write_package_relationships()?)?;
        add_part(&mut zip, "xl/workbook.xml", &self.write_workbook()?)?;
        add_part(&mut zip, "xl/_rels/workbook.xml.rels", &self.write_workbook_relationships()?)?;
        for (index, worksheet) in worksheets.iter().enumerate() {
            add_part(&mut zip, &format!("xl/worksheets/sheet{}.xml", index + 1), worksheet)?;
        }
        add_part(&mut zip, "xl/styles.xml", &styles.write(self.colors.as_deref())?)?;
        add_part(&mut zip, "xl/sharedStrings.xml", &shared_strings.write()?)?;
        if let Some(theme) = &self.theme {
            add_part(&mut zip, "xl/theme/theme1.xml", theme)?;
        }

        let bytes = zip.finish()?.into_inner();
        debug!(
            "Serialized {} sheets: {} cell styles, {} shared strings, {} bytes",
            self.sheets.len(),
            styles.cell_formats.len(),
            shared_strings.strings.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Writes the workbook to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), LoadSheetError> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    fn write_content_types(&self) -> Result<Vec<u8>, LoadSheetError> {
        let mut xml = XmlWriter::new()?;
        xml.start(element("Types", &[("xmlns", NS_CONTENT_TYPES)]))?;
        xml.empty(element("Default", &[("Extension", "rels"), ("ContentType", CONTENT_TYPE_RELATIONSHIPS)]))?;
        xml.empty(element("Default", &[("Extension", "xml"), ("ContentType", "application/xml")]))?;
        xml.empty(element("Override", &[("PartName", "/xl/workbook.xml"), ("ContentType", CONTENT_TYPE_WORKBOOK)]))?;
        for index in 1..=self.sheets.len() {
            let part = format!("/xl/worksheets/sheet{index}.xml");
            xml.empty(element("Override", &[("PartName", part.as_str()), ("ContentType", CONTENT_TYPE_WORKSHEET)]))?;
        }
        if self.theme.is_some() {
            xml.empty(element("Override", &[("PartName", "/xl/theme/theme1.xml"), ("ContentType", CONTENT_TYPE_THEME)]))?;
        }
        xml.empty(element("Override", &[("PartName", "/xl/styles.xml"), ("ContentType", CONTENT_TYPE_STYLES)]))?;
        xml.empty(element(
            "Override",
            &[("PartName", "/xl/sharedStrings.xml"), ("ContentType", CONTENT_TYPE_SHARED_STRINGS)],
        ))?;
        xml.end("Types")?;
        Ok(xml.into_bytes())
    }

    fn write_workbook(&self) -> Result<Vec<u8>, LoadSheetError> {
        let mut xml = XmlWriter::new()?;
        xml.start(element("workbook", &[("xmlns", NS_MAIN), ("xmlns:r", NS_RELATIONSHIPS)]))?;
        xml.start(element("bookViews", &[]))?;
        xml.empty(element("workbookView", &[("activeTab", "0")]))?;
        xml.end("bookViews")?;
        xml.start(element("sheets", &[]))?;
        for (index, sheet) in self.sheets.iter().enumerate() {
            let id = (index + 1).to_string();
            let relationship = format!("rId{id}");
            xml.empty(element("sheet", &[("name", sheet.name.as_str()), ("sheetId", id.as_str()), ("r:id", relationship.as_str())]))?;
        }
        xml.end("sheets")?;
        // Formula cells carry no cached results.
        xml.empty(element("calcPr", &[("calcId", "191029"), ("fullCalcOnLoad", "1")]))?;
        xml.end("workbook")?;
        Ok(xml.into_bytes())
    }

    fn write_workbook_relationships(&self) -> Result<Vec<u8>, LoadSheetError> {
        let mut xml = XmlWriter::new()?;
        xml.start(element("Relationships", &[("xmlns", NS_PACKAGE_RELATIONSHIPS)]))?;
        let count = self.sheets.len();
        for index in 1..=count {
            let id = format!("rId{index}");
            let target = format!("worksheets/sheet{index}.xml");
            xml.empty(element("Relationship", &[("Id", id.as_str()), ("Type", RELATIONSHIP_WORKSHEET), ("Target", target.as_str())]))?;
        }
        let styles_id = format!("rId{}", count + 1);
        xml.empty(element("Relationship", &[("Id", styles_id.as_str()), ("Type", RELATIONSHIP_STYLES), ("Target", "styles.xml")]))?;
        let strings_id = format!("rId{}", count + 2);
        xml.empty(element(
            "Relationship",
            &[("Id", strings_id.as_str()), ("Type", RELATIONSHIP_SHARED_STRINGS), ("Target", "sharedStrings.xml")],
        ))?;
        if self.theme.is_some() {
            let theme_id = format!("rId{}", count + 3);
            xml.empty(element("Relationship", &[("Id", theme_id.as_str()), ("Type", RELATIONSHIP_THEME), ("Target", "theme/theme1.xml")]))?;
        }
        xml.end("Relationships")?;
        Ok(xml.into_bytes())
    }
}

fn add_part(zip: &mut ZipWriter<Cursor<Vec<u8>>>, path: &str, bytes: &[u8]) -> Result<(), LoadSheetError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(path, options)?;
    zip.write_all(bytes)?;
    Ok(())
}

fn write_package_relationships() -> Result<Vec<u8>, LoadSheetError> {
    let mut xml = XmlWriter::new()?;
    xml.start(element("Relationships", &[("xmlns", NS_PACKAGE_RELATIONSHIPS)]))?;
    xml.empty(element(
        "Relationship",
        &[("Id", "rId1"), ("Type", RELATIONSHIP_OFFICE_DOCUMENT), ("Target", "xl/workbook.xml")],
    ))?;
    xml.end("Relationships")?;
    Ok(xml.into_bytes())
}

/// Serializes one worksheet part, interning styles and strings on the way.
fn write_worksheet(
    sheet: &Worksheet,
    selected: bool,
    styles: &mut StyleTable,
    shared_strings: &mut SharedStrings,
) -> Result<Vec<u8>, LoadSheetError> {
    let layout = &sheet.layout;
    let mut xml = XmlWriter::new()?;
    xml.start(element(
        "worksheet",
        &[
            ("xmlns", NS_MAIN),
            ("xmlns:r", NS_RELATIONSHIPS),
            ("xmlns:mc", NS_MARKUP_COMPATIBILITY),
            ("mc:Ignorable", "x14ac"),
            ("xmlns:x14ac", NS_X14AC),
        ],
    ))?;

    if let Some(properties) = &layout.properties {
        xml.raw(properties)?;
    }
    let dimension = sheet.used_range().map(|range| range.to_string()).unwrap_or_else(|| "A1".to_owned());
    xml.empty(element("dimension", &[("ref", dimension.as_str())]))?;
    xml.raw(&sheet_views(layout.views.as_deref(), selected))?;
    if let Some(format) = &layout.format {
        xml.raw(format)?;
    }

    if !sheet.columns.is_empty() {
        xml.start(element("cols", &[]))?;
        for column in &sheet.columns {
            let first = (column.first + 1).to_string();
            let last = (column.last + 1).to_string();
            let width = column.width.map(|width| width.to_string());
            let style = styles.index_of(&column.format).to_string();
            let mut attributes = vec![("min", first.as_str()), ("max", last.as_str())];
            if let Some(width) = &width {
                attributes.push(("width", width.as_str()));
            }
            if style != "0" {
                attributes.push(("style", style.as_str()));
            }
            if column.hidden {
                attributes.push(("hidden", "1"));
            }
            if column.custom_width {
                attributes.push(("customWidth", "1"));
            }
            xml.empty(element("col", &attributes))?;
        }
        xml.end("cols")?;
    }

    xml.start(element("sheetData", &[]))?;
    let rows = sheet.rows.keys().copied().chain(sheet.cells.keys().map(|at| at.row)).collect::<BTreeSet<_>>();
    for row in rows {
        write_row_start(&mut xml, row, sheet.rows.get(&row), styles)?;
        let cells = sheet.cells.range(CellRef::new(row, 0)..=CellRef::new(row, usize::MAX));
        for (at, cell) in cells {
            let reference = at.to_string();
            let style = styles.index_of(&cell.format).to_string();
            let mut attributes = vec![("r", reference.as_str())];
            if style != "0" {
                attributes.push(("s", style.as_str()));
            }
            match &cell.value {
                CellValue::Empty => xml.empty(element("c", &attributes))?,
                CellValue::Text(text) => {
                    let index = shared_strings.intern(text).to_string();
                    attributes.push(("t", "s"));
                    xml.start(element("c", &attributes))?;
                    xml.text_element(element("v", &[]), &index)?;
                    xml.end("c")?;
                }
                CellValue::Number(number) => {
                    xml.start(element("c", &attributes))?;
                    xml.text_element(element("v", &[]), &number.to_string())?;
                    xml.end("c")?;
                }
                CellValue::Boolean(value) => {
                    attributes.push(("t", "b"));
                    xml.start(element("c", &attributes))?;
                    xml.text_element(element("v", &[]), if *value { "1" } else { "0" })?;
                    xml.end("c")?;
                }
                CellValue::Error(error) => {
                    attributes.push(("t", "e"));
                    xml.start(element("c", &attributes))?;
                    xml.text_element(element("v", &[]), error)?;
                    xml.end("c")?;
                }
                CellValue::Formula(formula) => {
                    xml.start(element("c", &attributes))?;
                    xml.text_element(element("f", &[]), formula)?;
                    xml.end("c")?;
                }
            }
        }
        xml.end("row")?;
    }
    xml.end("sheetData")?;

    for fragment in [&layout.protection, &layout.protected_ranges].into_iter().flatten() {
        xml.raw(fragment)?;
    }
    if !sheet.merged_ranges.is_empty() {
        let count = sheet.merged_ranges.len().to_string();
        xml.start(element("mergeCells", &[("count", count.as_str())]))?;
        for range in &sheet.merged_ranges {
            let reference = range.to_string();
            xml.empty(element("mergeCell", &[("ref", reference.as_str())]))?;
        }
        xml.end("mergeCells")?;
    }
    for fragment in [
        &layout.data_validations,
        &layout.print_options,
        &layout.page_margins,
        &layout.page_setup,
        &layout.header_footer,
        &layout.row_breaks,
        &layout.col_breaks,
        &layout.ignored_errors,
    ]
    .into_iter()
    .flatten()
    {
        xml.raw(fragment)?;
    }

    xml.end("worksheet")?;
    Ok(xml.into_bytes())
}

fn write_row_start(
    xml: &mut XmlWriter,
    row: usize,
    format: Option<&RowFormat>,
    styles: &mut StyleTable,
) -> Result<(), LoadSheetError> {
    let number = (row + 1).to_string();
    let mut attributes = vec![("r", number.as_str())];
    let style = format.map(|format| styles.index_of(&format.format)).unwrap_or(0).to_string();
    let height = format.and_then(|format| format.height).map(|height| height.to_string());
    if style != "0" {
        attributes.push(("s", style.as_str()));
        attributes.push(("customFormat", "1"));
    }
    if let Some(height) = &height {
        attributes.push(("ht", height.as_str()));
    }
    if let Some(format) = format {
        if format.hidden {
            attributes.push(("hidden", "1"));
        }
        if format.custom_height {
            attributes.push(("customHeight", "1"));
        }
    }
    xml.start(element("row", &attributes))
}

/// Sheet views with the tab selection set for the active sheet only.
fn sheet_views(views: Option<&str>, selected: bool) -> String {
    let views = match views {
        Some(views) => TAB_SELECTED.replace_all(views, "").into_owned(),
        None => r#"<sheetViews><sheetView workbookViewId="0"/></sheetViews>"#.to_owned(),
    };
    if selected {
        SHEET_VIEW.replace(&views, r#"<sheetView tabSelected="1"$1"#).into_owned()
    } else {
        views
    }
}

/// `cellXfs` entry being generated
#[derive(Clone, Debug, PartialEq)]
struct CellFormatEntry {
    number_format_id: u32,
    font_id: usize,
    fill_id: usize,
    border_id: usize,
    alignment: Option<Alignment>,
    protection: Option<Protection>,
}

/// Interns owned styles into the tables of a new `styles.xml`.
struct StyleTable {
    default_style: CellStyle,
    number_formats: Vec<(u32, String)>,
    fonts: Vec<String>,
    fills: Vec<String>,
    borders: Vec<String>,
    cell_formats: Vec<CellFormatEntry>,
    interned: HashMap<CellStyle, usize>,
}

impl StyleTable {
    fn new(default_style: &CellStyle) -> Self {
        let mut table = StyleTable {
            default_style: default_style.clone(),
            number_formats: Vec::new(),
            fonts: Vec::new(),
            // Fills 0 and 1 are reserved by Excel.
            fills: vec![DEFAULT_FILL.to_owned(), GRAY_FILL.to_owned()],
            borders: Vec::new(),
            cell_formats: Vec::new(),
            interned: HashMap::new(),
        };
        table.intern(default_style);
        table
    }

    fn index_of(&mut self, format: &CellFormat) -> usize {
        match format {
            CellFormat::Styled(style) => self.intern(style),
            CellFormat::Default | CellFormat::Unreadable { .. } => 0,
        }
    }

    fn intern(&mut self, style: &CellStyle) -> usize {
        if let Some(index) = self.interned.get(style) {
            return *index;
        }
        // Missing components fall back to the workbook default.
        let defaults = &self.default_style;
        let font = style.font.as_ref().or(defaults.font.as_ref())
            .map_or(DEFAULT_FONT, |font| font.xml.as_str())
            .to_owned();
        let fill = style.fill.as_ref().or(defaults.fill.as_ref())
            .map_or(DEFAULT_FILL, |fill| fill.xml.as_str())
            .to_owned();
        let border = style.border.as_ref().or(defaults.border.as_ref())
            .map_or(DEFAULT_BORDER, |border| border.xml.as_str())
            .to_owned();
        let number_format = style.number_format.as_ref().or(defaults.number_format.as_ref())
            .cloned()
            .unwrap_or(NumberFormat::builtin(0));

        let entry = CellFormatEntry {
            number_format_id: self.number_format_id(number_format),
            font_id: position_or_push(&mut self.fonts, font),
            fill_id: position_or_push(&mut self.fills, fill),
            border_id: position_or_push(&mut self.borders, border),
            alignment: style.alignment.clone(),
            protection: style.protection.clone(),
        };
        let index = match self.cell_formats.iter().position(|existing| *existing == entry) {
            Some(index) => index,
            None => {
                self.cell_formats.push(entry);
                self.cell_formats.len() - 1
            }
        };
        self.interned.insert(style.clone(), index);
        index
    }

    /// Custom codes are renumbered from 164 in order of first use.
    fn number_format_id(&mut self, number_format: NumberFormat) -> u32 {
        let code = match number_format.code {
            Some(code) => code,
            None => return number_format.id,
        };
        if let Some((id, _)) = self.number_formats.iter().find(|(_, existing)| *existing == code) {
            return *id;
        }
        let id = NumberFormat::FIRST_CUSTOM_ID + self.number_formats.len() as u32;
        self.number_formats.push((id, code));
        id
    }

    fn write(&self, colors: Option<&str>) -> Result<Vec<u8>, LoadSheetError> {
        let mut xml = XmlWriter::new()?;
        xml.start(element(
            "styleSheet",
            &[
                ("xmlns", NS_MAIN),
                ("xmlns:mc", NS_MARKUP_COMPATIBILITY),
                ("mc:Ignorable", "x14ac"),
                ("xmlns:x14ac", NS_X14AC),
            ],
        ))?;
        if !self.number_formats.is_empty() {
            let count = self.number_formats.len().to_string();
            xml.start(element("numFmts", &[("count", count.as_str())]))?;
            for (id, code) in &self.number_formats {
                let id = id.to_string();
                xml.empty(element("numFmt", &[("numFmtId", id.as_str()), ("formatCode", code.as_str())]))?;
            }
            xml.end("numFmts")?;
        }
        for (collection, fragments) in [("fonts", &self.fonts), ("fills", &self.fills), ("borders", &self.borders)] {
            let count = fragments.len().to_string();
            xml.start(element(collection, &[("count", count.as_str())]))?;
            for fragment in fragments {
                xml.raw(fragment)?;
            }
            xml.end(collection)?;
        }

        xml.start(element("cellStyleXfs", &[("count", "1")]))?;
        xml.empty(element("xf", &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")]))?;
        xml.end("cellStyleXfs")?;

        let count = self.cell_formats.len().to_string();
        xml.start(element("cellXfs", &[("count", count.as_str())]))?;
        for (index, entry) in self.cell_formats.iter().enumerate() {
            write_cell_format(&mut xml, entry, index == 0)?;
        }
        xml.end("cellXfs")?;

        xml.start(element("cellStyles", &[("count", "1")]))?;
        xml.empty(element("cellStyle", &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")]))?;
        xml.end("cellStyles")?;
        if let Some(colors) = colors {
            xml.raw(colors)?;
        }
        xml.end("styleSheet")?;
        Ok(xml.into_bytes())
    }
}

fn write_cell_format(xml: &mut XmlWriter, entry: &CellFormatEntry, is_default: bool) -> Result<(), LoadSheetError> {
    let number_format = entry.number_format_id.to_string();
    let font = entry.font_id.to_string();
    let fill = entry.fill_id.to_string();
    let border = entry.border_id.to_string();
    let mut attributes = vec![
        ("numFmtId", number_format.as_str()),
        ("fontId", font.as_str()),
        ("fillId", fill.as_str()),
        ("borderId", border.as_str()),
        ("xfId", "0"),
    ];
    if !is_default {
        if entry.number_format_id != 0 {
            attributes.push(("applyNumberFormat", "1"));
        }
        attributes.extend([("applyFont", "1"), ("applyFill", "1"), ("applyBorder", "1")]);
    }
    if entry.alignment.is_some() {
        attributes.push(("applyAlignment", "1"));
    }
    if entry.protection.is_some() {
        attributes.push(("applyProtection", "1"));
    }

    if entry.alignment.is_none() && entry.protection.is_none() {
        return xml.empty(element("xf", &attributes));
    }
    xml.start(element("xf", &attributes))?;
    if let Some(alignment) = &entry.alignment {
        let indent = alignment.indent.map(|value| value.to_string());
        let rotation = alignment.text_rotation.map(|value| value.to_string());
        let order = alignment.reading_order.map(|value| value.to_string());
        let mut attributes = Vec::new();
        if let Some(horizontal) = &alignment.horizontal {
            attributes.push(("horizontal", horizontal.as_str()));
        }
        if let Some(vertical) = &alignment.vertical {
            attributes.push(("vertical", vertical.as_str()));
        }
        if let Some(rotation) = &rotation {
            attributes.push(("textRotation", rotation.as_str()));
        }
        if let Some(wrap) = alignment.wrap_text {
            attributes.push(("wrapText", if wrap { "1" } else { "0" }));
        }
        if let Some(indent) = &indent {
            attributes.push(("indent", indent.as_str()));
        }
        if let Some(shrink) = alignment.shrink_to_fit {
            attributes.push(("shrinkToFit", if shrink { "1" } else { "0" }));
        }
        if let Some(order) = &order {
            attributes.push(("readingOrder", order.as_str()));
        }
        xml.empty(element("alignment", &attributes))?;
    }
    if let Some(protection) = &entry.protection {
        let mut attributes = Vec::new();
        if let Some(locked) = protection.locked {
            attributes.push(("locked", if locked { "1" } else { "0" }));
        }
        if let Some(hidden) = protection.hidden {
            attributes.push(("hidden", if hidden { "1" } else { "0" }));
        }
        xml.empty(element("protection", &attributes))?;
    }
    xml.end("xf")
}

fn position_or_push(items: &mut Vec<String>, item: String) -> usize {
    match items.iter().position(|existing| *existing == item) {
        Some(index) => index,
        None => {
            items.push(item);
            items.len() - 1
        }
    }
}

/// Shared string table of the package being written
#[derive(Default)]
struct SharedStrings {
    strings: Vec<String>,
    index: HashMap<String, usize>,
    references: usize,
}

impl SharedStrings {
    fn intern(&mut self, text: &str) -> usize {
        self.references += 1;
        if let Some(index) = self.index.get(text) {
            return *index;
        }
        let index = self.strings.len();
        self.strings.push(text.to_owned());
        self.index.insert(text.to_owned(), index);
        index
    }

    fn write(&self) -> Result<Vec<u8>, LoadSheetError> {
        let count = self.references.to_string();
        let unique = self.strings.len().to_string();
        let mut xml = XmlWriter::new()?;
        xml.start(element("sst", &[("xmlns", NS_MAIN), ("count", count.as_str()), ("uniqueCount", unique.as_str())]))?;
        for text in &self.strings {
            xml.start(element("si", &[]))?;
            let preserve = text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) || text.contains('\n');
            if preserve {
                xml.text_element(element("t", &[("xml:space", "preserve")]), text)?;
            } else {
                xml.text_element(element("t", &[]), text)?;
            }
            xml.end("si")?;
        }
        xml.end("sst")?;
        Ok(xml.into_bytes())
    }
}
