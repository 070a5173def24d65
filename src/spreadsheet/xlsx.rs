use crate::error::LoadSheetError;
use crate::error::ResultMessage;
use crate::helpers::xml::is_portable_name;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::reference::CellRange;
use crate::spreadsheet::reference::CellRef;
use crate::spreadsheet::sheet::ColumnFormat;
use crate::spreadsheet::sheet::RowFormat;
use crate::spreadsheet::sheet::SheetLayout;
use crate::spreadsheet::sheet::Worksheet;
use crate::spreadsheet::style::Alignment;
use crate::spreadsheet::style::Border;
use crate::spreadsheet::style::CellFormat;
use crate::spreadsheet::style::CellStyle;
use crate::spreadsheet::style::Fill;
use crate::spreadsheet::style::Font;
use crate::spreadsheet::style::Protection;
use crate::spreadsheet::style::RawCellFormat;
use crate::spreadsheet::style::StyleSheet;
use crate::spreadsheet::SpreadsheetError;
use log::{debug, warn};
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::fs;
use std::io::BufRead;
use std::io::Cursor;
use std::path::Path;
use zip::ZipArchive;

// Package parts
const WORKBOOK_PATH: &str = "xl/workbook.xml";
const WORKBOOK_RELATIONSHIPS_PATH: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";
const STYLES_PATH: &str = "xl/styles.xml";

/// Signature of an OLE compound file: encrypted xlsx packages and legacy xls files
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

// XML tag names for parsing the workbook and relationships
const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const TAG_SHEET: QName = QName(b"sheet");
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");
const TAG_TEXT: QName = QName(b"t");

// XML tag names for parsing styles.xml
const TAG_NUMBER_FORMATS: QName = QName(b"numFmts");
const TAG_NUMBER_FORMAT: QName = QName(b"numFmt");
const TAG_FONTS: QName = QName(b"fonts");
const TAG_FONT: QName = QName(b"font");
const TAG_FILLS: QName = QName(b"fills");
const TAG_FILL: QName = QName(b"fill");
const TAG_BORDERS: QName = QName(b"borders");
const TAG_BORDER: QName = QName(b"border");
const TAG_CELL_FORMATS: QName = QName(b"cellXfs");
const TAG_CELL_FORMAT: QName = QName(b"xf");
const TAG_ALIGNMENT: QName = QName(b"alignment");
const TAG_PROTECTION: QName = QName(b"protection");
const TAG_COLORS: QName = QName(b"colors");
const STYLE_SECTIONS: [QName; 5] = [TAG_NUMBER_FORMATS, TAG_FONTS, TAG_FILLS, TAG_BORDERS, TAG_CELL_FORMATS];

// XML tag names for parsing worksheets
const TAG_COLUMN: QName = QName(b"col");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_VALUE: QName = QName(b"v");
const TAG_FORMULA: QName = QName(b"f");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_MERGE_CELL: QName = QName(b"mergeCell");
const TAG_EXTENSIONS: QName = QName(b"extLst");

/// Sheet-level elements kept verbatim, see [`SheetLayout`]
const LAYOUT_TAGS: [&[u8]; 13] = [
    b"sheetPr",
    b"sheetViews",
    b"sheetFormatPr",
    b"sheetProtection",
    b"protectedRanges",
    b"dataValidations",
    b"printOptions",
    b"pageMargins",
    b"pageSetup",
    b"headerFooter",
    b"rowBreaks",
    b"colBreaks",
    b"ignoredErrors",
];

/// Sheet elements that depend on other package parts or on state not carried over.
/// Skipped whole, so nothing nested in them (a custom view's `pageSetup`) reaches the layout.
const DROPPED_TAGS: [&[u8]; 20] = [
    b"sheetCalcPr",
    b"scenarios",
    b"autoFilter",
    b"sortState",
    b"dataConsolidate",
    b"customSheetViews",
    b"phoneticPr",
    b"conditionalFormatting",
    b"hyperlinks",
    b"customProperties",
    b"cellWatches",
    b"smartTags",
    b"drawing",
    b"legacyDrawing",
    b"legacyDrawingHF",
    b"picture",
    b"oleObjects",
    b"controls",
    b"tableParts",
    b"webPublishItems",
];

/// Entry of a `.rels` part, with the target resolved to a zip path
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Relationship {
    pub(crate) id: String,
    pub(crate) kind: String,
    pub(crate) target: String,
}

/// An opened xlsx package: sheet directory, style tables and shared strings.
pub struct XlsxPackage {
    zip: ZipArchive<Cursor<Vec<u8>>>,
    /// Worksheets as (name, zip_path) pairs in workbook order
    sheets: Vec<(String, String)>,
    styles: StyleSheet,
    shared_strings: Vec<String>,
    theme: Option<Vec<u8>>,
}

impl XlsxPackage {
    pub fn open(path: &Path) -> Result<XlsxPackage, LoadSheetError> {
        Self::from_bytes(fs::read(path)?)
    }

    /// Parses the package directory, styles and shared strings. Worksheets are
    /// read on demand with [`XlsxPackage::read_sheet`].
    pub fn from_bytes(bytes: Vec<u8>) -> Result<XlsxPackage, LoadSheetError> {
        if bytes.starts_with(&CFB_SIGNATURE) {
            Err(SpreadsheetError::EncryptedPackage)?;
        }

        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let relationships = load_relationships(&mut zip, WORKBOOK_RELATIONSHIPS_PATH)?;
        let sheets = load_workbook(&mut zip, &relationships)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::EmptyWorkbook)?
        }

        let styles = match zip.xml_reader(STYLES_PATH)? {
            Some(mut reader) => load_styles(&mut reader)?,
            None => StyleSheet::default(),
        };
        let shared_strings = match zip.xml_reader(SHARED_STRINGS_PATH)? {
            Some(mut reader) => load_shared_strings(&mut reader)?,
            None => Vec::new(),
        };
        let theme = match relationships.iter().find(|relationship| relationship.kind.ends_with("/theme")) {
            Some(relationship) => zip.read_bytes(&relationship.target)?,
            None => None,
        };

        Ok(XlsxPackage {
            zip,
            sheets,
            styles,
            shared_strings,
            theme,
        })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Style of `cellXfs[0]`, which unstyled cells render with
    pub fn default_style(&self) -> CellStyle {
        self.styles.default_style()
    }

    pub fn theme(&self) -> Option<&[u8]> {
        self.theme.as_deref()
    }

    /// Custom color palette of `styles.xml`, as markup
    pub fn colors(&self) -> Option<&str> {
        self.styles.colors.as_deref()
    }

    /// Reads the worksheet at `index` in workbook order.
    pub fn read_sheet(&mut self, index: usize) -> Result<Worksheet, LoadSheetError> {
        let (name, zip_path) = self.sheets
            .get(index)
            .ok_or(SpreadsheetError::SheetIndexError(index))?;
        let mut reader = self.zip
            .xml_reader(zip_path)?
            .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;
        load_worksheet(&mut reader, name, &self.styles, &self.shared_strings).with_prefix(zip_path)
    }
}

/// The parsed template workbook: its first sheet plus the package-wide
/// formatting generated sheets inherit.
#[derive(Clone, Debug)]
pub struct TemplateWorkbook {
    /// Path or label the template was loaded from
    pub source_name: String,
    /// Every sheet name in the template, in workbook order
    pub sheet_names: Vec<String>,
    /// The first sheet, which serves as the template
    pub sheet: Worksheet,
    pub default_style: CellStyle,
    pub theme: Option<Vec<u8>>,
    /// Custom color palette; indexed colors in the template styles refer to it
    pub colors: Option<String>,
}

impl TemplateWorkbook {
    pub fn open(path: &Path) -> Result<TemplateWorkbook, LoadSheetError> {
        let source_name = path.display().to_string();
        let bytes = fs::read(path).map_err(|error| LoadSheetError::InvalidTemplate {
            source_name: source_name.to_owned(),
            reason: error.to_string(),
        })?;
        Self::from_bytes(&source_name, bytes)
    }

    /// Loads a template from package bytes. Every failure is reported as
    /// [`LoadSheetError::InvalidTemplate`].
    pub fn from_bytes(source_name: &str, bytes: Vec<u8>) -> Result<TemplateWorkbook, LoadSheetError> {
        Self::load(source_name, bytes).map_err(|error| match error {
            error @ LoadSheetError::InvalidTemplate { .. } => error,
            error => LoadSheetError::InvalidTemplate {
                source_name: source_name.to_owned(),
                reason: error.to_string(),
            },
        })
    }

    fn load(source_name: &str, bytes: Vec<u8>) -> Result<TemplateWorkbook, LoadSheetError> {
        let mut package = XlsxPackage::from_bytes(bytes)?;
        let sheet_names = package.sheet_names();
        if sheet_names.len() > 1 {
            warn!(
                "Template '{}' has {} sheets; using '{}' and ignoring {:?}",
                source_name,
                sheet_names.len(),
                sheet_names[0],
                &sheet_names[1..]
            );
        }
        let sheet = package.read_sheet(0)?;
        debug!(
            "Loaded template '{}': {} cells, {} merged ranges",
            source_name,
            sheet.cells.len(),
            sheet.merged_ranges.len()
        );
        Ok(TemplateWorkbook {
            source_name: source_name.to_owned(),
            default_style: package.default_style(),
            theme: package.theme.take(),
            colors: package.styles.colors.take(),
            sheet_names,
            sheet,
        })
    }
}

/// Loads relationships from a `.rels` part
///
/// # Returns
/// Relationships in document order, targets resolved to zip paths
pub(crate) fn load_relationships(zip: &mut ZipArchive<Cursor<Vec<u8>>>, path: &str) -> Result<Vec<Relationship>, LoadSheetError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if let Some((id, target)) = id.zip(target) {
                relationships.push(Relationship {
                    id: id.to_string(),
                    kind: kind.map(|kind| kind.to_string()).unwrap_or_default(),
                    target: to_zip_path(target),
                });
            }
        }
    });
    Ok(relationships)
}

/// Lists worksheets as (name, zip_path) pairs, skipping chart sheets and
/// sheets whose relationship is missing.
fn load_workbook(zip: &mut ZipArchive<Cursor<Vec<u8>>>, relationships: &[Relationship]) -> Result<Vec<(String, String)>, LoadSheetError> {
    let mut reader = zip.xml_reader(WORKBOOK_PATH)?
        .ok_or_else(|| SpreadsheetError::FileError(WORKBOOK_PATH.to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                let worksheet = relationships
                    .iter()
                    .find(|relationship| relationship.id == id && relationship.kind.ends_with("/worksheet"));
                match worksheet {
                    Some(relationship) => sheets.push((name.to_string(), relationship.target.to_owned())),
                    None => debug!("Skipping sheet '{name}': not a worksheet"),
                }
            }
        }
    });
    Ok(sheets)
}

/// Loads the shared string table
fn load_shared_strings<R: BufRead>(reader: &mut XmlReader<R>) -> Result<Vec<String>, LoadSheetError> {
    let mut shared_strings = Vec::<String>::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            shared_strings.push(read_string_value(reader, TAG_SHARED_STRING_ITEM, false)?);
        }
    });
    Ok(shared_strings)
}

/// Loads number formats, fonts, fills, borders and cell formats from `styles.xml`
///
/// Differential formats (`dxfs`) and named cell styles are not read; every
/// `font`, `fill` and `border` is recognized only inside its own collection.
pub(crate) fn load_styles<R: BufRead>(reader: &mut XmlReader<R>) -> Result<StyleSheet, LoadSheetError> {
    let mut styles = StyleSheet::default();
    let mut section = None::<QName<'static>>;
    let mut format = None::<RawCellFormat>;

    match_xml_events!(reader => {
        Event::Start(event) if section.is_none() && STYLE_SECTIONS.contains(&event.name()) => {
            section = STYLE_SECTIONS.iter().copied().find(|tag| *tag == event.name());
        }
        Event::End(event) if section.is_some_and(|tag| tag == event.name()) => {
            section = None;
        }
        Event::Start(event) if section.is_none() && event.name() == TAG_COLORS => {
            let start = event.into_owned();
            styles.colors = Some(reader.read_fragment(start, is_portable_name)?);
        }
        Event::Start(event) if section == Some(TAG_NUMBER_FORMATS) && event.name() == TAG_NUMBER_FORMAT => {
            let id = event.parse_attribute_value::<u32>("numFmtId")?;
            let code = event.get_attribute_value("formatCode")?;
            if let Some((id, code)) = id.zip(code) {
                styles.number_formats.push((id, code.to_string()));
            }
        }
        Event::Start(event) if section == Some(TAG_FONTS) && event.name() == TAG_FONT => {
            let start = event.into_owned();
            styles.fonts.push(Font { xml: reader.read_fragment(start, is_portable_name)? });
        }
        Event::Start(event) if section == Some(TAG_FILLS) && event.name() == TAG_FILL => {
            let start = event.into_owned();
            styles.fills.push(Fill { xml: reader.read_fragment(start, is_portable_name)? });
        }
        Event::Start(event) if section == Some(TAG_BORDERS) && event.name() == TAG_BORDER => {
            let start = event.into_owned();
            styles.borders.push(Border { xml: reader.read_fragment(start, is_portable_name)? });
        }
        Event::Start(event) if section == Some(TAG_CELL_FORMATS) && event.name() == TAG_CELL_FORMAT => {
            format = Some(RawCellFormat {
                number_format_id: event.parse_attribute_value("numFmtId")?.unwrap_or(0),
                font_id: event.parse_attribute_value("fontId")?.unwrap_or(0),
                fill_id: event.parse_attribute_value("fillId")?.unwrap_or(0),
                border_id: event.parse_attribute_value("borderId")?.unwrap_or(0),
                alignment: None,
                protection: None,
            });
        }
        Event::Start(event) if event.name() == TAG_ALIGNMENT => {
            if let Some(format) = format.as_mut() {
                format.alignment = Some(Alignment {
                    horizontal: event.get_attribute_value("horizontal")?.map(Cow::into_owned),
                    vertical: event.get_attribute_value("vertical")?.map(Cow::into_owned),
                    wrap_text: event.bool_attribute_value("wrapText")?,
                    shrink_to_fit: event.bool_attribute_value("shrinkToFit")?,
                    indent: event.parse_attribute_value("indent")?,
                    text_rotation: event.parse_attribute_value("textRotation")?,
                    reading_order: event.parse_attribute_value("readingOrder")?,
                });
            }
        }
        Event::Start(event) if event.name() == TAG_PROTECTION => {
            if let Some(format) = format.as_mut() {
                format.protection = Some(Protection {
                    locked: event.bool_attribute_value("locked")?,
                    hidden: event.bool_attribute_value("hidden")?,
                });
            }
        }
        Event::End(event) if event.name() == TAG_CELL_FORMAT => {
            if let Some(format) = format.take() {
                styles.cell_formats.push(format);
            }
        }
    });
    Ok(styles)
}

/// Cell being assembled between its `<c>` start and end tags
struct PendingCell {
    at: CellRef,
    kind: Option<String>,
    style: usize,
    value: String,
    formula: Option<String>,
}

/// Reads one worksheet part into a [`Worksheet`]
///
/// Cells are resolved against the shared string table and the style sheet.
/// Formats that cannot be resolved are kept as [`CellFormat::Unreadable`].
pub(crate) fn load_worksheet<R: BufRead>(
    reader: &mut XmlReader<R>,
    name: &str,
    styles: &StyleSheet,
    shared_strings: &[String],
) -> Result<Worksheet, LoadSheetError> {
    let mut sheet = Worksheet::new(name);
    let mut dropped = Vec::<String>::new();
    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut cell = None::<PendingCell>;

    match_xml_events!(reader => {
        Event::Start(event) if LAYOUT_TAGS.contains(&event.name().as_ref()) => {
            let start = event.into_owned();
            let tag = start.name().as_ref().to_vec();
            let fragment = reader.read_fragment(start, is_portable_name)?;
            if let Some(slot) = layout_slot(&mut sheet.layout, &tag) {
                *slot = Some(fragment);
            }
        }
        Event::Start(event) if DROPPED_TAGS.contains(&event.name().as_ref()) => {
            let tag = String::from_utf8_lossy(event.name().as_ref()).into_owned();
            reader.skip_element()?;
            if !dropped.contains(&tag) {
                dropped.push(tag);
            }
        }
        Event::Start(event) if event.name() == TAG_EXTENSIONS => {
            reader.skip_element()?;
        }
        Event::Start(event) if event.name() == TAG_COLUMN => {
            let first = event.parse_attribute_value::<usize>("min")?;
            let last = event.parse_attribute_value::<usize>("max")?;
            if let Some((first, last)) = first.zip(last).filter(|(first, last)| *first >= 1 && first <= last) {
                sheet.columns.push(ColumnFormat {
                    first: first - 1,
                    last: last - 1,
                    width: event.parse_attribute_value("width")?,
                    custom_width: event.bool_attribute_value("customWidth")?.unwrap_or(false),
                    hidden: event.bool_attribute_value("hidden")?.unwrap_or(false),
                    format: styles.resolve(event.parse_attribute_value("style")?.unwrap_or(0)),
                });
            }
        }
        Event::Start(event) if event.name() == TAG_ROW => {
            row = match event.parse_attribute_value::<usize>("r")? {
                Some(number) if number >= 1 => number - 1,
                _ => row_count,
            };
            col_count = 0;
            let height = event.parse_attribute_value::<f64>("ht")?;
            let hidden = event.bool_attribute_value("hidden")?.unwrap_or(false);
            let custom_format = event.bool_attribute_value("customFormat")?.unwrap_or(false);
            if height.is_some() || hidden || custom_format {
                let format = if custom_format {
                    styles.resolve(event.parse_attribute_value("s")?.unwrap_or(0))
                } else {
                    CellFormat::Default
                };
                sheet.rows.insert(row, RowFormat {
                    height,
                    custom_height: event.bool_attribute_value("customHeight")?.unwrap_or(false),
                    hidden,
                    format,
                });
            }
        }
        Event::End(event) if event.name() == TAG_ROW => {
            row_count = row + 1;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            let (cell_row, cell_col) = event.get_attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row, col_count));
            col_count = cell_col + 1;
            cell = Some(PendingCell {
                at: CellRef::new(cell_row, cell_col),
                kind: event.get_attribute_value("t")?.map(Cow::into_owned),
                style: event.parse_attribute_value("s")?.unwrap_or(0),
                value: String::new(),
                formula: None,
            });
        }
        Event::Start(event) if cell.is_some() && event.name() == TAG_VALUE => {
            let value = read_string_value(reader, TAG_VALUE, true)?;
            if let Some(cell) = cell.as_mut() {
                cell.value = value;
            }
        }
        Event::Start(event) if cell.is_some() && event.name() == TAG_INLINE_STRING => {
            let value = read_string_value(reader, TAG_INLINE_STRING, false)?;
            if let Some(cell) = cell.as_mut() {
                cell.value = value;
            }
        }
        Event::Start(event) if cell.is_some() && event.name() == TAG_FORMULA => {
            let formula = read_string_value(reader, TAG_FORMULA, true)?;
            if let Some(cell) = cell.as_mut() {
                cell.formula = Some(formula);
            }
        }
        Event::End(event) if event.name() == TAG_CELL => {
            if let Some(pending) = cell.take() {
                let value = cell_value(&pending, shared_strings)?;
                let format = styles.resolve(pending.style);
                let built = Cell { value, format };
                if !built.is_blank() {
                    sheet.cells.insert(pending.at, built);
                }
            }
        }
        Event::Start(event) if event.name() == TAG_MERGE_CELL => {
            if let Some(reference) = event.get_attribute_value("ref")? {
                sheet.merged_ranges.push(reference.parse::<CellRange>()?);
            }
        }
    });

    if !dropped.is_empty() {
        warn!("Sheet '{}': {} not carried into generated sheets", name, dropped.join(", "));
    }
    Ok(sheet)
}

/// Converts the raw text of a cell into a value according to its `t` attribute.
fn cell_value(cell: &PendingCell, shared_strings: &[String]) -> Result<CellValue, LoadSheetError> {
    // Dependent cells of a shared formula carry no text; their cached value stands in.
    if let Some(formula) = cell.formula.as_deref().filter(|formula| !formula.is_empty()) {
        return Ok(CellValue::Formula(formula.to_owned()));
    }
    let value = &cell.value;
    if value.is_empty() {
        return Ok(CellValue::Empty);
    }
    let invalid = || SpreadsheetError::CellValueError {
        reference: cell.at.to_string(),
        value: value.to_owned(),
    };
    let value = match cell.kind.as_deref() {
        Some("s") => {
            let index = value.trim().parse::<usize>().map_err(|_| invalid())?;
            CellValue::from(shared_strings.get(index).ok_or_else(invalid)?.as_str())
        }
        Some("inlineStr") | Some("str") | Some("d") => CellValue::Text(value.to_owned()),
        Some("b") => CellValue::Boolean(value.trim() == "1" || value.trim().eq_ignore_ascii_case("true")),
        Some("e") => CellValue::Error(value.to_owned()),
        _ => CellValue::Number(value.trim().parse::<f64>().map_err(|_| invalid())?),
    };
    Ok(value)
}

fn layout_slot<'a>(layout: &'a mut SheetLayout, tag: &[u8]) -> Option<&'a mut Option<String>> {
    match tag {
        b"sheetPr" => Some(&mut layout.properties),
        b"sheetViews" => Some(&mut layout.views),
        b"sheetFormatPr" => Some(&mut layout.format),
        b"sheetProtection" => Some(&mut layout.protection),
        b"protectedRanges" => Some(&mut layout.protected_ranges),
        b"dataValidations" => Some(&mut layout.data_validations),
        b"printOptions" => Some(&mut layout.print_options),
        b"pageMargins" => Some(&mut layout.page_margins),
        b"pageSetup" => Some(&mut layout.page_setup),
        b"headerFooter" => Some(&mut layout.header_footer),
        b"rowBreaks" => Some(&mut layout.row_breaks),
        b"colBreaks" => Some(&mut layout.col_breaks),
        b"ignoredErrors" => Some(&mut layout.ignored_errors),
        _ => None,
    }
}

/// Normalizes a relationship target to a path within the package
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if path.starts_with("/xl/") {
        path[1..].to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Reads string value from XML content, handling text and CDATA sections
///
/// Skips phonetic text annotations and concatenates the text of rich text runs.
///
/// # Arguments
/// * `reader` - XML reader positioned just after the start tag
/// * `end_tag` - XML tag that marks the end of the string content
/// * `is_text_content` - Whether character data directly inside the element counts
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, LoadSheetError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = is_text_content,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
