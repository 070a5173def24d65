//! Cell styles as owned values.
//!
//! A worksheet cell in an xlsx package points at a shared `cellXfs` entry by index.
//! Here every styled cell instead carries its own resolved [`CellStyle`], so copying
//! a cell copies its style and no two cells ever share a mutable style object. The
//! writer interns the values back into a fresh style table.

/// Markup of a `<font>` element, kept verbatim
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Font {
    pub xml: String,
}

/// Markup of a `<fill>` element, kept verbatim
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fill {
    pub xml: String,
}

/// Markup of a `<border>` element, kept verbatim
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Border {
    pub xml: String,
}

/// Number format. Built-in formats (ids below 164) have no code.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NumberFormat {
    pub id: u32,
    pub code: Option<String>,
}

impl NumberFormat {
    /// First id available to custom format codes
    pub const FIRST_CUSTOM_ID: u32 = 164;

    pub fn builtin(id: u32) -> Self {
        NumberFormat { id, code: None }
    }

    pub fn custom(code: impl Into<String>) -> Self {
        NumberFormat {
            id: Self::FIRST_CUSTOM_ID,
            code: Some(code.into()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Protection {
    pub locked: Option<bool>,
    pub hidden: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Alignment {
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
    pub wrap_text: Option<bool>,
    pub shrink_to_fit: Option<bool>,
    pub indent: Option<u32>,
    pub text_rotation: Option<u32>,
    pub reading_order: Option<u32>,
}

/// Complete formatting of a cell. `None` components fall back to the workbook
/// default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellStyle {
    pub font: Option<Font>,
    pub fill: Option<Fill>,
    pub border: Option<Border>,
    pub number_format: Option<NumberFormat>,
    pub protection: Option<Protection>,
    pub alignment: Option<Alignment>,
}

/// Formatting slot of a cell, row or column.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellFormat {
    /// Workbook default formatting
    #[default]
    Default,
    Styled(CellStyle),
    /// The source referenced a style that could not be resolved
    Unreadable { index: usize, reason: String },
}

impl CellFormat {
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    pub fn style(&self) -> Option<&CellStyle> {
        match self {
            Self::Styled(style) => Some(style),
            _ => None,
        }
    }

    pub fn style_mut(&mut self) -> Option<&mut CellStyle> {
        match self {
            Self::Styled(style) => Some(style),
            _ => None,
        }
    }
}

pub(crate) const DEFAULT_FONT: &str =
    r#"<font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font>"#;
pub(crate) const DEFAULT_FILL: &str = r#"<fill><patternFill patternType="none"/></fill>"#;
pub(crate) const GRAY_FILL: &str = r#"<fill><patternFill patternType="gray125"/></fill>"#;
pub(crate) const DEFAULT_BORDER: &str = "<border><left/><right/><top/><bottom/><diagonal/></border>";

/// A `cellXfs` entry as read from `styles.xml`, before resolution.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RawCellFormat {
    pub(crate) number_format_id: u32,
    pub(crate) font_id: usize,
    pub(crate) fill_id: usize,
    pub(crate) border_id: usize,
    pub(crate) alignment: Option<Alignment>,
    pub(crate) protection: Option<Protection>,
}

/// Style tables of one xlsx package.
#[derive(Clone, Debug, Default)]
pub(crate) struct StyleSheet {
    pub(crate) number_formats: Vec<(u32, String)>,
    pub(crate) fonts: Vec<Font>,
    pub(crate) fills: Vec<Fill>,
    pub(crate) borders: Vec<Border>,
    pub(crate) cell_formats: Vec<RawCellFormat>,
    /// `<colors>` markup: the indexed palette and recently used colors
    pub(crate) colors: Option<String>,
}

impl StyleSheet {
    /// Resolves a cell `s` attribute. Index 0 is the workbook default.
    pub(crate) fn resolve(&self, index: usize) -> CellFormat {
        if index == 0 {
            return CellFormat::Default;
        }
        match self.resolve_style(index) {
            Ok(style) => CellFormat::Styled(style),
            Err(reason) => CellFormat::Unreadable { index, reason },
        }
    }

    /// Style of `cellXfs[0]`, or the stock Calibri 11 style when the package
    /// has no usable style table.
    pub(crate) fn default_style(&self) -> CellStyle {
        self.resolve_style(0).unwrap_or_else(|_| CellStyle {
            font: Some(Font { xml: DEFAULT_FONT.to_owned() }),
            fill: Some(Fill { xml: DEFAULT_FILL.to_owned() }),
            border: Some(Border { xml: DEFAULT_BORDER.to_owned() }),
            number_format: Some(NumberFormat::builtin(0)),
            protection: None,
            alignment: None,
        })
    }

    fn resolve_style(&self, index: usize) -> Result<CellStyle, String> {
        let raw = self
            .cell_formats
            .get(index)
            .ok_or_else(|| format!("style {index} is not defined"))?;
        let font = self
            .fonts
            .get(raw.font_id)
            .ok_or_else(|| format!("font {} is not defined", raw.font_id))?;
        let fill = self
            .fills
            .get(raw.fill_id)
            .ok_or_else(|| format!("fill {} is not defined", raw.fill_id))?;
        let border = self
            .borders
            .get(raw.border_id)
            .ok_or_else(|| format!("border {} is not defined", raw.border_id))?;
        let number_format = if raw.number_format_id < NumberFormat::FIRST_CUSTOM_ID {
            NumberFormat::builtin(raw.number_format_id)
        } else {
            let code = self
                .number_formats
                .iter()
                .find(|(id, _)| *id == raw.number_format_id)
                .map(|(_, code)| code.to_owned())
                .ok_or_else(|| format!("number format {} is not defined", raw.number_format_id))?;
            NumberFormat {
                id: raw.number_format_id,
                code: Some(code),
            }
        };
        Ok(CellStyle {
            font: Some(font.clone()),
            fill: Some(fill.clone()),
            border: Some(border.clone()),
            number_format: Some(number_format),
            protection: raw.protection.clone(),
            alignment: raw.alignment.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> StyleSheet {
        StyleSheet {
            number_formats: vec![(164, "dd/mm/yyyy".to_owned())],
            fonts: vec![
                Font { xml: DEFAULT_FONT.to_owned() },
                Font { xml: "<font><b/></font>".to_owned() },
            ],
            fills: vec![Fill { xml: DEFAULT_FILL.to_owned() }, Fill { xml: GRAY_FILL.to_owned() }],
            borders: vec![Border { xml: DEFAULT_BORDER.to_owned() }],
            cell_formats: vec![
                RawCellFormat::default(),
                RawCellFormat {
                    number_format_id: 164,
                    font_id: 1,
                    alignment: Some(Alignment {
                        horizontal: Some("center".to_owned()),
                        ..Alignment::default()
                    }),
                    ..RawCellFormat::default()
                },
                RawCellFormat {
                    font_id: 7,
                    ..RawCellFormat::default()
                },
                RawCellFormat {
                    number_format_id: 170,
                    ..RawCellFormat::default()
                },
            ],
            colors: None,
        }
    }

    #[test]
    fn index_zero_is_default() {
        assert_eq!(sheet().resolve(0), CellFormat::Default);
    }

    #[test]
    fn resolves_every_component() {
        let format = sheet().resolve(1);
        let style = format.style().unwrap();
        assert_eq!(style.font.as_ref().unwrap().xml, "<font><b/></font>");
        assert_eq!(style.number_format, Some(NumberFormat { id: 164, code: Some("dd/mm/yyyy".to_owned()) }));
        assert_eq!(style.alignment.as_ref().unwrap().horizontal.as_deref(), Some("center"));
        assert_eq!(style.protection, None);
    }

    #[test]
    fn dangling_references_are_unreadable() {
        let sheet = sheet();
        assert!(matches!(sheet.resolve(2), CellFormat::Unreadable { index: 2, .. }));
        assert!(matches!(sheet.resolve(3), CellFormat::Unreadable { index: 3, .. }));
        assert!(matches!(sheet.resolve(99), CellFormat::Unreadable { index: 99, .. }));
    }

    #[test]
    fn default_style_falls_back_without_table() {
        let style = StyleSheet::default().default_style();
        assert_eq!(style.font.unwrap().xml, DEFAULT_FONT);
    }

    #[test]
    fn resolved_styles_are_independent_copies() {
        let sheet = sheet();
        let mut first = sheet.resolve(1);
        let second = sheet.resolve(1);
        first.style_mut().unwrap().font = Some(Font { xml: "<font><i/></font>".to_owned() });
        assert_ne!(first, second);
        assert_eq!(sheet.resolve(1), second);
    }
}
