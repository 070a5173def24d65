//! XML reading and writing utilities for SpreadsheetML parts
//! Provides an XML reader wrapper, helper traits for attribute and text processing,
//! fragment capture and a small writer used to emit package parts

use crate::error::LoadSheetError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// Errors specific to XML parsing operations
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Parse entity '{0}' failed")]
    ParseEntityError(String),

    #[error("Parse attribute value '{0}' failed")]
    ParseAttributeValueError(String),

    #[error("Element '{0}' is not closed")]
    UnclosedElement(String),
}

/// XML reader wrapper with optimized configuration for spreadsheet parsing
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    /// Creates a new XML reader with optimized configuration for spreadsheet parsing
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        let buffer = Vec::with_capacity(1024);
        XmlReader { reader, buffer }
    }

    /// Reads the next XML event from the reader
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, LoadSheetError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(LoadSheetError::XmlError(error)),
        }
    }

    /// Re-serializes `start` and everything up to its matching end tag.
    ///
    /// Attributes whose qualified name fails `keep` are dropped, and so are
    /// child elements with a namespace prefix other than those `keep` accepts.
    /// Elements without content are written in their empty form (`<b/>`).
    pub(crate) fn read_fragment(
        &mut self,
        start: BytesStart<'static>,
        keep: fn(&[u8]) -> bool,
    ) -> Result<String, LoadSheetError> {
        let name = String::from_utf8(start.name().as_ref().to_vec())?;
        let mut writer = Writer::new(Vec::new());
        let mut pending = Some(filter_attributes(&start, keep)?);

        let mut depth = 1usize;
        let mut skipped = 0usize;
        while depth > 0 {
            let event = match self.next()? {
                Some(event) => event,
                None => Err(XmlError::UnclosedElement(name.to_owned()))?,
            };
            match event {
                Event::Start(event) => {
                    depth += 1;
                    if skipped > 0 || !keep_element(event.name().as_ref(), keep) {
                        skipped += 1;
                    } else {
                        if let Some(open) = pending.take() {
                            writer.write_event(Event::Start(open))?;
                        }
                        pending = Some(filter_attributes(&event, keep)?);
                    }
                }
                Event::End(event) => {
                    depth -= 1;
                    if skipped > 0 {
                        skipped -= 1;
                    } else if let Some(open) = pending.take() {
                        writer.write_event(Event::Empty(open))?;
                    } else {
                        writer.write_event(Event::End(event))?;
                    }
                }
                event @ (Event::Text(_) | Event::CData(_) | Event::GeneralRef(_)) if skipped == 0 => {
                    if let Some(open) = pending.take() {
                        writer.write_event(Event::Start(open))?;
                    }
                    writer.write_event(event)?;
                }
                _ => (),
            }
        }
        Ok(String::from_utf8(writer.into_inner())?)
    }

    /// Skips everything up to the end tag matching an already consumed start tag.
    pub(crate) fn skip_element(&mut self) -> Result<(), LoadSheetError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next()? {
                Some(Event::Start(_)) => depth += 1,
                Some(Event::End(_)) => depth -= 1,
                Some(_) => (),
                None => break,
            }
        }
        Ok(())
    }
}

/// Accepts unprefixed names plus the `xml:` and `x14ac:` prefixes, which the
/// generated parts always declare.
pub(crate) fn is_portable_name(name: &[u8]) -> bool {
    !name.contains(&b':') || name.starts_with(b"xml:") || name.starts_with(b"x14ac:")
}

fn keep_element(name: &[u8], keep: fn(&[u8]) -> bool) -> bool {
    !name.contains(&b':') || keep(name)
}

fn filter_attributes(start: &BytesStart, keep: fn(&[u8]) -> bool) -> Result<BytesStart<'static>, LoadSheetError> {
    let name = String::from_utf8(start.name().as_ref().to_vec())?;
    let mut filtered = BytesStart::new(name);
    for result in start.attributes() {
        let attribute = result?;
        if keep(attribute.key.as_ref()) {
            filtered.push_attribute(attribute);
        }
    }
    Ok(filtered.into_owned())
}

/// Helper trait for XML attributes providing convenient value extraction and parsing
pub(crate) trait XmlAttributeHelper<'a> {
    /// Gets the unescaped attribute value as a string
    fn get_value(&self) -> Result<Cow<'a, str>, LoadSheetError>;

    /// Parses the attribute value to the specified type
    fn parse_value<T: FromStr>(&self) -> Result<T, LoadSheetError>;
}

impl<'a> XmlAttributeHelper<'a> for Attribute<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, LoadSheetError> {
        Ok(self.unescape_value()?)
    }

    fn parse_value<T: FromStr>(&self) -> Result<T, LoadSheetError> {
        self.get_value()?
            .parse()
            .map_err(|_| match std::str::from_utf8(&self.value) {
                Ok(value) => LoadSheetError::XmlHelperError(XmlError::ParseAttributeValueError(value.to_string())),
                Err(error) => LoadSheetError::StringEncodingError(error),
            })
    }
}

/// Helper trait for XML nodes providing attribute access methods
pub(crate) trait XmlNodeHelper<'a> {
    /// Gets an attribute value by name
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, LoadSheetError>;

    /// Parses an attribute value to the specified type
    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, LoadSheetError>;

    /// Reads an OOXML boolean attribute (`1`/`true`, `0`/`false`)
    fn bool_attribute_value(&self, name: &str) -> Result<Option<bool>, LoadSheetError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, LoadSheetError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.get_value())
            .transpose()
    }

    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, LoadSheetError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.parse_value())
            .transpose()
    }

    fn bool_attribute_value(&self, name: &str) -> Result<Option<bool>, LoadSheetError> {
        let value = self.try_get_attribute(name)?
            .map(|attribute| attribute.get_value().map(|value| value == "1" || value == "true"))
            .transpose()?;
        Ok(value)
    }
}

/// Helper trait for building text content from XML events
pub(crate) trait XmlTextContextHelper {
    /// Appends text content from BytesText event
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), LoadSheetError>;

    /// Appends text content from BytesRef event (handles entities and character references)
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), LoadSheetError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), LoadSheetError> {
        self.push_str(&text.xml_content()?);
        Ok(())
    }

    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), LoadSheetError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = if let Some(hex) = number.strip_prefix('x') {
                u32::from_str_radix(hex, 16)?
            } else {
                u32::from_str_radix(number, 10)?
            };
            if let Some(character) = std::char::from_u32(code) {
                self.push_str(character.encode_utf8(&mut [0u8; 4]));
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::ParseEntityError(raw.to_string()))?;
        }

        Ok(())
    }
}

/// Builds a start tag with the given attributes; values are escaped.
pub(crate) fn element<'a>(name: &'a str, attributes: &[(&'a str, &'a str)]) -> BytesStart<'a> {
    BytesStart::new(name).with_attributes(attributes.iter().copied())
}

/// Streaming writer for one package part, starting with the standalone declaration.
pub(crate) struct XmlWriter {
    writer: Writer<Vec<u8>>,
}

impl XmlWriter {
    pub(crate) fn new() -> Result<XmlWriter, LoadSheetError> {
        let mut writer = Writer::new(Vec::with_capacity(4096));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(XmlWriter { writer })
    }

    pub(crate) fn start(&mut self, start: BytesStart) -> Result<(), LoadSheetError> {
        Ok(self.writer.write_event(Event::Start(start))?)
    }

    pub(crate) fn empty(&mut self, start: BytesStart) -> Result<(), LoadSheetError> {
        Ok(self.writer.write_event(Event::Empty(start))?)
    }

    pub(crate) fn end(&mut self, name: &str) -> Result<(), LoadSheetError> {
        Ok(self.writer.write_event(Event::End(BytesEnd::new(name)))?)
    }

    /// Writes escaped character data. Characters XML 1.0 cannot carry are dropped.
    pub(crate) fn text(&mut self, text: &str) -> Result<(), LoadSheetError> {
        let text = xml_chars(text);
        Ok(self.writer.write_event(Event::Text(BytesText::new(&text)))?)
    }

    /// Writes already well-formed markup verbatim.
    pub(crate) fn raw(&mut self, markup: &str) -> Result<(), LoadSheetError> {
        Ok(self.writer.write_event(Event::Text(BytesText::from_escaped(markup)))?)
    }

    /// Writes `<name attributes>text</name>`.
    pub(crate) fn text_element(&mut self, start: BytesStart, text: &str) -> Result<(), LoadSheetError> {
        let name = String::from_utf8(start.name().as_ref().to_vec())?;
        self.start(start)?;
        self.text(text)?;
        self.end(&name)
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

/// False for control characters other than tab, newline and carriage return, and for U+FFFE and U+FFFF.
fn is_xml_char(character: char) -> bool {
    !matches!(character, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}

fn xml_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|character| is_xml_char(*character)).collect())
    }
}

#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment_of(xml: &str, tag: &[u8]) -> String {
        let mut reader = XmlReader::new(xml.as_bytes());
        while let Some(event) = reader.next().unwrap() {
            if let Event::Start(start) = event {
                if start.name().as_ref() == tag {
                    let start = start.into_owned();
                    return reader.read_fragment(start, is_portable_name).unwrap();
                }
            }
        }
        panic!("no <{}> element", String::from_utf8_lossy(tag));
    }

    #[test]
    fn fragment_keeps_nested_markup() {
        let xml = r#"<styleSheet><fonts><font><b/><sz val="14"/><name val="Arial &amp; Co"/></font></fonts></styleSheet>"#;
        assert_eq!(
            fragment_of(xml, b"font"),
            r#"<font><b/><sz val="14"/><name val="Arial &amp; Co"/></font>"#
        );
    }

    #[test]
    fn fragment_drops_foreign_prefixes() {
        let xml = r#"<worksheet><sheetViews><sheetView tabSelected="1" r:id="rId4" x14ac:dyDescent="0.25"><mc:Choice><pane/></mc:Choice><selection activeCell="B3"/></sheetView></sheetViews></worksheet>"#;
        assert_eq!(
            fragment_of(xml, b"sheetViews"),
            r#"<sheetViews><sheetView tabSelected="1" x14ac:dyDescent="0.25"><selection activeCell="B3"/></sheetView></sheetViews>"#
        );
    }

    #[test]
    fn unclosed_fragment_is_an_error() {
        let mut reader = XmlReader::new(&b"<a><b>text"[..]);
        let start = match reader.next().unwrap() {
            Some(Event::Start(start)) => start.into_owned(),
            _ => panic!("expected start"),
        };
        assert!(reader.read_fragment(start, is_portable_name).is_err());
    }

    #[test]
    fn entities_and_character_references() {
        let mut text = String::new();
        text.push_bytes_ref(&BytesRef::new("amp")).unwrap();
        text.push_bytes_ref(&BytesRef::new("#x41")).unwrap();
        text.push_bytes_ref(&BytesRef::new("#66")).unwrap();
        assert_eq!(text, "&AB");
        assert!(text.push_bytes_ref(&BytesRef::new("nbsp")).is_err());
    }

    #[test]
    fn writer_escapes_text_and_keeps_raw_markup() {
        let mut writer = XmlWriter::new().unwrap();
        writer.start(element("root", &[("name", "a<b")])).unwrap();
        writer.text_element(element("t", &[]), "x & y").unwrap();
        writer.raw("<pageMargins left=\"0.7\"/>").unwrap();
        writer.empty(element("leaf", &[])).unwrap();
        writer.end("root").unwrap();

        let xml = String::from_utf8(writer.into_bytes()).unwrap();
        assert_eq!(
            xml,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><root name="a&lt;b"><t>x &amp; y</t><pageMargins left="0.7"/><leaf/></root>"#
        );
    }

    #[test]
    fn writer_drops_characters_xml_cannot_carry() {
        let mut writer = XmlWriter::new().unwrap();
        writer.text_element(element("t", &[]), "AB\u{1}12\tCD\u{1b}3\r\n").unwrap();

        let xml = String::from_utf8(writer.into_bytes()).unwrap();
        assert!(xml.ends_with("<t>AB12\tCD3\r\n</t>"), "{xml}");
    }

    #[test]
    fn boolean_attributes() {
        let start = BytesStart::from_content(r#"row hidden="1" customHeight="false""#, 3);
        assert_eq!(start.bool_attribute_value("hidden").unwrap(), Some(true));
        assert_eq!(start.bool_attribute_value("customHeight").unwrap(), Some(false));
        assert_eq!(start.bool_attribute_value("ht").unwrap(), None);
    }
}
