//! # Pipeline
//!
//! Wires table extraction, normalization and template replication together.
//! The OCR service, the template store and the clock are collaborators behind
//! traits, so the same pipeline runs against a JSON table export on the command
//! line and against fixed inputs in tests.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{LoadSheetError, RowProcessingWarning};
use crate::normalize::TableNormalizer;
use crate::replicate::TemplateReplicator;
use crate::spreadsheet::{OutputWorkbook, TemplateWorkbook};
use crate::table::RawTable;
use anyhow::Context;
use log::info;
use std::path::{Path, PathBuf};

/// Turns an uploaded schedule image into a raw table.
pub trait TableExtractor {
    fn extract(&self, image: &[u8]) -> anyhow::Result<RawTable>;
}

/// Provides a freshly parsed template for each run.
pub trait TemplateSource {
    fn load(&self) -> Result<TemplateWorkbook, LoadSheetError>;
}

/// Reads the JSON export of an OCR table: `{"headers": [...], "rows": [[...]]}`.
#[derive(Copy, Clone, Debug, Default)]
pub struct JsonTableExtractor;

impl TableExtractor for JsonTableExtractor {
    fn extract(&self, image: &[u8]) -> anyhow::Result<RawTable> {
        RawTable::from_json(image).context("Failed to parse table JSON")
    }
}

/// Template read from disk on every load.
#[derive(Clone, Debug)]
pub struct FileTemplateSource {
    path: PathBuf,
}

impl FileTemplateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileTemplateSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TemplateSource for FileTemplateSource {
    fn load(&self) -> Result<TemplateWorkbook, LoadSheetError> {
        TemplateWorkbook::open(&self.path)
    }
}

/// Template held in memory, parsed anew on every load.
#[derive(Clone, Debug)]
pub struct BytesTemplateSource {
    source_name: String,
    bytes: Vec<u8>,
}

impl BytesTemplateSource {
    pub fn new(source_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        BytesTemplateSource {
            source_name: source_name.into(),
            bytes,
        }
    }
}

impl TemplateSource for BytesTemplateSource {
    fn load(&self) -> Result<TemplateWorkbook, LoadSheetError> {
        TemplateWorkbook::from_bytes(&self.source_name, self.bytes.clone())
    }
}

/// A generated workbook ready for the transport layer.
#[derive(Clone, Debug)]
pub struct Delivery {
    /// Suggested download name
    pub filename: String,
    pub workbook: OutputWorkbook,
    pub warnings: Vec<RowProcessingWarning>,
}

impl Delivery {
    pub fn to_bytes(&self) -> Result<Vec<u8>, LoadSheetError> {
        self.workbook.to_bytes()
    }

    pub fn save(&self, path: &Path) -> Result<(), LoadSheetError> {
        self.workbook.save(path)
    }
}

/// One configured extraction, normalization and replication chain.
///
/// Holds no mutable state: every run loads its own template and builds an
/// independent workbook, so a pipeline can serve concurrent requests by reference.
#[derive(Clone, Debug)]
pub struct Pipeline<X, T, C = SystemClock> {
    extractor: X,
    template_source: T,
    clock: C,
    normalizer: TableNormalizer,
    replicator: TemplateReplicator,
    output_filename: String,
}

impl<X, T, C> Pipeline<X, T, C>
where
    X: TableExtractor,
    T: TemplateSource,
    C: Clock,
{
    pub fn new(config: &Config, extractor: X, template_source: T, clock: C) -> Self {
        Pipeline {
            extractor,
            template_source,
            clock,
            normalizer: TableNormalizer::from_config(config),
            replicator: TemplateReplicator::from_config(config),
            output_filename: config.output_filename.to_owned(),
        }
    }

    pub fn normalizer(&self) -> &TableNormalizer {
        &self.normalizer
    }

    /// Extracts the table from `image` and processes it.
    ///
    /// # Errors
    ///
    /// * [`LoadSheetError::Extraction`] when the extractor fails
    /// * any error of [`Pipeline::process`]
    pub fn run(&self, image: &[u8]) -> Result<Delivery, LoadSheetError> {
        let table = self.extractor.extract(image).map_err(LoadSheetError::Extraction)?;
        self.process(table)
    }

    /// Normalizes `table`, then fills one template copy per record.
    ///
    /// # Errors
    ///
    /// * [`LoadSheetError::EmptyExtraction`] when the table has no rows
    /// * [`LoadSheetError::MissingColumns`] when a required column is missing
    /// * [`LoadSheetError::InvalidTemplate`] when the template cannot be loaded
    pub fn process(&self, table: RawTable) -> Result<Delivery, LoadSheetError> {
        let records = self.normalizer.normalize(table)?;
        let template = self.template_source.load()?;
        let replication = self.replicator.replicate(&template, records, self.clock.today())?;
        info!(
            "Prepared '{}' with {} sheets",
            self.output_filename,
            replication.workbook.len()
        );
        Ok(Delivery {
            filename: self.output_filename.to_owned(),
            workbook: replication.workbook,
            warnings: replication.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::ErrorKind;
    use crate::testutil;
    use chrono::NaiveDate;
    use googletest::prelude::*;

    struct FailingExtractor;

    impl TableExtractor for FailingExtractor {
        fn extract(&self, _image: &[u8]) -> anyhow::Result<RawTable> {
            anyhow::bail!("service unavailable")
        }
    }

    fn pipeline<X: TableExtractor>(extractor: X) -> Pipeline<X, BytesTemplateSource, FixedClock> {
        Pipeline::new(
            &Config::default(),
            extractor,
            BytesTemplateSource::new("template.xlsx", testutil::template_package()),
            FixedClock(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()),
        )
    }

    #[googletest::test]
    fn runs_json_table_end_to_end() {
        let json = br#"{
            "headers": ["RUN NO", "Driver_1", "driver 2", "Truck Rego"],
            "rows": [
                ["1234 5678", "John Smith", null, "AB12CD345"],
                ["9999", "Mary Lee\nrelief", "Bo Chen", "XY99"]
            ]
        }"#;

        let delivery = pipeline(JsonTableExtractor).run(json).unwrap();

        expect_that!(delivery.filename.as_str(), eq("truck_load_records.xlsx"));
        expect_that!(delivery.workbook.sheet_names(), eq(&vec!["AB12CD34", "XY99"]));
        expect_that!(delivery.warnings, is_empty());
        let bytes = delivery.to_bytes().unwrap();
        expect_that!(bytes.starts_with(b"PK"), eq(true));
    }

    #[googletest::test]
    fn extractor_failures_are_extraction_errors() {
        let error = pipeline(FailingExtractor).run(b"image").unwrap_err();
        expect_that!(error.kind(), eq(ErrorKind::Extraction));

        let error = pipeline(JsonTableExtractor).run(b"not json").unwrap_err();
        expect_that!(error.kind(), eq(ErrorKind::Extraction));
    }

    #[googletest::test]
    fn empty_table_is_reported_before_template_load() {
        let pipeline = Pipeline::new(
            &Config::default(),
            JsonTableExtractor,
            BytesTemplateSource::new("broken.xlsx", b"junk".to_vec()),
            FixedClock(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()),
        );
        let error = pipeline.run(br#"{"headers": ["Run", "Driver 1", "Truck"], "rows": []}"#).unwrap_err();
        expect_that!(error.kind(), eq(ErrorKind::EmptyExtraction));

        let error = pipeline.run(br#"{"headers": ["Run", "Driver 1", "Truck"], "rows": [["1234", "A", "T1"]]}"#).unwrap_err();
        expect_that!(error.kind(), eq(ErrorKind::InvalidTemplate));
    }

    #[googletest::test]
    fn missing_truck_column_is_reported() {
        let table = RawTable::new(["Run", "Driver 1"], [["1234", "A"]]);
        let error = pipeline(JsonTableExtractor).process(table).unwrap_err();
        assert!(matches!(
            error,
            LoadSheetError::MissingColumns { ref missing, .. } if missing == &vec![crate::normalize::ColumnRole::Truck]
        ));
    }

    #[googletest::test]
    fn file_template_source_reads_from_disk() -> googletest::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("template.xlsx");
        std::fs::write(&path, testutil::template_package())?;

        let template = FileTemplateSource::new(&path).load()?;
        expect_that!(template.sheet.name.as_str(), eq("Template"));

        let missing = FileTemplateSource::new(dir.path().join("missing.xlsx")).load();
        assert!(matches!(missing, Err(LoadSheetError::InvalidTemplate { .. })));
        Ok(())
    }
}
