//! Session-scoped log of completed analyses.
//!
//! Records are appended in the order analyses finish and are never edited or
//! removed individually. The whole log can be exported as CSV with the
//! columns `timestamp,text,prediction,confidence`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{Local, NaiveDateTime, SubsecRound};
use log::{debug, info};
use parking_lot::Mutex;
use serde::Serialize;

use crate::classifier::{AnalysisResult, Confidence, Label};

/// Longest input excerpt kept verbatim in a record, in characters.
pub const EXCERPT_CHARS: usize = 100;
/// Appended to excerpts that were cut short.
pub const TRUNCATION_MARKER: &str = "...";
/// Suggested file name for exported history.
pub const DEFAULT_EXPORT_FILE: &str = "hate_speech_analysis_history.csv";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const CSV_HEADER: [&str; 4] = ["timestamp", "text", "prediction", "confidence"];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Shortens `text` to [`EXCERPT_CHARS`] characters plus
/// [`TRUNCATION_MARKER`]; shorter text is returned unchanged.
pub fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// One completed analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    timestamp: NaiveDateTime,
    text: String,
    label: Label,
    confidence: Confidence,
}

impl AnalysisRecord {
    /// Records `result` for `input` at the current local time.
    pub fn new(input: &str, result: &AnalysisResult) -> Self {
        Self::at(Local::now().naive_local(), input, result)
    }

    /// Records `result` for `input` at `timestamp`, truncated to whole seconds.
    pub fn at(timestamp: NaiveDateTime, input: &str, result: &AnalysisResult) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(0),
            text: excerpt(input),
            label: result.label,
            confidence: result.confidence,
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Input excerpt as stored.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    timestamp: String,
    text: &'a str,
    prediction: &'static str,
    confidence: String,
}

impl<'a> From<&'a AnalysisRecord> for CsvRow<'a> {
    fn from(record: &'a AnalysisRecord) -> Self {
        Self {
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            text: &record.text,
            prediction: record.label.as_str(),
            confidence: record.confidence.to_string(),
        }
    }
}

/// Append-only, insertion-ordered analysis log for one session.
///
/// Appends are serialized by an internal lock, so a history shared between
/// threads of the same session stays consistent.
#[derive(Debug, Default)]
pub struct History {
    records: Mutex<Vec<AnalysisRecord>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, record: AnalysisRecord) {
        let mut records = self.records.lock();
        records.push(record);
        debug!("History now holds {} record(s)", records.len());
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Snapshot of all records in insertion order.
    pub fn records(&self) -> Vec<AnalysisRecord> {
        self.records.lock().clone()
    }

    /// Writes the header and every record as CSV to `writer`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let records = self.records();
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record(CSV_HEADER)?;
        for record in &records {
            csv_writer.serialize(CsvRow::from(record))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Renders the whole history as CSV text.
    pub fn export(&self) -> Result<String, ExportError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Writes the CSV export to `path`, replacing any existing file.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.write_csv(BufWriter::new(file))?;
        info!("Exported {} record(s) to {:?}", self.len(), path);
        Ok(())
    }
}
