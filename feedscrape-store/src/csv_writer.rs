//! CSV record writer.
//!
//! One row per post:
//!
//! ```text
//! TimeParsed,Tweet Text,Likes,Retweets,Views,Username,IsRetweet,IsReply,TweetID
//! 2024-03-01T12:30:00Z,hello,5,2,1234,someone,false,false,1
//! ```
//!
//! Quoting of text containing commas, quotes or newlines is left to `csv`.

use chrono::SecondsFormat;
use feedscrape_core::{PostRecord, RecordSink};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::error::StoreError;

/// Column names of the output file.
pub const CSV_HEADER: [&str; 9] = [
    "TimeParsed",
    "Tweet Text",
    "Likes",
    "Retweets",
    "Views",
    "Username",
    "IsRetweet",
    "IsReply",
    "TweetID",
];

/// Formats a record as the nine CSV fields.
pub fn format_row(record: &PostRecord) -> [String; 9] {
    [
        record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        record.text.clone(),
        record.likes.to_string(),
        record.reposts.to_string(),
        record.views.to_string(),
        record.handle.clone(),
        record.is_repost.to_string(),
        record.is_reply.to_string(),
        record.id.clone(),
    ]
}

/// Writes [`PostRecord`]s as CSV rows.
pub struct CsvRecordWriter<W: Write = File> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl CsvRecordWriter<File> {
    /// Opens `path` for writing.
    ///
    /// Without `append` the file is truncated and the header written. With
    /// `append` rows go after the existing content, and the header is only
    /// written if the file is empty.
    pub fn create(path: &Path, append: bool) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;

        let write_header = !append || file.metadata()?.len() == 0;
        info!(path = %path.display(), append, write_header, "Opened output file");

        Self::from_writer(file, write_header)
    }
}

impl<W: Write> CsvRecordWriter<W> {
    /// Wraps any writer, optionally writing the header first.
    pub fn from_writer(inner: W, write_header: bool) -> Result<Self, StoreError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);

        if write_header {
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
        }

        Ok(Self { writer, rows: 0 })
    }

    /// Number of rows written, excluding the header.
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, StoreError> {
        self.writer
            .into_inner()
            .map_err(|e| StoreError::Io(e.into_error()))
    }
}

impl<W: Write> RecordSink for CsvRecordWriter<W> {
    type Error = StoreError;

    fn write_record(&mut self, record: &PostRecord) -> Result<(), StoreError> {
        self.writer.write_record(format_row(record))?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.writer.flush()?;
        debug!(rows = self.rows, "Flushed output");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
