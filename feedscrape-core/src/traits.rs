//! Trait definitions for feedscrape.

use crate::models::PostRecord;

/// A destination for fetched posts.
///
/// The pagination loop hands every record of a page to the sink, then calls
/// [`RecordSink::flush`] once before requesting the next page. A failed
/// [`RecordSink::write_record`] only loses that record; the loop keeps going.
pub trait RecordSink {
    /// Error produced by the sink.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Writes a single record.
    fn write_record(&mut self, record: &PostRecord) -> Result<(), Self::Error>;

    /// Flushes everything written so far to durable storage.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    type Error = S::Error;

    fn write_record(&mut self, record: &PostRecord) -> Result<(), Self::Error> {
        (**self).write_record(record)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }
}
