//! Record sinks
//!
//! A sink receives every completed fetch exactly once. Responses go to the
//! primary stream; failures go to a separate error channel.

use crate::output::record::OutputRecord;
use crate::TidepoolError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Destination for completed fetch records
pub trait RecordSink {
    /// Appends one record
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), TidepoolError>;

    /// Flushes everything written so far
    fn close(&mut self) -> Result<(), TidepoolError>;
}

/// Newline-delimited record file, truncated when opened
///
/// Failures are written to the error channel (stderr unless replaced) rather
/// than to the file. Buffered data is flushed by [`RecordSink::close`] and,
/// failing that, when the sink is dropped.
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
    errors: Box<dyn Write + Send>,
}

impl FileSink {
    /// Opens (creating or truncating) the record file at `path`
    pub fn create(path: &Path) -> Result<Self, TidepoolError> {
        Self::with_error_channel(path, Box::new(std::io::stderr()))
    }

    /// Like [`FileSink::create`] but sends failure lines to `errors`
    pub fn with_error_channel(
        path: &Path,
        errors: Box<dyn Write + Send>,
    ) -> Result<Self, TidepoolError> {
        let file = File::create(path).map_err(|source| sink_error(path, source))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            errors,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for FileSink {
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), TidepoolError> {
        let result = if record.is_failure() {
            writeln!(self.errors, "{}", record)
        } else {
            writeln!(self.writer, "{}", record)
        };
        result.map_err(|source| sink_error(&self.path, source))
    }

    fn close(&mut self) -> Result<(), TidepoolError> {
        self.errors
            .flush()
            .and_then(|_| self.writer.flush())
            .map_err(|source| sink_error(&self.path, source))
    }
}

/// Keeps records in memory, split the same way as [`FileSink`]
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<OutputRecord>,
    pub failures: Vec<OutputRecord>,
    pub closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in the order they were written
    pub fn all(&self) -> Vec<&OutputRecord> {
        let mut all: Vec<_> = self.records.iter().chain(self.failures.iter()).collect();
        all.sort_by_key(|r| r.ordinal);
        all
    }
}

impl RecordSink for MemorySink {
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), TidepoolError> {
        if record.is_failure() {
            self.failures.push(record.clone());
        } else {
            self.records.push(record.clone());
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), TidepoolError> {
        self.closed = true;
        Ok(())
    }
}

fn sink_error(path: &Path, source: std::io::Error) -> TidepoolError {
    TidepoolError::Sink {
        path: path.display().to_string(),
        source,
    }
}
