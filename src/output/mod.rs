//! Output module for crawl records and summaries
//!
//! This module handles:
//! - The per-fetch record type and its line format
//! - Sinks that receive records as fetches complete
//! - Reading the record file back for display
//! - The startup line printed before a crawl
//! - Run statistics

mod record;
mod sink;
pub mod stats;

pub use record::{FetchStatus, OutputRecord};
pub use sink::{FileSink, MemorySink, RecordSink};
pub use stats::{print_statistics, RunStats};

use crate::TidepoolError;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Copies the record file to `out`, line by line
///
/// # Returns
///
/// * `Ok(usize)` - Number of lines copied
/// * `Err(TidepoolError)` - The file could not be read or `out` rejected a write
pub fn display_sink(path: &Path, out: &mut dyn Write) -> Result<usize, TidepoolError> {
    let file = File::open(path).map_err(|source| TidepoolError::Sink {
        path: path.display().to_string(),
        source,
    })?;

    let mut lines = 0;
    for line in BufReader::new(file).lines() {
        writeln!(out, "{}", line?)?;
        lines += 1;
    }
    out.flush()?;

    Ok(lines)
}

/// Writes the line announcing a crawl, independent of log filtering
pub fn announce_start(out: &mut dyn Write, seed: &str) -> std::io::Result<()> {
    writeln!(out, "Crawler started for URL: {}", seed)?;
    out.flush()
}
