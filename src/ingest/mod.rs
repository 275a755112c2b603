//! Log-file ingestion pipeline
//!
//! Reads a scheduler log (with an ordered encoding fallback), extracts the
//! covered time range, folds the job events into a per-file ledger, and
//! writes the records to a job table. Batch processing keeps going when a
//! single file fails; the failure is reported with the file and cause.

pub mod live;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::parser::{build_ledger, extract_time_range, scan_events};
use crate::table::{self, TableError, WriteMode};

pub use live::LiveProcessor;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("log file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unable to decode {} with any supported encoding", .0.display())]
    Decode(PathBuf),

    #[error("table error: {0}")]
    Table(#[from] TableError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;

/// Decoders tried in order; the first one that decodes without errors wins.
/// Windows-1252 subsumes ISO-8859-1 and ASCII under WHATWG rules.
const ENCODINGS: &[&encoding_rs::Encoding] = &[encoding_rs::UTF_8, encoding_rs::WINDOWS_1252];

/// Read a log file, trying each supported encoding in order. Decoding is
/// reported as a failure only after every encoding has been exhausted.
pub fn read_log_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(IngestError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;

    for encoding in ENCODINGS {
        let (text, _, had_errors) = encoding.decode(&bytes);
        if !had_errors {
            return Ok(text.into_owned());
        }
    }
    Err(IngestError::Decode(path.to_path_buf()))
}

/// What one file's processing produced.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub jobs: usize,
    pub elapsed: Duration,
    pub time_range: (Option<NaiveDateTime>, Option<NaiveDateTime>),
}

impl FileReport {
    pub fn file_label(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Process a single log file into the table at `table_path`.
///
/// The in-memory ledger is scoped to this call and discarded after the
/// write, so repeated invocations (the live feed case) accumulate rows in
/// the table, not in memory.
pub fn process_file(path: &Path, table_path: &Path, mode: WriteMode) -> Result<FileReport> {
    let started = Instant::now();

    let text = read_log_text(path)?;
    let time_range = extract_time_range(&text);
    match time_range {
        (Some(first), Some(last)) => {
            info!(file = %path.display(), %first, %last, "Log period extracted");
        }
        _ => {
            warn!(file = %path.display(), "Unable to extract time range from log");
        }
    }

    let ledger = build_ledger(scan_events(&text));
    table::write_records(table_path, ledger.records(), mode)?;

    let report = FileReport {
        path: path.to_path_buf(),
        jobs: ledger.len(),
        elapsed: started.elapsed(),
        time_range,
    };
    info!(
        file = %path.display(),
        jobs = report.jobs,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Log file processed"
    );
    Ok(report)
}

/// What a folder pass produced: the per-file reports plus the files that
/// failed (processing continued past them).
#[derive(Debug, Default)]
pub struct BatchReport {
    pub reports: Vec<FileReport>,
    pub failures: Vec<(PathBuf, IngestError)>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total_jobs(&self) -> usize {
        self.reports.iter().map(|r| r.jobs).sum()
    }
}

/// Process every log file in `folder` whose name ends with `suffix` into a
/// fresh table, appending file by file.
///
/// The table is recreated from scratch; files are taken in name order. One
/// file failing does not abort the batch.
pub fn process_folder(folder: &Path, table_path: &Path, suffix: &str) -> Result<BatchReport> {
    let started = Instant::now();

    if !folder.is_dir() {
        return Err(IngestError::NotFound(folder.to_path_buf()));
    }
    if table_path.exists() {
        std::fs::remove_file(table_path)?;
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .map(|n| n.to_string_lossy().ends_with(suffix))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    let mut batch = BatchReport::default();
    for file in files {
        match process_file(&file, table_path, WriteMode::Append) {
            Ok(report) => batch.reports.push(report),
            Err(err) => {
                error!(file = %file.display(), error = %err, "Skipping file after failure");
                batch.failures.push((file, err));
            }
        }
    }
    batch.elapsed = started.elapsed();

    info!(
        folder = %folder.display(),
        files = batch.reports.len(),
        failures = batch.failures.len(),
        jobs = batch.total_jobs(),
        "Folder processed"
    );
    Ok(batch)
}
