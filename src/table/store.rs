use std::fs::{File, OpenOptions};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parser::JobRecord;

use super::error::{Result, TableError};

/// Column order of the job table. Field order of [`JobRow`] must match.
pub const JOB_COLUMNS: [&str; 10] = [
    "id",
    "name",
    "scheduled_time",
    "start_time",
    "end_time",
    "return_code",
    "scheduled_message_code",
    "start_message_code",
    "end_message_code",
    "remove_message_code",
];

/// Timestamp serialization format used by the table.
pub const TABLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a stored table timestamp. Empty and malformed values read back as
/// absent, mirroring how they were written.
pub fn parse_table_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TABLE_TIME_FORMAT).ok()
}

/// One row of the job table, as stored: all values are strings and absent
/// fields are empty strings on both the write and the read side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRow {
    pub id: String,
    pub name: String,
    pub scheduled_time: String,
    pub start_time: String,
    pub end_time: String,
    pub return_code: String,
    pub scheduled_message_code: String,
    pub start_message_code: String,
    pub end_message_code: String,
    pub remove_message_code: String,
}

impl JobRow {
    pub fn from_record(record: &JobRecord) -> Self {
        let time = |t: &Option<NaiveDateTime>| {
            t.map(|t| t.format(TABLE_TIME_FORMAT).to_string())
                .unwrap_or_default()
        };
        let text = |s: &Option<String>| s.clone().unwrap_or_default();

        Self {
            id: record.id.clone(),
            name: text(&record.name),
            scheduled_time: time(&record.scheduled_time),
            start_time: time(&record.start_time),
            end_time: time(&record.end_time),
            return_code: text(&record.return_code),
            scheduled_message_code: text(&record.scheduled_message_code),
            start_message_code: text(&record.start_message_code),
            end_message_code: text(&record.end_message_code),
            remove_message_code: text(&record.remove_message_code),
        }
    }
}

/// Write semantics for [`write_rows`] / [`write_records`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate the file and write header + rows.
    Overwrite,
    /// Write rows only; the header is written only if the file does not
    /// exist yet.
    Append,
}

/// Write rows to the table at `path`.
///
/// Row order is preserved as given. In `Overwrite` mode the header is always
/// written, even for an empty row set, so a fresh table is a valid
/// header-only file.
pub fn write_rows<'a, I>(path: &Path, rows: I, mode: WriteMode) -> Result<()>
where
    I: IntoIterator<Item = &'a JobRow>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let (file, write_header) = match mode {
        WriteMode::Overwrite => (File::create(path)?, true),
        WriteMode::Append => {
            let exists = path.exists();
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (file, !exists)
        }
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if write_header {
        writer.write_record(JOB_COLUMNS)?;
    }
    let mut count = 0usize;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = count, ?mode, "Table written");
    Ok(())
}

/// Serialize job records into table rows and write them.
pub fn write_records<'a, I>(path: &Path, records: I, mode: WriteMode) -> Result<()>
where
    I: IntoIterator<Item = &'a JobRecord>,
{
    let rows: Vec<JobRow> = records.into_iter().map(JobRow::from_record).collect();
    write_rows(path, &rows, mode)
}

/// Read all rows of the table at `path`, in file order.
///
/// A missing file is a [`TableError::NotFound`]; an existing file with no
/// data rows (header-only or zero bytes) is an empty result, not an error.
pub fn read_rows(path: &Path) -> Result<Vec<JobRow>> {
    if !path.exists() {
        return Err(TableError::NotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record(id: &str, name: &str) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            name: Some(name.to_string()),
            scheduled_time: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(8, 0, 0),
            ..JobRecord::default()
        }
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.csv");

        let records = vec![record("42", "BATCH_X"), record("7", "NIGHTLY")];
        write_records(&path, &records, WriteMode::Overwrite).unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "42");
        assert_eq!(rows[0].name, "BATCH_X");
        assert_eq!(rows[0].scheduled_time, "2024-01-15 08:00:00");
        // Absent fields come back as empty strings.
        assert_eq!(rows[0].start_time, "");
        assert_eq!(rows[0].return_code, "");
        assert_eq!(rows[1].id, "7");
    }

    #[test]
    fn round_trip_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");

        write_records(&first, &[record("1", "A")], WriteMode::Overwrite).unwrap();
        let rows = read_rows(&first).unwrap();
        write_rows(&second, &rows, WriteMode::Overwrite).unwrap();
        assert_eq!(read_rows(&second).unwrap(), rows);
    }

    #[test]
    fn overwrite_drops_prior_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.csv");

        write_records(&path, &[record("1", "A"), record("2", "B")], WriteMode::Overwrite).unwrap();
        write_records(&path, &[record("3", "C")], WriteMode::Overwrite).unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "3");
    }

    #[test]
    fn append_adds_rows_without_second_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.csv");

        write_records(&path, &[record("1", "A")], WriteMode::Append).unwrap();
        write_records(&path, &[record("2", "B")], WriteMode::Append).unwrap();

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.matches("scheduled_message_code").count(), 1);
    }

    #[test]
    fn overwrite_of_empty_set_leaves_header_only_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.csv");

        write_records(&path, &[], WriteMode::Overwrite).unwrap();
        assert!(path.exists());
        assert_eq!(read_rows(&path).unwrap(), Vec::new());
    }

    #[test]
    fn read_of_missing_table_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = read_rows(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, TableError::NotFound(_)));
    }

    #[test]
    fn job_names_with_commas_survive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.csv");

        write_records(&path, &[record("1", "LOAD, THEN POST")], WriteMode::Overwrite).unwrap();
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows[0].name, "LOAD, THEN POST");
    }
}
