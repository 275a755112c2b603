//! Date-range purge over the tabular store
//!
//! Removes every row with any of its three timestamps inside an inclusive
//! window, rewriting the surviving rows in their original order. A
//! pre-purge snapshot of the table can be written to a timestamped backup
//! directory first.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

use crate::table::{self, JobRow, Result, WriteMode, parse_table_time};

/// Outcome of one purge pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeOutcome {
    pub removed: usize,
    pub retained: usize,
    /// Where the pre-purge snapshot landed, if one was requested.
    pub backup: Option<PathBuf>,
}

/// Remove every row whose `scheduled_time`, `start_time` or `end_time`
/// falls within `[start, end]` (all bounds inclusive; the union of the
/// three tests decides).
///
/// The table is rewritten with the remaining rows in original order, so a
/// second call with the same range removes nothing. When `backup_dir` is
/// given, the table is snapshotted there before it is mutated.
pub fn purge_range(
    path: &Path,
    start: NaiveDateTime,
    end: NaiveDateTime,
    backup_dir: Option<&Path>,
) -> Result<PurgeOutcome> {
    let rows = table::read_rows(path)?;
    let total = rows.len();

    let backup = match backup_dir {
        Some(dir) => Some(create_backup(path, dir)?),
        None => None,
    };

    let in_range = |value: &str| {
        parse_table_time(value).is_some_and(|t| t >= start && t <= end)
    };

    let retained: Vec<JobRow> = rows
        .into_iter()
        .filter(|row| {
            !(in_range(&row.scheduled_time) || in_range(&row.start_time) || in_range(&row.end_time))
        })
        .collect();
    let removed = total - retained.len();

    table::write_rows(path, &retained, WriteMode::Overwrite)?;
    info!(
        table = %path.display(),
        removed,
        retained = retained.len(),
        "Purge completed"
    );

    Ok(PurgeOutcome {
        removed,
        retained: retained.len(),
        backup,
    })
}

/// Global earliest and latest timestamp across all three time columns of
/// the table, for showing the available range before a purge. `None` when
/// the table holds no parseable timestamps.
pub fn date_range_info(path: &Path) -> Result<Option<(NaiveDateTime, NaiveDateTime)>> {
    let rows = table::read_rows(path)?;

    let mut earliest: Option<NaiveDateTime> = None;
    let mut latest: Option<NaiveDateTime> = None;
    for row in &rows {
        for value in [&row.scheduled_time, &row.start_time, &row.end_time] {
            if let Some(t) = parse_table_time(value) {
                earliest = Some(earliest.map_or(t, |e| e.min(t)));
                latest = Some(latest.map_or(t, |l| l.max(t)));
            }
        }
    }

    Ok(earliest.zip(latest))
}

/// Snapshot the table into `<backup_dir>/<stem>_<YYYYMMDD_HHMMSS>/<name>`.
fn create_backup(path: &Path, backup_dir: &Path) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    let name = path
        .file_name()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "table.csv".into());

    let target_dir = backup_dir.join(format!("{stem}_{stamp}"));
    fs::create_dir_all(&target_dir)?;
    let target = target_dir.join(name);

    if let Err(err) = fs::copy(path, &target) {
        warn!(source = %path.display(), error = %err, "Backup copy failed");
        return Err(err.into());
    }
    info!(backup = %target.display(), "Created pre-purge backup");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableError;
    use tempfile::TempDir;

    fn row(id: &str, scheduled: &str, start: &str, end: &str) -> JobRow {
        JobRow {
            id: id.to_string(),
            name: format!("JOB_{id}"),
            scheduled_time: scheduled.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            ..JobRow::default()
        }
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn purges_row_when_any_timestamp_in_range() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.csv");
        let rows = vec![
            // Only start_time in range.
            row("1", "", "2024-01-15 08:10:00", ""),
            // All timestamps outside.
            row("2", "2024-02-01 00:00:00", "2024-02-01 00:05:00", "2024-02-01 01:00:00"),
            // Only end_time in range.
            row("3", "", "", "2024-01-31 23:59:59"),
        ];
        table::write_rows(&path, &rows, WriteMode::Overwrite).unwrap();

        let outcome = purge_range(
            &path,
            dt("2024-01-01 00:00:00"),
            dt("2024-01-31 23:59:59"),
            None,
        )
        .unwrap();

        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.retained, 1);
        let left = table::read_rows(&path).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "2");
    }

    #[test]
    fn purge_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.csv");
        table::write_rows(
            &path,
            &[row("1", "", "2024-01-15 08:10:00", "")],
            WriteMode::Overwrite,
        )
        .unwrap();

        let start = dt("2024-01-01 00:00:00");
        let end = dt("2024-01-31 23:59:59");
        assert_eq!(purge_range(&path, start, end, None).unwrap().removed, 1);
        assert_eq!(purge_range(&path, start, end, None).unwrap().removed, 0);
    }

    #[test]
    fn bounds_are_inclusive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.csv");
        table::write_rows(
            &path,
            &[
                row("1", "2024-01-01 00:00:00", "", ""),
                row("2", "2024-01-31 23:59:59", "", ""),
                row("3", "2024-02-01 00:00:00", "", ""),
            ],
            WriteMode::Overwrite,
        )
        .unwrap();

        let outcome = purge_range(
            &path,
            dt("2024-01-01 00:00:00"),
            dt("2024-01-31 23:59:59"),
            None,
        )
        .unwrap();
        assert_eq!(outcome.removed, 2);
        assert_eq!(table::read_rows(&path).unwrap()[0].id, "3");
    }

    #[test]
    fn rows_with_no_parseable_times_survive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.csv");
        table::write_rows(&path, &[row("1", "", "", "")], WriteMode::Overwrite).unwrap();

        let outcome = purge_range(
            &path,
            dt("2024-01-01 00:00:00"),
            dt("2024-12-31 23:59:59"),
            None,
        )
        .unwrap();
        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.retained, 1);
    }

    #[test]
    fn backup_snapshot_preserves_pre_purge_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.csv");
        let backup_dir = dir.path().join("backups");
        table::write_rows(
            &path,
            &[row("1", "", "2024-01-15 08:10:00", "")],
            WriteMode::Overwrite,
        )
        .unwrap();

        let outcome = purge_range(
            &path,
            dt("2024-01-01 00:00:00"),
            dt("2024-01-31 23:59:59"),
            Some(&backup_dir),
        )
        .unwrap();

        let backup = outcome.backup.unwrap();
        assert!(backup.starts_with(&backup_dir));
        let snapshot = table::read_rows(&backup).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "1");
        assert!(table::read_rows(&path).unwrap().is_empty());
    }

    #[test]
    fn date_range_spans_all_three_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jobs.csv");
        table::write_rows(
            &path,
            &[
                row("1", "2024-01-10 00:00:00", "2024-01-15 08:00:00", ""),
                row("2", "", "", "2024-03-01 12:00:00"),
            ],
            WriteMode::Overwrite,
        )
        .unwrap();

        let (earliest, latest) = date_range_info(&path).unwrap().unwrap();
        assert_eq!(earliest, dt("2024-01-10 00:00:00"));
        assert_eq!(latest, dt("2024-03-01 12:00:00"));
    }

    #[test]
    fn missing_table_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = purge_range(
            &dir.path().join("missing.csv"),
            dt("2024-01-01 00:00:00"),
            dt("2024-01-02 00:00:00"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TableError::NotFound(_)));
    }
}
