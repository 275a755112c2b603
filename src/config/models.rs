use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tables: TablesConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub purge: PurgeConfig,
}

/// Which job table an operation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// One log file, overwritten per run.
    Single,
    /// Folder batches, rebuilt per run.
    Combined,
    /// Live feed, appended across watch events.
    Live,
}

impl Config {
    /// Resolved path of a job table.
    pub fn table_path(&self, kind: TableKind) -> PathBuf {
        let name = match kind {
            TableKind::Single => &self.tables.single,
            TableKind::Combined => &self.tables.combined,
            TableKind::Live => &self.tables.live,
        };
        self.paths.csv_dir.join(name)
    }

    /// Resolved path of a benchmark log file.
    pub fn benchmark_path(&self, name: &str) -> PathBuf {
        self.paths.benchmark_dir.join(name)
    }
}

/// Directory layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    #[serde(default = "default_csv_dir")]
    pub csv_dir: PathBuf,
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
    #[serde(default = "default_live_logs_dir")]
    pub live_logs_dir: PathBuf,
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    #[serde(default = "default_benchmark_dir")]
    pub benchmark_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            csv_dir: default_csv_dir(),
            logs_dir: default_logs_dir(),
            live_logs_dir: default_live_logs_dir(),
            backup_dir: default_backup_dir(),
            benchmark_dir: default_benchmark_dir(),
        }
    }
}

fn default_csv_dir() -> PathBuf {
    PathBuf::from("csv")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_live_logs_dir() -> PathBuf {
    PathBuf::from("live_logs")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_benchmark_dir() -> PathBuf {
    PathBuf::from("benchmarks")
}

/// Job table file names within the csv directory
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TablesConfig {
    #[serde(default = "default_single_table")]
    pub single: String,
    #[serde(default = "default_combined_table")]
    pub combined: String,
    #[serde(default = "default_live_table")]
    pub live: String,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            single: default_single_table(),
            combined: default_combined_table(),
            live: default_live_table(),
        }
    }
}

fn default_single_table() -> String {
    "jobs.csv".to_string()
}

fn default_combined_table() -> String {
    "combined_jobs.csv".to_string()
}

fn default_live_table() -> String {
    "live_combined_jobs.csv".to_string()
}

/// Folder watching
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    /// How often the watched folder is listed.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long a file's modification time must be stable before it is
    /// handed to the sink.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Only files whose names end with this suffix are processed.
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            settle_ms: default_settle_ms(),
            suffix: default_suffix(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_suffix() -> String {
    ".LOG.txt".to_string()
}

/// Purge behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PurgeConfig {
    /// Snapshot the table before purging.
    #[serde(default = "default_backup")]
    pub backup: bool,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            backup: default_backup(),
        }
    }
}

fn default_backup() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_resolves_table_paths() {
        let config = Config::default();
        assert_eq!(
            config.table_path(TableKind::Combined),
            PathBuf::from("csv/combined_jobs.csv")
        );
        assert_eq!(
            config.table_path(TableKind::Live),
            PathBuf::from("csv/live_combined_jobs.csv")
        );
        assert_eq!(
            config.benchmark_path("single_benchmarks.csv"),
            PathBuf::from("benchmarks/single_benchmarks.csv")
        );
    }

    #[test]
    fn default_watch_settings() {
        let config = Config::default();
        assert_eq!(config.watch.poll_interval_ms, 1000);
        assert_eq!(config.watch.suffix, ".LOG.txt");
        assert!(config.purge.backup);
    }
}
