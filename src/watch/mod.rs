//! Folder watching, decoupled from parsing
//!
//! The watcher knows nothing about logs or tables; it polls a folder and
//! hands settled file paths to a [`LogSink`] through the single
//! `on_file_ready` entry point. That keeps the parsing pipeline testable
//! without a live filesystem watcher behind it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::WatchConfig;

/// Receiver of settled files. Implementations decide what "ready" means for
/// them (the live pipeline parses and appends; tests just record paths).
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn on_file_ready(&self, path: &Path);
}

/// Poll-based folder watcher.
///
/// Each poll lists the folder, keeps files matching the configured suffix,
/// and reports a file once per observed modification, after its
/// modification time has been stable for the settle delay, so half-written
/// files are not handed to the sink.
pub struct PollWatcher {
    folder: PathBuf,
    suffix: String,
    poll_interval: Duration,
    settle: Duration,
    seen: HashMap<PathBuf, SystemTime>,
}

impl PollWatcher {
    pub fn new(folder: impl Into<PathBuf>, config: &WatchConfig) -> Self {
        Self {
            folder: folder.into(),
            suffix: config.suffix.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            settle: Duration::from_millis(config.settle_ms),
            seen: HashMap::new(),
        }
    }

    /// One polling pass: the settled new or changed files, in name order.
    pub fn poll(&mut self) -> std::io::Result<Vec<PathBuf>> {
        let now = SystemTime::now();
        let mut ready = Vec::new();

        for entry in std::fs::read_dir(&self.folder)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let matches_suffix = path
                .file_name()
                .map(|n| n.to_string_lossy().ends_with(&self.suffix))
                .unwrap_or(false);
            if !matches_suffix {
                continue;
            }

            let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            let settled = now
                .duration_since(modified)
                .map(|age| age >= self.settle)
                .unwrap_or(false);
            if !settled {
                debug!(file = %path.display(), "File still settling");
                continue;
            }

            if self.seen.get(&path) != Some(&modified) {
                self.seen.insert(path.clone(), modified);
                ready.push(path);
            }
        }

        ready.sort();
        Ok(ready)
    }

    /// Watch the folder until ctrl-c, handing each settled file to `sink`.
    /// Files are delivered one at a time, so table appends are serialized.
    pub async fn run(mut self, sink: &dyn LogSink) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.folder)?;
        info!(folder = %self.folder.display(), "Watching folder for log files");

        let mut ticker = tokio::time::interval(self.poll_interval);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping folder watch");
                    break;
                }
                _ = ticker.tick() => {
                    for path in self.poll()? {
                        info!(file = %path.display(), "New log file detected");
                        sink.on_file_ready(&path).await;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn test_config(settle_ms: u64) -> WatchConfig {
        WatchConfig {
            poll_interval_ms: 10,
            settle_ms,
            suffix: ".LOG.txt".to_string(),
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        paths: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl LogSink for RecordingSink {
        async fn on_file_ready(&self, path: &Path) {
            self.paths.lock().unwrap().push(path.to_path_buf());
        }
    }

    #[test]
    fn poll_reports_each_file_once() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.LOG.txt"), "x").unwrap();
        std::fs::write(dir.path().join("skip.txt"), "x").unwrap();

        let mut watcher = PollWatcher::new(dir.path(), &test_config(0));
        let first = watcher.poll().unwrap();
        assert_eq!(first.len(), 1);
        assert!(first[0].ends_with("a.LOG.txt"));

        // Unchanged file is not reported again.
        assert!(watcher.poll().unwrap().is_empty());
    }

    #[test]
    fn poll_reports_modified_file_again() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.LOG.txt");
        std::fs::write(&file, "x").unwrap();

        let mut watcher = PollWatcher::new(dir.path(), &test_config(0));
        assert_eq!(watcher.poll().unwrap().len(), 1);

        // Force a different (still settled) mtime.
        let earlier = SystemTime::now() - Duration::from_secs(60);
        let file_handle = std::fs::File::options().append(true).open(&file).unwrap();
        file_handle.set_modified(earlier).unwrap();
        drop(file_handle);

        assert_eq!(watcher.poll().unwrap().len(), 1);
    }

    #[test]
    fn unsettled_file_is_held_back() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.LOG.txt"), "x").unwrap();

        // Ten-minute settle: a file written just now is not ready.
        let mut watcher = PollWatcher::new(dir.path(), &test_config(600_000));
        assert!(watcher.poll().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sink_receives_settled_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.LOG.txt"), "x").unwrap();

        let mut watcher = PollWatcher::new(dir.path(), &test_config(0));
        let sink = RecordingSink::default();
        for path in watcher.poll().unwrap() {
            sink.on_file_ready(&path).await;
        }
        assert_eq!(sink.paths.lock().unwrap().len(), 1);
    }
}
