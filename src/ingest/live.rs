use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{error, info};

use crate::observability::{BenchmarkEntry, BenchmarkLog, Metrics, ResourceSampler};
use crate::table::{self, WriteMode};
use crate::watch::LogSink;

use super::process_file;

/// Live-feed sink: appends each settled log file to the live job table and
/// keeps the realtime benchmark log current.
///
/// The job ledger is rebuilt per file inside [`process_file`] and discarded
/// after each append; only the table accumulates across files.
pub struct LiveProcessor {
    table_path: PathBuf,
    benchmark_path: PathBuf,
    metrics: Arc<Metrics>,
    sampler: Box<dyn ResourceSampler>,
    benchmarks: Mutex<BenchmarkLog>,
}

impl LiveProcessor {
    /// Set up the live sink. The live table is reset to a header-only file,
    /// matching the start of a fresh watch session.
    pub fn new(
        table_path: PathBuf,
        benchmark_path: PathBuf,
        metrics: Arc<Metrics>,
        sampler: Box<dyn ResourceSampler>,
    ) -> super::Result<Self> {
        table::write_records(&table_path, &[], WriteMode::Overwrite)?;
        Ok(Self {
            table_path,
            benchmark_path,
            metrics,
            sampler,
            benchmarks: Mutex::new(BenchmarkLog::new()),
        })
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn record_benchmark(&self, entry: BenchmarkEntry) {
        let Ok(mut benchmarks) = self.benchmarks.lock() else {
            return;
        };
        benchmarks.push(entry);
        if let Err(err) = benchmarks.write_csv(&self.benchmark_path) {
            error!(path = %self.benchmark_path.display(), error = %err, "Failed to write benchmark log");
        }
    }
}

#[async_trait]
impl LogSink for LiveProcessor {
    async fn on_file_ready(&self, path: &Path) {
        match process_file(path, &self.table_path, WriteMode::Append) {
            Ok(report) => {
                self.metrics.file_processed();
                self.metrics.jobs_recorded(report.jobs as u64);
                let reading = self.sampler.sample();
                self.record_benchmark(BenchmarkEntry::new(
                    report.file_label(),
                    report.elapsed.as_secs_f64(),
                    reading,
                ));
                info!(file = %path.display(), jobs = report.jobs, "Live file appended");
            }
            Err(err) => {
                self.metrics.file_failed();
                error!(file = %path.display(), error = %err, "Live file processing failed");
            }
        }
    }
}
