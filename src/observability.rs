//! Observability: processing metrics, resource sampling, benchmark log

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::table::Result;

/// Metrics handle for recording processing counters
#[derive(Debug, Default)]
pub struct Metrics {
    files_processed: AtomicU64,
    files_failed: AtomicU64,
    jobs_recorded: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_processed(&self) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "files_processed", "Metric incremented");
    }

    pub fn file_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "files_failed", "Metric incremented");
    }

    pub fn jobs_recorded(&self, count: u64) {
        self.jobs_recorded.fetch_add(count, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_recorded", count, "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            files_processed: self.files_processed.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            jobs_recorded: self.jobs_recorded.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub files_processed: u64,
    pub files_failed: u64,
    pub jobs_recorded: u64,
}

/// One CPU/RAM reading for the file that was just processed. Fields are
/// absent when the platform offers no way to sample them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceReading {
    pub cpu_percent: Option<f64>,
    pub ram_mb: Option<f64>,
}

/// Per-file resource usage collaborator.
pub trait ResourceSampler: Send + Sync {
    fn sample(&self) -> ResourceReading;
}

/// Sampler that reports nothing; the benchmark log then carries only
/// processing times.
#[derive(Debug, Default)]
pub struct NullSampler;

impl ResourceSampler for NullSampler {
    fn sample(&self) -> ResourceReading {
        ResourceReading::default()
    }
}

const CLOCK_TICKS_PER_SEC: f64 = 100.0;

/// Best-effort sampler reading `/proc/self`. CPU percent is derived from
/// the utime+stime delta since the previous sample, so the first reading
/// reports no CPU value.
#[derive(Debug, Default)]
pub struct ProcSampler {
    last_cpu: Mutex<Option<(Instant, u64)>>,
}

impl ProcSampler {
    pub fn new() -> Self {
        Self::default()
    }

    fn rss_mb() -> Option<f64> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
        let kb: f64 = line.split_whitespace().nth(1)?.parse().ok()?;
        Some(kb / 1024.0)
    }

    fn cpu_ticks() -> Option<u64> {
        let stat = std::fs::read_to_string("/proc/self/stat").ok()?;
        // Fields after the parenthesized comm; utime and stime are the
        // 14th and 15th fields of the full line.
        let rest = stat.rsplit_once(')')?.1;
        let mut fields = rest.split_whitespace().skip(11);
        let utime: u64 = fields.next()?.parse().ok()?;
        let stime: u64 = fields.next()?.parse().ok()?;
        Some(utime + stime)
    }
}

impl ResourceSampler for ProcSampler {
    fn sample(&self) -> ResourceReading {
        let ram_mb = Self::rss_mb();

        let cpu_percent = Self::cpu_ticks().and_then(|ticks| {
            let now = Instant::now();
            let mut last = self.last_cpu.lock().ok()?;
            let previous = last.replace((now, ticks));
            let (then, prior_ticks) = previous?;
            let elapsed = now.duration_since(then).as_secs_f64();
            if elapsed <= 0.0 {
                return None;
            }
            let used = ticks.saturating_sub(prior_ticks) as f64 / CLOCK_TICKS_PER_SEC;
            Some(used / elapsed * 100.0)
        });

        ResourceReading { cpu_percent, ram_mb }
    }
}

/// One benchmark tuple: a label (usually the file name), the processing
/// time, and the optional resource reading taken after the file.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkEntry {
    pub label: String,
    pub duration_secs: f64,
    pub cpu_percent: Option<f64>,
    pub ram_mb: Option<f64>,
}

impl BenchmarkEntry {
    pub fn new(label: impl Into<String>, duration_secs: f64, reading: ResourceReading) -> Self {
        Self {
            label: label.into(),
            duration_secs,
            cpu_percent: reading.cpu_percent,
            ram_mb: reading.ram_mb,
        }
    }
}

/// Collects per-file benchmark entries and persists them as a CSV with
/// Total, Average and Peak summary rows.
#[derive(Debug, Default)]
pub struct BenchmarkLog {
    entries: Vec<BenchmarkEntry>,
}

impl BenchmarkLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: BenchmarkEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "File",
            "Processing Time (seconds)",
            "CPU Usage (%)",
            "RAM Usage (MB)",
        ])?;

        let fmt_secs = |d: f64| format!("{d:.3}");
        let fmt_opt = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_default();

        for entry in &self.entries {
            writer.write_record([
                entry.label.clone(),
                fmt_secs(entry.duration_secs),
                fmt_opt(entry.cpu_percent),
                fmt_opt(entry.ram_mb),
            ])?;
        }

        if !self.entries.is_empty() {
            let total: f64 = self.entries.iter().map(|e| e.duration_secs).sum();
            let average = total / self.entries.len() as f64;
            let avg_of = |values: &[f64]| {
                if values.is_empty() {
                    None
                } else {
                    Some(values.iter().sum::<f64>() / values.len() as f64)
                }
            };
            let max_of = |values: &[f64]| values.iter().copied().reduce(f64::max);

            let cpus: Vec<f64> = self.entries.iter().filter_map(|e| e.cpu_percent).collect();
            let rams: Vec<f64> = self.entries.iter().filter_map(|e| e.ram_mb).collect();

            writer.write_record([
                "Total".to_string(),
                fmt_secs(total),
                String::new(),
                String::new(),
            ])?;
            writer.write_record([
                "Average".to_string(),
                fmt_secs(average),
                fmt_opt(avg_of(&cpus)),
                fmt_opt(avg_of(&rams)),
            ])?;
            writer.write_record([
                "Peak".to_string(),
                String::new(),
                fmt_opt(max_of(&cpus)),
                fmt_opt(max_of(&rams)),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}
