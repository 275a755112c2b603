//! Command handlers behind the CLI: wire the configured paths into the
//! library components and print the user-facing summaries.

use std::sync::Arc;

use sapledger::analytics;
use sapledger::config::{Config, TableKind};
use sapledger::ingest::{self, LiveProcessor};
use sapledger::observability::{
    BenchmarkEntry, BenchmarkLog, Metrics, ProcSampler, ResourceReading, ResourceSampler,
};
use sapledger::purge;
use sapledger::table::{self, WriteMode};
use sapledger::watch::PollWatcher;

use crate::cli::{AnalyzeArgs, BatchArgs, IngestArgs, PurgeArgs, WatchArgs};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn ingest(config: &Config, args: IngestArgs) -> Result<(), AnyError> {
    let table_path = config.table_path(TableKind::Single);
    let report = ingest::process_file(&args.file, &table_path, WriteMode::Overwrite)?;

    if let (Some(first), Some(last)) = report.time_range {
        println!("Log period: {first} to {last}");
    }
    println!("Found {} jobs in log file", report.jobs);
    println!("Data has been saved to {}", table_path.display());
    println!("Processing time: {:.2} seconds", report.elapsed.as_secs_f64());

    let sampler = ProcSampler::new();
    let mut benchmarks = BenchmarkLog::new();
    benchmarks.push(BenchmarkEntry::new(
        report.file_label(),
        report.elapsed.as_secs_f64(),
        sampler.sample(),
    ));
    benchmarks.write_csv(&config.benchmark_path("single_benchmarks.csv"))?;
    Ok(())
}

pub fn batch(config: &Config, args: BatchArgs) -> Result<(), AnyError> {
    let folder = args.folder.unwrap_or_else(|| config.paths.logs_dir.clone());
    let table_path = config.table_path(TableKind::Combined);
    let batch = ingest::process_folder(&folder, &table_path, &config.watch.suffix)?;

    println!("Processing complete!");
    println!(
        "Total processing time: {:.2} seconds",
        batch.elapsed.as_secs_f64()
    );
    println!("Total jobs processed: {}", batch.total_jobs());
    for (file, err) in &batch.failures {
        println!("Skipped {}: {err}", file.display());
    }
    println!(
        "Combined jobs data has been saved to {}",
        table_path.display()
    );

    let mut benchmarks = BenchmarkLog::new();
    for report in &batch.reports {
        benchmarks.push(BenchmarkEntry::new(
            report.file_label(),
            report.elapsed.as_secs_f64(),
            ResourceReading::default(),
        ));
    }
    benchmarks.write_csv(&config.benchmark_path("multiple_benchmarks.csv"))?;
    Ok(())
}

pub async fn watch(config: &Config, args: WatchArgs) -> Result<(), AnyError> {
    let folder = args
        .folder
        .unwrap_or_else(|| config.paths.live_logs_dir.clone());
    let processor = LiveProcessor::new(
        config.table_path(TableKind::Live),
        config.benchmark_path("realtime_benchmarks.csv"),
        Arc::new(Metrics::new()),
        Box::new(ProcSampler::new()),
    )?;

    let watcher = PollWatcher::new(&folder, &config.watch);
    watcher.run(&processor).await?;

    let snapshot = processor.metrics().snapshot();
    println!(
        "Processed {} files ({} failed), {} jobs recorded",
        snapshot.files_processed, snapshot.files_failed, snapshot.jobs_recorded
    );
    Ok(())
}

pub fn analyze(config: &Config, args: AnalyzeArgs) -> Result<(), AnyError> {
    let table_path = config.table_path(args.table.into());
    let rows = table::read_rows(&table_path)?;
    let analysis = analytics::analyze(&rows);

    match analysis.max_concurrent() {
        Some(max) => {
            println!("Maximum concurrent jobs: {max}");
            println!("Time periods with {max} concurrent jobs:");
            for snapshot in analysis.peak_snapshots() {
                println!("- {}", snapshot.timestamp);
                println!("  Running jobs: {}", snapshot.active);
            }
        }
        None => println!("No valid job timing data found for analysis."),
    }

    println!();
    match analysis.longest {
        Some(longest) => {
            let hours = (longest.duration_minutes / 60.0) as u64;
            let minutes = (longest.duration_minutes % 60.0) as u64;
            println!("Longest running job:");
            println!("Name: {}", longest.name);
            println!("Start time: {}", longest.start_time);
            println!("End time: {}", longest.end_time);
            println!("Duration: {hours}h {minutes}m");
            println!("Job ID: {}", longest.id);
            if longest.issues.is_empty() {
                println!("No issues detected with longest job.");
            } else {
                println!("Potential issues detected:");
                for issue in &longest.issues {
                    println!("- {issue}");
                }
            }
        }
        None => println!("No valid job duration data found."),
    }
    Ok(())
}

pub fn purge(config: &Config, args: PurgeArgs) -> Result<(), AnyError> {
    if args.from > args.to {
        return Err("start date must not be after end date".into());
    }
    let table_path = config.table_path(args.table.into());

    match purge::date_range_info(&table_path)? {
        Some((earliest, latest)) => {
            println!("Available date range in jobs data:");
            println!("Earliest date: {earliest}");
            println!("Latest date: {latest}");
        }
        None => println!("No timestamps found in the jobs table."),
    }

    if !args.yes {
        println!();
        println!(
            "Would purge rows between {} and {} from {}",
            args.from,
            args.to,
            table_path.display()
        );
        println!("Re-run with --yes to purge.");
        return Ok(());
    }

    let backup_dir =
        (!args.no_backup && config.purge.backup).then(|| config.paths.backup_dir.clone());
    let outcome = purge::purge_range(&table_path, args.from, args.to, backup_dir.as_deref())?;

    println!("Purge operation completed!");
    println!("Jobs purged: {}", outcome.removed);
    if let Some(backup) = outcome.backup {
        println!("A backup has been created at {}", backup.display());
    }
    Ok(())
}
