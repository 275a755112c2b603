//! Job analytics over the tabular store
//!
//! Two independent consumers of the job table: a concurrency timeline (how
//! many jobs were simultaneously active, and which) and a longest-running
//! job diagnosis with issue flags. Both re-parse the stored timestamp
//! strings and treat unparseable values as absent rather than failing.

use chrono::NaiveDateTime;
use indexmap::IndexMap;

use crate::table::{JobRow, parse_table_time};

/// Longest-job duration ceiling in minutes. Durations at or above a day are
/// treated as artifacts of mismatched start/remove lines.
const MAX_PLAUSIBLE_MINUTES: f64 = 1440.0;

/// Duration above which the longest job is flagged as unusually long.
const LONG_RUN_MINUTES: f64 = 240.0;

/// Start delay past the scheduled time above which the longest job is
/// flagged as late.
const LATE_START_MINUTES: f64 = 30.0;

/// One point of the concurrency timeline: the state right after a single
/// start or end event was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineSnapshot {
    pub timestamp: NaiveDateTime,
    pub concurrent: usize,
    /// Names of the currently active jobs, comma-joined in the order the
    /// jobs became active.
    pub active: String,
}

/// The single longest-running job (within the plausible duration window)
/// and everything the CLI reports about it.
#[derive(Debug, Clone, PartialEq)]
pub struct LongestJob {
    pub id: String,
    pub name: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_minutes: f64,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct JobAnalysis {
    pub timeline: Vec<TimelineSnapshot>,
    pub longest: Option<LongestJob>,
}

impl JobAnalysis {
    pub fn max_concurrent(&self) -> Option<usize> {
        self.timeline.iter().map(|s| s.concurrent).max()
    }

    /// Snapshots at the maximum concurrency level.
    pub fn peak_snapshots(&self) -> Vec<&TimelineSnapshot> {
        match self.max_concurrent() {
            Some(max) => self
                .timeline
                .iter()
                .filter(|s| s.concurrent == max)
                .collect(),
            None => Vec::new(),
        }
    }
}

struct TimedRow<'a> {
    row: &'a JobRow,
    scheduled: Option<NaiveDateTime>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    duration_minutes: Option<f64>,
}

impl<'a> TimedRow<'a> {
    fn new(row: &'a JobRow) -> Self {
        let scheduled = parse_table_time(&row.scheduled_time);
        let start = parse_table_time(&row.start_time);
        let end = parse_table_time(&row.end_time);
        let duration_minutes = match (start, end) {
            (Some(start), Some(end)) => Some((end - start).num_seconds() as f64 / 60.0),
            _ => None,
        };
        Self {
            row,
            scheduled,
            start,
            end,
            duration_minutes,
        }
    }
}

/// Analyze the job table: build the concurrency timeline and diagnose the
/// longest-running job.
pub fn analyze(rows: &[JobRow]) -> JobAnalysis {
    let timed: Vec<TimedRow<'_>> = rows.iter().map(TimedRow::new).collect();

    JobAnalysis {
        timeline: build_timeline(&timed),
        longest: diagnose_longest(&timed),
    }
}

/// Signed concurrency change at one instant.
struct SweepEvent<'a> {
    at: NaiveDateTime,
    delta: i32,
    name: &'a str,
    id: &'a str,
}

fn build_timeline(timed: &[TimedRow<'_>]) -> Vec<TimelineSnapshot> {
    let mut events: Vec<SweepEvent<'_>> = Vec::new();
    for t in timed {
        if let Some(start) = t.start {
            events.push(SweepEvent {
                at: start,
                delta: 1,
                name: &t.row.name,
                id: &t.row.id,
            });
        }
        if let Some(end) = t.end {
            events.push(SweepEvent {
                at: end,
                delta: -1,
                name: &t.row.name,
                id: &t.row.id,
            });
        }
    }

    // Stable sort: ties keep original row order, starts before ends within
    // one row.
    events.sort_by_key(|e| e.at);

    let mut active: IndexMap<&str, &str> = IndexMap::new();
    let mut timeline = Vec::with_capacity(events.len());
    for event in &events {
        if event.delta > 0 {
            active.insert(event.id, event.name);
        } else {
            active.shift_remove(event.id);
        }

        timeline.push(TimelineSnapshot {
            timestamp: event.at,
            concurrent: active.len(),
            active: active.values().copied().collect::<Vec<_>>().join(", "),
        });
    }
    timeline
}

fn diagnose_longest(timed: &[TimedRow<'_>]) -> Option<LongestJob> {
    let mut longest: Option<&TimedRow<'_>> = None;
    for t in timed {
        let Some(duration) = t.duration_minutes else {
            continue;
        };
        if duration <= 0.0 || duration >= MAX_PLAUSIBLE_MINUTES {
            continue;
        }
        // Strictly-greater keeps the first row on ties.
        if longest.is_none_or(|best| duration > best.duration_minutes.unwrap_or(0.0)) {
            longest = Some(t);
        }
    }

    let best = longest?;
    let duration = best.duration_minutes?;
    let start = best.start?;
    let end = best.end?;

    let mut issues = Vec::new();
    let return_code = best.row.return_code.trim();
    if !return_code.is_empty() && return_code != "0" {
        issues.push(format!("Job failed with return code: {return_code}"));
    }
    if duration > LONG_RUN_MINUTES {
        issues.push(format!("Job took unusually long: {duration:.1} minutes"));
    }
    if let Some(scheduled) = best.scheduled {
        let delay = (start - scheduled).num_seconds() as f64 / 60.0;
        if delay > LATE_START_MINUTES {
            issues.push(format!("Job started {delay:.1} minutes later than scheduled"));
        }
    }

    Some(LongestJob {
        id: best.row.id.clone(),
        name: best.row.name.clone(),
        start_time: start,
        end_time: end,
        duration_minutes: duration,
        issues,
    })
}
