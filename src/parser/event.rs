use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use super::timestamp::{TIMESTAMP_PATTERN, parse_timestamp};

/// Message code token: `U` followed by exactly eight digits. Tags which log
/// line produced an event, independent of the event type.
pub static MESSAGE_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"U\d{8}").expect("constant regex pattern is valid"));

static SCHEDULED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Job '(.+?)' with RunID '(\d+)' is to be started\.")
        .expect("constant regex pattern is valid")
});

static STARTED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Job '(.+?)' started with RunID '(\d+)'\.")
        .expect("constant regex pattern is valid")
});

static ENDED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Job '(.+?)' with RunID '(\d+)' ended with return code '(\d+)'\.")
        .expect("constant regex pattern is valid")
});

static REMOVED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Job '(.+?)' with RunID '(\d+)' has been removed from the job table\.")
        .expect("constant regex pattern is valid")
});

/// One job-lifecycle event extracted from a single log line.
///
/// Run IDs stay as strings: they are mapping keys, and leading zeros are
/// significant. The `Ended` variant carries no timestamp; the log line's
/// timestamp only marks end-of-processing for range scans, while the job's
/// `end_time` comes from the later `Removed` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Scheduled {
        name: String,
        run_id: String,
        timestamp: NaiveDateTime,
        message_code: String,
    },
    Started {
        name: String,
        run_id: String,
        timestamp: NaiveDateTime,
        message_code: String,
    },
    Ended {
        name: String,
        run_id: String,
        return_code: String,
        message_code: String,
    },
    Removed {
        name: String,
        run_id: String,
        timestamp: NaiveDateTime,
        message_code: String,
    },
}

impl JobEvent {
    pub fn run_id(&self) -> &str {
        match self {
            JobEvent::Scheduled { run_id, .. }
            | JobEvent::Started { run_id, .. }
            | JobEvent::Ended { run_id, .. }
            | JobEvent::Removed { run_id, .. } => run_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            JobEvent::Scheduled { name, .. }
            | JobEvent::Started { name, .. }
            | JobEvent::Ended { name, .. }
            | JobEvent::Removed { name, .. } => name,
        }
    }
}

/// Extract at most one event from a log line.
///
/// A line yields an event only if it carries both a parseable timestamp
/// token and a message code. Templates are tried in the fixed priority order
/// scheduled, started, ended, removed; the first match wins, so a line can
/// never produce more than one event.
pub fn event_from_line(line: &str) -> Option<JobEvent> {
    let ts_token = TIMESTAMP_PATTERN.find(line)?;
    let code = MESSAGE_CODE_PATTERN.find(line)?;
    let timestamp = parse_timestamp(ts_token.as_str())?;
    let message_code = code.as_str().to_string();

    if let Some(caps) = SCHEDULED_PATTERN.captures(line) {
        return Some(JobEvent::Scheduled {
            name: caps[1].to_string(),
            run_id: caps[2].to_string(),
            timestamp,
            message_code,
        });
    }
    if let Some(caps) = STARTED_PATTERN.captures(line) {
        return Some(JobEvent::Started {
            name: caps[1].to_string(),
            run_id: caps[2].to_string(),
            timestamp,
            message_code,
        });
    }
    if let Some(caps) = ENDED_PATTERN.captures(line) {
        return Some(JobEvent::Ended {
            name: caps[1].to_string(),
            run_id: caps[2].to_string(),
            return_code: caps[3].to_string(),
            message_code,
        });
    }
    if let Some(caps) = REMOVED_PATTERN.captures(line) {
        return Some(JobEvent::Removed {
            name: caps[1].to_string(),
            run_id: caps[2].to_string(),
            timestamp,
            message_code,
        });
    }

    None
}

/// Lazily scan log text for job events, in line order.
pub fn scan_events(text: &str) -> impl Iterator<Item = JobEvent> + '_ {
    text.lines().filter_map(event_from_line)
}
