use chrono::NaiveDateTime;
use indexmap::IndexMap;

use super::event::JobEvent;

/// Accumulated lifecycle record for one job run.
///
/// Every field except `id` is absent until the corresponding event is seen.
/// All fields are last-write-wins: a later duplicate event overwrites what
/// an earlier one set, and every event overwrites `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRecord {
    pub id: String,
    pub name: Option<String>,
    pub scheduled_time: Option<NaiveDateTime>,
    pub start_time: Option<NaiveDateTime>,
    /// Set by the `Removed` event only. An `Ended` event records just the
    /// return code; removal from the job table is what closes the record.
    pub end_time: Option<NaiveDateTime>,
    pub return_code: Option<String>,
    pub scheduled_message_code: Option<String>,
    pub start_message_code: Option<String>,
    pub end_message_code: Option<String>,
    pub remove_message_code: Option<String>,
}

/// In-memory mapping from run ID to [`JobRecord`], built by folding the
/// event stream of one log file. Records are created on the first event for
/// an unseen run ID and never removed; iteration order is first-encounter
/// order, which is also the row order of the tabular store.
#[derive(Debug, Default)]
pub struct Ledger {
    jobs: IndexMap<String, JobRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the mapping. Never fails: duplicate events
    /// overwrite, partial lifecycles (a schedule with no end yet) are the
    /// expected state for a live feed.
    pub fn apply(&mut self, event: JobEvent) {
        let run_id = event.run_id().to_string();
        let record = self
            .jobs
            .entry(run_id.clone())
            .or_insert_with(|| JobRecord {
                id: run_id,
                ..JobRecord::default()
            });

        match event {
            JobEvent::Scheduled {
                name,
                timestamp,
                message_code,
                ..
            } => {
                record.name = Some(name);
                record.scheduled_time = Some(timestamp);
                record.scheduled_message_code = Some(message_code);
            }
            JobEvent::Started {
                name,
                timestamp,
                message_code,
                ..
            } => {
                record.name = Some(name);
                record.start_time = Some(timestamp);
                record.start_message_code = Some(message_code);
            }
            JobEvent::Ended {
                name,
                return_code,
                message_code,
                ..
            } => {
                record.name = Some(name);
                record.return_code = Some(return_code);
                record.end_message_code = Some(message_code);
            }
            JobEvent::Removed {
                name,
                timestamp,
                message_code,
                ..
            } => {
                record.name = Some(name);
                record.end_time = Some(timestamp);
                record.remove_message_code = Some(message_code);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, run_id: &str) -> Option<&JobRecord> {
        self.jobs.get(run_id)
    }

    /// Records in first-encounter order.
    pub fn records(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs.values()
    }

    pub fn into_records(self) -> IndexMap<String, JobRecord> {
        self.jobs
    }
}

/// Fold a whole event sequence into the final run-ID mapping.
pub fn build_ledger(events: impl IntoIterator<Item = JobEvent>) -> Ledger {
    let mut ledger = Ledger::new();
    for event in events {
        ledger.apply(event);
    }
    ledger
}
