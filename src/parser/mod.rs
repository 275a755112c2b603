//! SAP batch-log parsing
//!
//! The scheduler log is free text; the only structurally significant tokens
//! are the timestamp (`YYYYMMDD/HHMMSS.mmm`), the message code (`U` plus
//! eight digits) and four fixed sentence templates describing the job
//! lifecycle. This module extracts those tokens line by line and folds the
//! resulting event stream into per-run job records:
//!
//! - [`timestamp`]: timestamp token matching and the overall time range
//! - [`event`]: the [`JobEvent`] variants and the line scanner
//! - [`ledger`]: the run-ID keyed accumulation into [`JobRecord`]s
//!
//! Lines that carry no event, malformed timestamps, and duplicate events
//! are all skipped or merged without aborting the scan.

pub mod event;
pub mod ledger;
pub mod timestamp;

pub use event::{JobEvent, scan_events};
pub use ledger::{JobRecord, Ledger, build_ledger};
pub use timestamp::{extract_time_range, find_timestamp};
