//! CSV-backed tabular store for job records
//!
//! One row per run ID, fixed column order, values stored as strings.
//! Timestamps serialize as `YYYY-MM-DD HH:MM:SS`; absent fields are empty
//! strings. The store offers overwrite and append semantics; append writes
//! the header only when creating the file. No durability or transaction
//! guarantees; concurrent appends must be serialized by the caller.

pub mod error;
pub mod store;

pub use error::{Result, TableError};
pub use store::{
    JOB_COLUMNS, JobRow, TABLE_TIME_FORMAT, WriteMode, parse_table_time, read_rows, write_records,
    write_rows,
};
