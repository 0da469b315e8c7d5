//! Daily activity log
//!
//! Append-only record of which concepts were touched on which day, one
//! persisted document per calendar date. Entries accumulate indefinitely;
//! nothing prunes them.

mod models;
mod storage;

pub use models::DailyEntry;
pub use storage::DailyLog;
