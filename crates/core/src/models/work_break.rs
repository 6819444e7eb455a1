use chrono::{DateTime, NaiveDate, Utc};

use crate::sync::UpstreamTimestamped;

/// A staff break at a branch. Identity is `(branch_id, break_id)`.
///
/// The upstream exposes no mutation timestamp for breaks, so conflict
/// resolution gates on `version` and the sync always re-scans its rolling
/// window instead of using a watermark.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkBreak {
    pub branch_id: String,
    pub break_id: String,
    pub version: i64,

    pub break_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,

    pub staff_id: String,
    pub room_id: Option<String>,
    pub machine_id: Option<String>,
    pub label: Option<String>,
    pub paid_break: bool,
}

impl UpstreamTimestamped for WorkBreak {
    fn updated_at_upstream(&self) -> Option<DateTime<Utc>> {
        None
    }
}
