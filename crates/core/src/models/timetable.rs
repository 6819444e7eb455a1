use chrono::{DateTime, NaiveDate, Utc};

use crate::sync::UpstreamTimestamped;

/// One rostered time slot from the staff work-timetable.
///
/// Slots carry no stable upstream identity: the window the provider answers
/// for is the authoritative snapshot, and the sink replaces whole windows
/// atomically rather than upserting rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimetableSlot {
    pub branch_id: String,
    pub staff_id: String,

    pub slot_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,

    pub time_off_start_time: Option<String>,
    pub time_off_end_time: Option<String>,

    pub slot_type: String,
    pub custom: Option<String>,
    /// Branch the slot itself points at, when a roster spans branches.
    pub slot_branch_id: Option<String>,
    pub work_activity_id: Option<String>,
}

impl UpstreamTimestamped for TimetableSlot {
    fn updated_at_upstream(&self) -> Option<DateTime<Utc>> {
        None
    }
}
