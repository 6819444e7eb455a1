use chrono::{DateTime, Utc};

use crate::sync::UpstreamTimestamped;

/// A staff member as rostered at one branch. Identity is
/// `(branch_id, staff_id)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StaffMember {
    pub branch_id: String,
    pub staff_id: String,
    pub version: i64,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,

    pub staff_category_id: String,
    pub self_employed: bool,
    pub hide_from_online_bookings: bool,
    pub archived: bool,

    pub created_at_upstream: Option<DateTime<Utc>>,
    pub updated_at_upstream: Option<DateTime<Utc>>,
}

impl UpstreamTimestamped for StaffMember {
    fn updated_at_upstream(&self) -> Option<DateTime<Utc>> {
        self.updated_at_upstream
    }
}
