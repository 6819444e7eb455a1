use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::sync::UpstreamTimestamped;

/// One appointment slot at a branch. Branch-scoped: identity is
/// `(branch_id, appointment_id)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Appointment {
    pub branch_id: String,
    pub appointment_id: String,
    pub version: i64,

    pub appointment_date: NaiveDate,
    /// `HH:MM:SS` wall-clock times, stored as reported.
    pub start_time: String,
    pub end_time: String,

    pub price: Decimal,
    pub deposit_amount: Option<Decimal>,
    pub deposit_datetime: Option<DateTime<Utc>>,

    pub staff_id: String,
    pub confirmed: bool,
    pub service_id: String,
    pub service_name: String,
    pub service_reward_id: String,

    pub staff_request: bool,
    pub preferred_staff: bool,
    pub client_id: String,
    pub purchasing_branch_id: String,

    pub state: String,
    pub activation_state: String,
    pub booking_id: String,
    pub source: String,
    pub deleted: bool,

    /// Online booking categories, kept as the raw JSON array.
    pub online_service_categories: String,

    pub created_at_upstream: Option<DateTime<Utc>>,
    pub updated_at_upstream: Option<DateTime<Utc>>,
}

impl UpstreamTimestamped for Appointment {
    fn updated_at_upstream(&self) -> Option<DateTime<Utc>> {
        self.updated_at_upstream
    }
}
