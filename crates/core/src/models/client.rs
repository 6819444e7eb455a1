use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::sync::UpstreamTimestamped;

/// A salon client. Business-wide entity: identity is `client_id` alone and
/// sync runs under the `"ALL"` scope.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Client {
    pub client_id: String,
    pub version: i64,

    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    pub linked_client_mobile: String,
    pub land_line: String,
    pub email: String,

    pub street_address_1: String,
    pub street_address_2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,

    pub birth_date: Option<NaiveDate>,
    pub client_since: Option<NaiveDate>,
    pub gender: String,
    pub notes: String,

    pub sms_marketing_consent: bool,
    pub email_marketing_consent: bool,
    pub sms_reminder_consent: bool,
    pub email_reminder_consent: bool,

    pub preferred_staff_id: String,
    pub external_id: String,
    pub creating_branch_id: String,

    pub archived: bool,
    pub banned: bool,
    /// Upstream deletions are mirrored with the flag set; rows are retained.
    pub deleted: bool,
    pub merged_to_client_id: String,

    /// Comma-joined category ids, stored losslessly as provided.
    pub client_category_ids: String,

    pub first_visit: Option<DateTime<Utc>>,
    pub last_visit: Option<DateTime<Utc>>,
    pub photo_url: String,

    pub loyalty_card_serial: String,
    pub loyalty_points: Option<Decimal>,
    pub credit_outstanding_balance: Option<Decimal>,
    pub credit_days: Option<i64>,
    pub credit_limit: Option<Decimal>,

    pub created_at_upstream: Option<DateTime<Utc>>,
    pub updated_at_upstream: Option<DateTime<Utc>>,
}

impl UpstreamTimestamped for Client {
    fn updated_at_upstream(&self) -> Option<DateTime<Utc>> {
        self.updated_at_upstream
    }
}
