use chrono::{DateTime, Utc};

use crate::sync::UpstreamTimestamped;

/// A client review. Business-wide entity keyed by `review_id`; the branch
/// the visit happened at travels as an attribute.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Review {
    pub review_id: String,
    pub version: i64,

    pub branch_id: String,
    pub client_id: String,
    pub staff_id: String,

    pub rating: i32,
    pub text: String,
    pub published: bool,
    pub reviewed_at: Option<DateTime<Utc>>,

    pub created_at_upstream: Option<DateTime<Utc>>,
    pub updated_at_upstream: Option<DateTime<Utc>>,
}

impl UpstreamTimestamped for Review {
    fn updated_at_upstream(&self) -> Option<DateTime<Utc>> {
        self.updated_at_upstream
    }
}
