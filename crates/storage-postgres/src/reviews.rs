//! Review repository: version-gated upsert keyed on `review_id`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::debug;

use datahub_core::models::Review;
use datahub_core::sync::EntitySink;
use datahub_core::Result;

use crate::db::{get_connection, PgPool};
use crate::errors::StorageError;
use crate::schema::reviews;

const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reviews)]
pub struct ReviewRow {
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

impl From<&Review> for ReviewRow {
    fn from(r: &Review) -> Self {
        Self {
            review_id: r.review_id.clone(),
            version: r.version,
            branch_id: r.branch_id.clone(),
            client_id: r.client_id.clone(),
            staff_id: r.staff_id.clone(),
            rating: r.rating,
            text: r.text.clone(),
            published: r.published,
            reviewed_at: r.reviewed_at,
            created_at_upstream: r.created_at_upstream,
            updated_at_upstream: r.updated_at_upstream,
        }
    }
}

#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
    batch_size: usize,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    fn upsert_chunk(conn: &mut PgConnection, chunk: &[ReviewRow]) -> QueryResult<usize> {
        use crate::schema::reviews::dsl::*;

        diesel::insert_into(reviews)
            .values(chunk)
            .on_conflict(review_id)
            .do_update()
            .set((
                ts_gated!("reviews", version),
                ts_gated!("reviews", branch_id),
                ts_gated!("reviews", client_id),
                ts_gated!("reviews", staff_id),
                ts_gated!("reviews", rating),
                ts_gated!("reviews", text),
                ts_gated!("reviews", published),
                ts_gated!("reviews", reviewed_at),
                keep_first!("reviews", created_at_upstream),
                newest_ts!("reviews", updated_at_upstream),
                ts_touch!("reviews", updated_at),
            ))
            .execute(conn)
    }
}

impl EntitySink<Review> for ReviewRepository {
    fn upsert_batch(&self, rows: &[Review]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mapped: Vec<ReviewRow> = rows.iter().map(ReviewRow::from).collect();
        let mut conn = get_connection(&self.pool)?;
        let mut affected = 0;
        for chunk in mapped.chunks(self.batch_size) {
            affected += Self::upsert_chunk(&mut conn, chunk).map_err(StorageError::from)?;
        }
        debug!(rows = rows.len(), "upserted review rows");
        Ok(affected)
    }
}
