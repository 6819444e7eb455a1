//! Watermark store: `(entity, scope) -> last seen upstream timestamp`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;

use datahub_core::sync::{WatermarkStore, WORKTIMETABLE_BACKFILL_ENTITY};
use datahub_core::Result;

use crate::db::{get_connection, PgPool};
use crate::errors::StorageError;
use crate::schema::sync_watermarks;

#[derive(Debug, Insertable)]
#[diesel(table_name = sync_watermarks)]
struct NewWatermark<'a> {
    entity: &'a str,
    scope: &'a str,
    last_updated: DateTime<Utc>,
}

#[derive(Clone)]
pub struct WatermarkRepository {
    pool: PgPool,
}

impl WatermarkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// When the one-off historical work-timetable load finished for this
    /// branch, if it has. Presence is the marker; the value is only
    /// informational.
    pub fn backfill_done_at(&self, branch_id: &str) -> Result<Option<DateTime<Utc>>> {
        self.get(WORKTIMETABLE_BACKFILL_ENTITY, branch_id)
    }

    pub fn mark_backfill_done(&self, branch_id: &str) -> Result<()> {
        self.upsert(WORKTIMETABLE_BACKFILL_ENTITY, branch_id, Utc::now())
    }
}

impl WatermarkStore for WatermarkRepository {
    fn get(&self, entity: &str, scope: &str) -> Result<Option<DateTime<Utc>>> {
        use crate::schema::sync_watermarks::dsl;

        let mut conn = get_connection(&self.pool)?;
        let found = dsl::sync_watermarks
            .filter(dsl::entity.eq(entity))
            .filter(dsl::scope.eq(scope))
            .select(dsl::last_updated)
            .first::<DateTime<Utc>>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(found)
    }

    /// Atomic upsert. Monotonicity is deliberately not enforced here: the
    /// orchestrator decides when advancing is correct, and manual re-runs
    /// legitimately rewind.
    fn upsert(&self, entity: &str, scope: &str, ts: DateTime<Utc>) -> Result<()> {
        use crate::schema::sync_watermarks::dsl;

        let mut conn = get_connection(&self.pool)?;
        diesel::insert_into(dsl::sync_watermarks)
            .values(&NewWatermark {
                entity,
                scope,
                last_updated: ts,
            })
            .on_conflict((dsl::entity, dsl::scope))
            .do_update()
            .set((
                dsl::last_updated.eq(excluded(dsl::last_updated)),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .map_err(StorageError::from)?;
        Ok(())
    }
}
