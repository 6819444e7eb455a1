//! Break repository. The provider exposes no mutation timestamp for
//! breaks, so the upsert gates on the row version instead.

use chrono::NaiveDate;
use diesel::prelude::*;
use tracing::debug;

use datahub_core::models::WorkBreak;
use datahub_core::sync::EntitySink;
use datahub_core::Result;

use crate::db::{get_connection, PgPool};
use crate::errors::StorageError;
use crate::schema::work_breaks;

const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = work_breaks)]
pub struct WorkBreakRow {
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

impl From<&WorkBreak> for WorkBreakRow {
    fn from(b: &WorkBreak) -> Self {
        Self {
            branch_id: b.branch_id.clone(),
            break_id: b.break_id.clone(),
            version: b.version,
            break_date: b.break_date,
            start_time: b.start_time.clone(),
            end_time: b.end_time.clone(),
            staff_id: b.staff_id.clone(),
            room_id: b.room_id.clone(),
            machine_id: b.machine_id.clone(),
            label: b.label.clone(),
            paid_break: b.paid_break,
        }
    }
}

#[derive(Clone)]
pub struct WorkBreakRepository {
    pool: PgPool,
    batch_size: usize,
}

impl WorkBreakRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    fn upsert_chunk(conn: &mut PgConnection, chunk: &[WorkBreakRow]) -> QueryResult<usize> {
        use crate::schema::work_breaks::dsl::*;

        diesel::insert_into(work_breaks)
            .values(chunk)
            .on_conflict((branch_id, break_id))
            .do_update()
            .set((
                version_gated!("work_breaks", break_date),
                version_gated!("work_breaks", start_time),
                version_gated!("work_breaks", end_time),
                version_gated!("work_breaks", staff_id),
                version_gated!("work_breaks", room_id),
                version_gated!("work_breaks", machine_id),
                version_gated!("work_breaks", label),
                version_gated!("work_breaks", paid_break),
                version_gated!("work_breaks", version),
                version_touch!("work_breaks", updated_at),
            ))
            .execute(conn)
    }
}

impl EntitySink<WorkBreak> for WorkBreakRepository {
    fn upsert_batch(&self, rows: &[WorkBreak]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mapped: Vec<WorkBreakRow> = rows.iter().map(WorkBreakRow::from).collect();
        let mut conn = get_connection(&self.pool)?;
        let mut affected = 0;
        for chunk in mapped.chunks(self.batch_size) {
            affected += Self::upsert_chunk(&mut conn, chunk).map_err(StorageError::from)?;
        }
        debug!(rows = rows.len(), "upserted break rows");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_is_gated_on_version() {
        use crate::schema::work_breaks::dsl::*;

        let row = WorkBreakRow::from(&WorkBreak {
            branch_id: "br-1".into(),
            break_id: "bk-1".into(),
            version: 3,
            ..WorkBreak::default()
        });
        let query = diesel::insert_into(work_breaks)
            .values(&row)
            .on_conflict((branch_id, break_id))
            .do_update()
            .set((
                version_gated!("work_breaks", start_time),
                version_gated!("work_breaks", version),
            ));
        let sql = diesel::debug_query::<diesel::pg::Pg, _>(&query).to_string();
        assert!(sql.contains("ON CONFLICT (\"branch_id\", \"break_id\")"));
        assert!(sql.contains(
            "CASE WHEN EXCLUDED.version >= work_breaks.version \
             THEN EXCLUDED.start_time ELSE work_breaks.start_time END"
        ));
    }
}
