//! Staff repository: version-gated upsert keyed on `(branch_id, staff_id)`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::debug;

use datahub_core::models::StaffMember;
use datahub_core::sync::EntitySink;
use datahub_core::Result;

use crate::db::{get_connection, PgPool};
use crate::errors::StorageError;
use crate::schema::staff;

const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = staff)]
pub struct StaffRow {
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

impl From<&StaffMember> for StaffRow {
    fn from(s: &StaffMember) -> Self {
        Self {
            branch_id: s.branch_id.clone(),
            staff_id: s.staff_id.clone(),
            version: s.version,
            first_name: s.first_name.clone(),
            last_name: s.last_name.clone(),
            email: s.email.clone(),
            mobile: s.mobile.clone(),
            staff_category_id: s.staff_category_id.clone(),
            self_employed: s.self_employed,
            hide_from_online_bookings: s.hide_from_online_bookings,
            archived: s.archived,
            created_at_upstream: s.created_at_upstream,
            updated_at_upstream: s.updated_at_upstream,
        }
    }
}

#[derive(Clone)]
pub struct StaffRepository {
    pool: PgPool,
    batch_size: usize,
}

impl StaffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    fn upsert_chunk(conn: &mut PgConnection, chunk: &[StaffRow]) -> QueryResult<usize> {
        use crate::schema::staff::dsl::*;

        diesel::insert_into(staff)
            .values(chunk)
            .on_conflict((branch_id, staff_id))
            .do_update()
            .set((
                ts_gated!("staff", version),
                ts_gated!("staff", first_name),
                ts_gated!("staff", last_name),
                ts_gated!("staff", email),
                ts_gated!("staff", mobile),
                ts_gated!("staff", staff_category_id),
                ts_gated!("staff", self_employed),
                ts_gated!("staff", hide_from_online_bookings),
                ts_gated!("staff", archived),
                keep_first!("staff", created_at_upstream),
                newest_ts!("staff", updated_at_upstream),
                ts_touch!("staff", updated_at),
            ))
            .execute(conn)
    }
}

impl EntitySink<StaffMember> for StaffRepository {
    fn upsert_batch(&self, rows: &[StaffMember]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mapped: Vec<StaffRow> = rows.iter().map(StaffRow::from).collect();
        let mut conn = get_connection(&self.pool)?;
        let mut affected = 0;
        for chunk in mapped.chunks(self.batch_size) {
            affected += Self::upsert_chunk(&mut conn, chunk).map_err(StorageError::from)?;
        }
        debug!(rows = rows.len(), "upserted staff rows");
        Ok(affected)
    }
}
