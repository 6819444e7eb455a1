//! Work-timetable slot repository: transactional window-replace.
//!
//! Slots have no stable upstream identity, so the provider's answer for a
//! window is treated as the authoritative snapshot: delete everything in
//! the window, insert what came back, commit. A slot that disappeared
//! upstream disappears locally.

use chrono::NaiveDate;
use diesel::prelude::*;
use tracing::debug;

use datahub_core::models::TimetableSlot;
use datahub_core::sync::{DateWindow, WindowReplaceSink};
use datahub_core::Result;

use crate::db::{get_connection, PgPool};
use crate::errors::StorageError;
use crate::schema::staff_worktimetable_slots;

const DEFAULT_BATCH_SIZE: usize = 2000;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = staff_worktimetable_slots)]
pub struct TimetableSlotRow {
    pub branch_id: String,
    pub staff_id: String,
    pub slot_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub time_off_start_time: Option<String>,
    pub time_off_end_time: Option<String>,
    pub slot_type: String,
    pub custom: Option<String>,
    pub slot_branch_id: Option<String>,
    pub work_activity_id: Option<String>,
}

impl From<&TimetableSlot> for TimetableSlotRow {
    fn from(s: &TimetableSlot) -> Self {
        Self {
            branch_id: s.branch_id.clone(),
            staff_id: s.staff_id.clone(),
            slot_date: s.slot_date,
            start_time: s.start_time.clone(),
            end_time: s.end_time.clone(),
            time_off_start_time: s.time_off_start_time.clone(),
            time_off_end_time: s.time_off_end_time.clone(),
            slot_type: s.slot_type.clone(),
            custom: s.custom.clone(),
            slot_branch_id: s.slot_branch_id.clone(),
            work_activity_id: s.work_activity_id.clone(),
        }
    }
}

#[derive(Clone)]
pub struct TimetableRepository {
    pool: PgPool,
    batch_size: usize,
}

impl TimetableRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl WindowReplaceSink<TimetableSlot> for TimetableRepository {
    fn replace_window(
        &self,
        branch: &str,
        window: DateWindow,
        rows: &[TimetableSlot],
    ) -> Result<usize> {
        use crate::schema::staff_worktimetable_slots::dsl::*;

        let mapped: Vec<TimetableSlotRow> = rows.iter().map(TimetableSlotRow::from).collect();
        let mut conn = get_connection(&self.pool)?;

        let inserted = conn
            .transaction::<usize, StorageError, _>(|conn| {
                diesel::delete(
                    staff_worktimetable_slots
                        .filter(branch_id.eq(branch))
                        .filter(slot_date.between(window.from, window.to)),
                )
                .execute(conn)?;

                let mut inserted = 0;
                for chunk in mapped.chunks(self.batch_size) {
                    inserted += diesel::insert_into(staff_worktimetable_slots)
                        .values(chunk)
                        .execute(conn)?;
                }
                Ok(inserted)
            })
            .map_err(datahub_core::Error::from)?;

        debug!(
            branch,
            from = %window.from,
            to = %window.to,
            slots = inserted,
            "replaced timetable window"
        );
        Ok(inserted)
    }
}
