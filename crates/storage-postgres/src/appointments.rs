//! Appointment repository: version-gated upsert keyed on
//! `(branch_id, appointment_id)`.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use tracing::debug;

use datahub_core::models::Appointment;
use datahub_core::sync::EntitySink;
use datahub_core::Result;

use crate::db::{get_connection, PgPool};
use crate::errors::StorageError;
use crate::schema::appointments;

const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = appointments)]
pub struct AppointmentRow {
    pub branch_id: String,
    pub appointment_id: String,
    pub version: i64,
    pub appointment_date: NaiveDate,
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
    pub online_service_categories: String,
    pub created_at_upstream: Option<DateTime<Utc>>,
    pub updated_at_upstream: Option<DateTime<Utc>>,
}

impl From<&Appointment> for AppointmentRow {
    fn from(a: &Appointment) -> Self {
        Self {
            branch_id: a.branch_id.clone(),
            appointment_id: a.appointment_id.clone(),
            version: a.version,
            appointment_date: a.appointment_date,
            start_time: a.start_time.clone(),
            end_time: a.end_time.clone(),
            price: a.price,
            deposit_amount: a.deposit_amount,
            deposit_datetime: a.deposit_datetime,
            staff_id: a.staff_id.clone(),
            confirmed: a.confirmed,
            service_id: a.service_id.clone(),
            service_name: a.service_name.clone(),
            service_reward_id: a.service_reward_id.clone(),
            staff_request: a.staff_request,
            preferred_staff: a.preferred_staff,
            client_id: a.client_id.clone(),
            purchasing_branch_id: a.purchasing_branch_id.clone(),
            state: a.state.clone(),
            activation_state: a.activation_state.clone(),
            booking_id: a.booking_id.clone(),
            source: a.source.clone(),
            deleted: a.deleted,
            online_service_categories: a.online_service_categories.clone(),
            created_at_upstream: a.created_at_upstream,
            updated_at_upstream: a.updated_at_upstream,
        }
    }
}

#[derive(Clone)]
pub struct AppointmentRepository {
    pool: PgPool,
    batch_size: usize,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    fn upsert_chunk(conn: &mut PgConnection, chunk: &[AppointmentRow]) -> QueryResult<usize> {
        use crate::schema::appointments::dsl::*;

        diesel::insert_into(appointments)
            .values(chunk)
            .on_conflict((branch_id, appointment_id))
            .do_update()
            .set((
                ts_gated!("appointments", version),
                ts_gated!("appointments", appointment_date),
                ts_gated!("appointments", start_time),
                ts_gated!("appointments", end_time),
                ts_gated!("appointments", price),
                ts_gated!("appointments", deposit_amount),
                ts_gated!("appointments", deposit_datetime),
                ts_gated!("appointments", staff_id),
                ts_gated!("appointments", confirmed),
                ts_gated!("appointments", service_id),
                ts_gated!("appointments", service_name),
                ts_gated!("appointments", service_reward_id),
                ts_gated!("appointments", staff_request),
                ts_gated!("appointments", preferred_staff),
                ts_gated!("appointments", client_id),
                ts_gated!("appointments", purchasing_branch_id),
                ts_gated!("appointments", state),
                ts_gated!("appointments", activation_state),
                ts_gated!("appointments", booking_id),
                ts_gated!("appointments", source),
                ts_gated!("appointments", deleted),
                ts_gated!("appointments", online_service_categories),
                keep_first!("appointments", created_at_upstream),
                newest_ts!("appointments", updated_at_upstream),
                ts_touch!("appointments", updated_at),
            ))
            .execute(conn)
    }
}

impl EntitySink<Appointment> for AppointmentRepository {
    fn upsert_batch(&self, rows: &[Appointment]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mapped: Vec<AppointmentRow> = rows.iter().map(AppointmentRow::from).collect();
        let mut conn = get_connection(&self.pool)?;
        let mut affected = 0;
        for chunk in mapped.chunks(self.batch_size) {
            affected += Self::upsert_chunk(&mut conn, chunk).map_err(StorageError::from)?;
        }
        debug!(rows = rows.len(), "upserted appointment rows");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_target_is_the_branch_scoped_identity() {
        use crate::schema::appointments::dsl::*;

        let row = AppointmentRow::from(&Appointment {
            branch_id: "br-1".into(),
            appointment_id: "apt-1".into(),
            ..Appointment::default()
        });
        let query = diesel::insert_into(appointments)
            .values(&row)
            .on_conflict((branch_id, appointment_id))
            .do_update()
            .set((
                ts_gated!("appointments", price),
                newest_ts!("appointments", updated_at_upstream),
            ));
        let sql = diesel::debug_query::<diesel::pg::Pg, _>(&query).to_string();
        assert!(sql.contains("ON CONFLICT (\"branch_id\", \"appointment_id\")"));
        assert!(sql.contains("THEN EXCLUDED.price ELSE appointments.price END"));
    }
}
