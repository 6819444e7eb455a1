//! Client repository: version-gated upsert keyed on `client_id`.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use tracing::debug;

use datahub_core::models::Client;
use datahub_core::sync::EntitySink;
use datahub_core::Result;

use crate::db::{get_connection, PgPool};
use crate::errors::StorageError;
use crate::schema::clients;

const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = clients)]
pub struct ClientRow {
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
    pub deleted: bool,
    pub merged_to_client_id: String,
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

impl From<&Client> for ClientRow {
    fn from(c: &Client) -> Self {
        Self {
            client_id: c.client_id.clone(),
            version: c.version,
            first_name: c.first_name.clone(),
            last_name: c.last_name.clone(),
            mobile: c.mobile.clone(),
            linked_client_mobile: c.linked_client_mobile.clone(),
            land_line: c.land_line.clone(),
            email: c.email.clone(),
            street_address_1: c.street_address_1.clone(),
            street_address_2: c.street_address_2.clone(),
            city: c.city.clone(),
            state: c.state.clone(),
            postal_code: c.postal_code.clone(),
            country: c.country.clone(),
            birth_date: c.birth_date,
            client_since: c.client_since,
            gender: c.gender.clone(),
            notes: c.notes.clone(),
            sms_marketing_consent: c.sms_marketing_consent,
            email_marketing_consent: c.email_marketing_consent,
            sms_reminder_consent: c.sms_reminder_consent,
            email_reminder_consent: c.email_reminder_consent,
            preferred_staff_id: c.preferred_staff_id.clone(),
            external_id: c.external_id.clone(),
            creating_branch_id: c.creating_branch_id.clone(),
            archived: c.archived,
            banned: c.banned,
            deleted: c.deleted,
            merged_to_client_id: c.merged_to_client_id.clone(),
            client_category_ids: c.client_category_ids.clone(),
            first_visit: c.first_visit,
            last_visit: c.last_visit,
            photo_url: c.photo_url.clone(),
            loyalty_card_serial: c.loyalty_card_serial.clone(),
            loyalty_points: c.loyalty_points,
            credit_outstanding_balance: c.credit_outstanding_balance,
            credit_days: c.credit_days,
            credit_limit: c.credit_limit,
            created_at_upstream: c.created_at_upstream,
            updated_at_upstream: c.updated_at_upstream,
        }
    }
}

#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
    batch_size: usize,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    fn upsert_chunk(conn: &mut PgConnection, chunk: &[ClientRow]) -> QueryResult<usize> {
        use crate::schema::clients::dsl::*;

        diesel::insert_into(clients)
            .values(chunk)
            .on_conflict(client_id)
            .do_update()
            .set((
                ts_gated!("clients", version),
                ts_gated!("clients", first_name),
                ts_gated!("clients", last_name),
                ts_gated!("clients", mobile),
                ts_gated!("clients", linked_client_mobile),
                ts_gated!("clients", land_line),
                ts_gated!("clients", email),
                ts_gated!("clients", street_address_1),
                ts_gated!("clients", street_address_2),
                ts_gated!("clients", city),
                ts_gated!("clients", state),
                ts_gated!("clients", postal_code),
                ts_gated!("clients", country),
                ts_gated!("clients", birth_date),
                ts_gated!("clients", client_since),
                ts_gated!("clients", gender),
                ts_gated!("clients", notes),
                ts_gated!("clients", sms_marketing_consent),
                ts_gated!("clients", email_marketing_consent),
                ts_gated!("clients", sms_reminder_consent),
                ts_gated!("clients", email_reminder_consent),
                ts_gated!("clients", preferred_staff_id),
                ts_gated!("clients", external_id),
                ts_gated!("clients", creating_branch_id),
                ts_gated!("clients", archived),
                ts_gated!("clients", banned),
                ts_gated!("clients", deleted),
                ts_gated!("clients", merged_to_client_id),
                ts_gated!("clients", client_category_ids),
                ts_gated!("clients", first_visit),
                ts_gated!("clients", last_visit),
                ts_gated!("clients", photo_url),
                ts_gated!("clients", loyalty_card_serial),
                ts_gated!("clients", loyalty_points),
                ts_gated!("clients", credit_outstanding_balance),
                ts_gated!("clients", credit_days),
                ts_gated!("clients", credit_limit),
                keep_first!("clients", created_at_upstream),
                newest_ts!("clients", updated_at_upstream),
                ts_touch!("clients", updated_at),
            ))
            .execute(conn)
    }
}

impl EntitySink<Client> for ClientRepository {
    fn upsert_batch(&self, rows: &[Client]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mapped: Vec<ClientRow> = rows.iter().map(ClientRow::from).collect();
        let mut conn = get_connection(&self.pool)?;
        let mut affected = 0;
        for chunk in mapped.chunks(self.batch_size) {
            affected += Self::upsert_chunk(&mut conn, chunk).map_err(StorageError::from)?;
        }
        debug!(rows = rows.len(), "upserted client rows");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_is_gated_on_the_upstream_timestamp() {
        use crate::schema::clients::dsl::*;

        let row = ClientRow::from(&Client {
            client_id: "cl-1".into(),
            ..Client::default()
        });
        let query = diesel::insert_into(clients)
            .values(&row)
            .on_conflict(client_id)
            .do_update()
            .set((
                ts_gated!("clients", first_name),
                keep_first!("clients", created_at_upstream),
                newest_ts!("clients", updated_at_upstream),
                ts_touch!("clients", updated_at),
            ));
        let sql = diesel::debug_query::<diesel::pg::Pg, _>(&query).to_string();

        assert!(sql.contains("ON CONFLICT (\"client_id\")"));
        assert!(sql.contains(
            "CASE WHEN EXCLUDED.updated_at_upstream > clients.updated_at_upstream \
             OR clients.updated_at_upstream IS NULL THEN EXCLUDED.first_name \
             ELSE clients.first_name END"
        ));
        assert!(sql.contains("CASE WHEN clients.created_at_upstream IS NULL"));
        assert!(sql.contains("GREATEST(clients.updated_at_upstream, EXCLUDED.updated_at_upstream)"));
    }

    #[test]
    fn domain_rows_map_field_for_field() {
        let client = Client {
            client_id: "cl-9".into(),
            version: 4,
            first_name: "Ada".into(),
            client_category_ids: "vip,colour".into(),
            credit_days: Some(30),
            ..Client::default()
        };
        let row = ClientRow::from(&client);
        assert_eq!(row.client_id, "cl-9");
        assert_eq!(row.version, 4);
        assert_eq!(row.first_name, "Ada");
        assert_eq!(row.client_category_ids, "vip,colour");
        assert_eq!(row.credit_days, Some(30));
        assert_eq!(row.updated_at_upstream, None);
    }
}
