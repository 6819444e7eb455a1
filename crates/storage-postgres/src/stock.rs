//! Reconcile store: fetch of unprocessed purchasing-branch sale items and
//! the exactly-once processing markers (transfers and exceptions).

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Nullable, Text, Timestamptz};
use tracing::debug;

use datahub_core::reconcile::{ExceptionReason, ReconcileStore, SaleItem, StockTransfer};
use datahub_core::{Error, Result};

use crate::db::{get_connection, PgPool};
use crate::errors::StorageError;
use crate::schema::{stock_virtual_transfer_exceptions, stock_virtual_transfers};

/// Items at the purchasing branch that have neither a transfer nor an
/// exception recorded yet, oldest upstream mutation first. `$5 = ''`
/// disables the test-barcode restriction.
const FETCH_UNPROCESSED_SQL: &str = "\
SELECT
  ti.transaction_item_id,
  COALESCE(ti.product_barcode, '') AS barcode,
  ti.quantity::int4 AS quantity,
  ti.staff_id,
  spbo.physical_branch_id,
  ti.updated_at_upstream,
  (t.purchased_date + COALESCE(t.purchase_time, '00:00:00')::time) AT TIME ZONE 'UTC' AS purchased_at
FROM transactions t
JOIN transaction_items ti ON ti.transaction_id = t.transaction_id
LEFT JOIN staff_physical_branch_overrides spbo
  ON spbo.staff_id = ti.staff_id AND spbo.active = TRUE
WHERE t.branch_id = $1
  AND ti.quantity > 0
  AND ti.updated_at_upstream >= $2
  AND ti.updated_at_upstream <  $3
  AND ($5 = '' OR ti.product_barcode = $5)
  AND NOT EXISTS (
    SELECT 1 FROM stock_virtual_transfers svt
    WHERE svt.transaction_item_id = ti.transaction_item_id
  )
  AND NOT EXISTS (
    SELECT 1 FROM stock_virtual_transfer_exceptions svte
    WHERE svte.transaction_item_id = ti.transaction_item_id
  )
ORDER BY ti.updated_at_upstream ASC
LIMIT $4";

#[derive(QueryableByName)]
struct UnprocessedRow {
    #[diesel(sql_type = Text)]
    transaction_item_id: String,
    #[diesel(sql_type = Text)]
    barcode: String,
    #[diesel(sql_type = Integer)]
    quantity: i32,
    #[diesel(sql_type = Text)]
    staff_id: String,
    #[diesel(sql_type = Nullable<Text>)]
    physical_branch_id: Option<String>,
    #[diesel(sql_type = Timestamptz)]
    updated_at_upstream: DateTime<Utc>,
    #[diesel(sql_type = Nullable<Timestamptz>)]
    purchased_at: Option<DateTime<Utc>>,
}

impl From<UnprocessedRow> for SaleItem {
    fn from(row: UnprocessedRow) -> Self {
        SaleItem {
            transaction_item_id: row.transaction_item_id,
            barcode: row.barcode,
            quantity: row.quantity,
            staff_id: row.staff_id,
            physical_branch_id: row.physical_branch_id,
            updated_at_upstream: row.updated_at_upstream,
            purchased_at: row.purchased_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = stock_virtual_transfers)]
struct NewTransferRow<'a> {
    transaction_item_id: &'a str,
    from_branch_id: &'a str,
    to_branch_id: &'a str,
    barcode: &'a str,
    quantity: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = stock_virtual_transfer_exceptions)]
struct NewExceptionRow<'a> {
    transaction_item_id: &'a str,
    reason: &'a str,
    purchased_at: Option<DateTime<Utc>>,
    product_barcode: Option<&'a str>,
    staff_id: &'a str,
}

#[derive(Clone)]
pub struct StockReconcileRepository {
    pool: PgPool,
}

impl StockReconcileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ReconcileStore for StockReconcileRepository {
    fn fetch_unprocessed(
        &self,
        pk_branch_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
        test_barcode: Option<&str>,
    ) -> Result<Vec<SaleItem>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = diesel::sql_query(FETCH_UNPROCESSED_SQL)
            .bind::<Text, _>(pk_branch_id)
            .bind::<Timestamptz, _>(from)
            .bind::<Timestamptz, _>(to)
            .bind::<BigInt, _>(limit)
            .bind::<Text, _>(test_barcode.unwrap_or(""))
            .load::<UnprocessedRow>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(SaleItem::from).collect())
    }

    fn insert_exceptions(&self, items: &[SaleItem], reason: ExceptionReason) -> Result<usize> {
        if items.is_empty() {
            return Ok(0);
        }
        let mut conn = get_connection(&self.pool)?;
        let inserted = conn
            .transaction::<usize, StorageError, _>(|conn| {
                use crate::schema::stock_virtual_transfer_exceptions::dsl;

                let mut inserted = 0;
                for item in items {
                    let row = NewExceptionRow {
                        transaction_item_id: &item.transaction_item_id,
                        reason: reason.as_str(),
                        purchased_at: item.purchased_at,
                        product_barcode: Some(item.barcode.as_str())
                            .filter(|b| !b.trim().is_empty()),
                        staff_id: &item.staff_id,
                    };
                    inserted += diesel::insert_into(dsl::stock_virtual_transfer_exceptions)
                        .values(&row)
                        .on_conflict(dsl::transaction_item_id)
                        .do_nothing()
                        .execute(conn)?;
                }
                Ok(inserted)
            })
            .map_err(Error::from)?;
        debug!(count = inserted, reason = reason.as_str(), "recorded exceptions");
        Ok(inserted)
    }

    fn insert_transfers(&self, transfers: &[StockTransfer]) -> Result<usize> {
        if transfers.is_empty() {
            return Ok(0);
        }
        for t in transfers {
            if t.from_branch_id.is_empty()
                || t.to_branch_id.is_empty()
                || t.barcode.is_empty()
                || t.quantity <= 0
            {
                return Err(Error::Invariant(format!(
                    "invalid transfer row for item {}",
                    t.transaction_item_id
                )));
            }
        }

        let mut conn = get_connection(&self.pool)?;
        let inserted = conn
            .transaction::<usize, StorageError, _>(|conn| {
                use crate::schema::stock_virtual_transfers::dsl;

                let mut inserted = 0;
                for t in transfers {
                    let row = NewTransferRow {
                        transaction_item_id: &t.transaction_item_id,
                        from_branch_id: &t.from_branch_id,
                        to_branch_id: &t.to_branch_id,
                        barcode: &t.barcode,
                        quantity: t.quantity,
                    };
                    inserted += diesel::insert_into(dsl::stock_virtual_transfers)
                        .values(&row)
                        .on_conflict(dsl::transaction_item_id)
                        .do_nothing()
                        .execute(conn)?;
                }
                Ok(inserted)
            })
            .map_err(Error::from)?;
        debug!(count = inserted, "recorded stock transfers");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_excludes_already_processed_items() {
        assert!(FETCH_UNPROCESSED_SQL.contains("NOT EXISTS"));
        assert!(FETCH_UNPROCESSED_SQL.contains("stock_virtual_transfers"));
        assert!(FETCH_UNPROCESSED_SQL.contains("stock_virtual_transfer_exceptions"));
        assert!(FETCH_UNPROCESSED_SQL.contains("ORDER BY ti.updated_at_upstream ASC"));
        assert!(FETCH_UNPROCESSED_SQL.contains("spbo.active = TRUE"));
    }

    #[test]
    fn invalid_transfer_rows_are_rejected_before_touching_the_pool() {
        // build_unchecked creates the pool without opening a connection, so
        // the validation path can be exercised without a database.
        let manager =
            diesel::r2d2::ConnectionManager::<PgConnection>::new("postgres://unused/unused");
        let pool = diesel::r2d2::Pool::builder().build_unchecked(manager);
        let repo = StockReconcileRepository::new(pool);

        let bad = StockTransfer {
            transaction_item_id: "ti-1".into(),
            from_branch_id: String::new(),
            to_branch_id: "PK".into(),
            barcode: "111".into(),
            quantity: 1,
        };
        let err = repo.insert_transfers(&[bad]).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }
}
