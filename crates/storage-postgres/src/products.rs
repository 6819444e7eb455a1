//! Product repository: version-gated upsert keyed on
//! `(branch_id, product_id)`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use tracing::debug;

use datahub_core::models::Product;
use datahub_core::sync::EntitySink;
use datahub_core::Result;

use crate::db::{get_connection, PgPool};
use crate::errors::StorageError;
use crate::schema::products;

const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = products)]
pub struct ProductRow {
    pub branch_id: String,
    pub product_id: String,
    pub version: i64,
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub category_id: String,
    pub price: Decimal,
    pub special_price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub archived: bool,
    pub created_at_upstream: Option<DateTime<Utc>>,
    pub updated_at_upstream: Option<DateTime<Utc>>,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            branch_id: p.branch_id.clone(),
            product_id: p.product_id.clone(),
            version: p.version,
            barcode: p.barcode.clone(),
            name: p.name.clone(),
            brand: p.brand.clone(),
            category_id: p.category_id.clone(),
            price: p.price,
            special_price: p.special_price,
            stock_quantity: p.stock_quantity,
            archived: p.archived,
            created_at_upstream: p.created_at_upstream,
            updated_at_upstream: p.updated_at_upstream,
        }
    }
}

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
    batch_size: usize,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    fn upsert_chunk(conn: &mut PgConnection, chunk: &[ProductRow]) -> QueryResult<usize> {
        use crate::schema::products::dsl::*;

        diesel::insert_into(products)
            .values(chunk)
            .on_conflict((branch_id, product_id))
            .do_update()
            .set((
                ts_gated!("products", version),
                ts_gated!("products", barcode),
                ts_gated!("products", name),
                ts_gated!("products", brand),
                ts_gated!("products", category_id),
                ts_gated!("products", price),
                ts_gated!("products", special_price),
                ts_gated!("products", stock_quantity),
                ts_gated!("products", archived),
                keep_first!("products", created_at_upstream),
                newest_ts!("products", updated_at_upstream),
                ts_touch!("products", updated_at),
            ))
            .execute(conn)
    }
}

impl EntitySink<Product> for ProductRepository {
    fn upsert_batch(&self, rows: &[Product]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mapped: Vec<ProductRow> = rows.iter().map(ProductRow::from).collect();
        let mut conn = get_connection(&self.pool)?;
        let mut affected = 0;
        for chunk in mapped.chunks(self.batch_size) {
            affected += Self::upsert_chunk(&mut conn, chunk).map_err(StorageError::from)?;
        }
        debug!(rows = rows.len(), "upserted product rows");
        Ok(affected)
    }
}
