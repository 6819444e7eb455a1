use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::sync::UpstreamTimestamped;

/// A retail product as stocked at one branch. Identity is
/// `(branch_id, product_id)`; the barcode is what the stock reconciliation
/// engine keys adjustments on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Product {
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

impl UpstreamTimestamped for Product {
    fn updated_at_upstream(&self) -> Option<DateTime<Utc>> {
        self.updated_at_upstream
    }
}
