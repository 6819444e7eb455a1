//! Stock reconciliation: re-homes the stock deduction of purchasing-branch
//! sales to the selling staff member's physical branch.
//!
//! The pure pieces live here (classification, aggregation, payload
//! building); [`engine`] drives batches against the trait seams.

mod engine;

pub use engine::{run_reconcile, ReconcileParams, ReconcileSummary};

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::Result;

/// An unprocessed sale line item at the purchasing branch, joined to the
/// staff member's physical-branch override (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct SaleItem {
    pub transaction_item_id: String,
    pub barcode: String,
    pub quantity: i32,
    pub staff_id: String,
    pub physical_branch_id: Option<String>,
    pub updated_at_upstream: DateTime<Utc>,
    pub purchased_at: Option<DateTime<Utc>>,
}

/// Why an item could not be processed. Stored verbatim in the exceptions
/// table and consulted on every later fetch, so an item is only ever looked
/// at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionReason {
    MissingBarcode,
    UnmappedStaff,
}

impl ExceptionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingBarcode => "MISSING_BARCODE",
            Self::UnmappedStaff => "UNMAPPED_STAFF",
        }
    }
}

/// The accounting record that a processed item produced: a DEDUCT at the
/// staff member's physical branch and an INCREASE back at the purchasing
/// branch.
#[derive(Debug, Clone, PartialEq)]
pub struct StockTransfer {
    pub transaction_item_id: String,
    pub from_branch_id: String,
    pub to_branch_id: String,
    pub barcode: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Deduct,
    Increase,
}

/// One line of an adjustment request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustmentLine {
    pub barcode: String,
    pub quantity: i32,
    pub operation_type: OperationType,
}

/// Body of `POST /branch/{branch}/stock/adjustment`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockAdjustmentRequest {
    pub stocks: Vec<StockAdjustmentLine>,
}

impl StockAdjustmentRequest {
    pub fn lines(&self) -> usize {
        self.stocks.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.stocks.iter().map(|s| i64::from(s.quantity)).sum()
    }
}

/// An adjustment request addressed to one branch.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchPayload {
    pub branch_id: String,
    pub request: StockAdjustmentRequest,
}

/// Warehouse access for the engine. Every insert is
/// `ON CONFLICT DO NOTHING` on `transaction_item_id`, which is what makes
/// re-processing after a crash harmless.
pub trait ReconcileStore: Send + Sync {
    /// Unprocessed items at the purchasing branch in ascending upstream
    /// mutation order, excluding anything already recorded as a transfer or
    /// an exception.
    fn fetch_unprocessed(
        &self,
        pk_branch_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: i64,
        test_barcode: Option<&str>,
    ) -> Result<Vec<SaleItem>>;

    fn insert_exceptions(&self, items: &[SaleItem], reason: ExceptionReason) -> Result<usize>;

    fn insert_transfers(&self, transfers: &[StockTransfer]) -> Result<usize>;
}

/// The upstream stock-adjustment endpoint. Must be idempotent on the
/// provider side: a crash between POST and the local transfer insert makes
/// the engine re-send the same adjustments on its next run.
#[async_trait]
pub trait StockAdjuster: Send + Sync {
    async fn adjust_stock(&self, branch_id: &str, request: &StockAdjustmentRequest) -> Result<()>;
}

/// A batch split three ways. Classification is purely local and therefore
/// recomputes identically after a crash.
#[derive(Debug, Default, Clone)]
pub struct Classified {
    pub mapped: Vec<SaleItem>,
    pub unmapped_staff: Vec<SaleItem>,
    pub missing_barcode: Vec<SaleItem>,
}

/// Split items into {missing barcode, unmapped staff, mapped}, in that
/// order of precedence: an item without a barcode can never be adjusted
/// upstream, whatever its staff mapping says.
pub fn classify(items: Vec<SaleItem>) -> Classified {
    let mut out = Classified::default();
    for item in items {
        if item.barcode.trim().is_empty() {
            out.missing_barcode.push(item);
        } else if item
            .physical_branch_id
            .as_deref()
            .map_or(true, |b| b.trim().is_empty())
        {
            out.unmapped_staff.push(item);
        } else {
            out.mapped.push(item);
        }
    }
    out
}

/// Aggregated quantities for one batch of mapped items. `BTreeMap` keeps
/// branches and barcodes sorted so payloads come out deterministic.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Aggregates {
    /// physical branch -> barcode -> quantity to deduct there
    pub deduct: BTreeMap<String, BTreeMap<String, i32>>,
    /// barcode -> quantity to increase at the purchasing branch
    pub increase: BTreeMap<String, i32>,
}

pub fn aggregate(mapped: &[SaleItem]) -> Aggregates {
    let mut agg = Aggregates::default();
    for item in mapped {
        let branch = item
            .physical_branch_id
            .clone()
            .unwrap_or_default();
        *agg.deduct
            .entry(branch)
            .or_default()
            .entry(item.barcode.clone())
            .or_insert(0) += item.quantity;
        *agg.increase.entry(item.barcode.clone()).or_insert(0) += item.quantity;
    }
    agg
}

/// Build one adjustment request from a barcode aggregate. Lines are in
/// ascending barcode order; non-positive aggregates are dropped.
pub fn build_request(agg: &BTreeMap<String, i32>, op: OperationType) -> StockAdjustmentRequest {
    let stocks = agg
        .iter()
        .filter(|(_, &qty)| qty > 0)
        .map(|(barcode, &quantity)| StockAdjustmentLine {
            barcode: barcode.clone(),
            quantity,
            operation_type: op,
        })
        .collect();
    StockAdjustmentRequest { stocks }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn item(id: &str, barcode: &str, qty: i32, physical: Option<&str>) -> SaleItem {
        SaleItem {
            transaction_item_id: id.to_string(),
            barcode: barcode.to_string(),
            quantity: qty,
            staff_id: format!("staff-{id}"),
            physical_branch_id: physical.map(str::to_string),
            updated_at_upstream: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            purchased_at: None,
        }
    }

    #[test]
    fn classification_splits_three_ways() {
        let classified = classify(vec![
            item("1", "111", 1, Some("B2")),
            item("2", "", 1, Some("B2")),
            item("3", "333", 1, None),
            item("4", "   ", 1, None),
            item("5", "555", 2, Some("B3")),
        ]);
        assert_eq!(classified.mapped.len(), 2);
        assert_eq!(classified.unmapped_staff.len(), 1);
        assert_eq!(classified.missing_barcode.len(), 2);
    }

    #[test]
    fn missing_barcode_wins_over_unmapped_staff() {
        // No barcode and no mapping: the barcode is the blocking problem.
        let classified = classify(vec![item("1", "", 1, None)]);
        assert_eq!(classified.missing_barcode.len(), 1);
        assert!(classified.unmapped_staff.is_empty());
    }

    #[test]
    fn blank_physical_branch_counts_as_unmapped() {
        let classified = classify(vec![item("1", "111", 1, Some("  "))]);
        assert_eq!(classified.unmapped_staff.len(), 1);
    }

    #[test]
    fn aggregation_sums_per_branch_and_overall() {
        let agg = aggregate(&[
            item("1", "111", 2, Some("B2")),
            item("2", "111", 3, Some("B2")),
            item("3", "111", 1, Some("B3")),
            item("4", "222", 4, Some("B3")),
        ]);
        assert_eq!(agg.deduct["B2"]["111"], 5);
        assert_eq!(agg.deduct["B3"]["111"], 1);
        assert_eq!(agg.deduct["B3"]["222"], 4);
        assert_eq!(agg.increase["111"], 6);
        assert_eq!(agg.increase["222"], 4);
    }

    #[test]
    fn requests_come_out_sorted_and_positive() {
        let mut agg = BTreeMap::new();
        agg.insert("999".to_string(), 1);
        agg.insert("111".to_string(), 2);
        agg.insert("555".to_string(), 0);
        let req = build_request(&agg, OperationType::Deduct);
        let barcodes: Vec<&str> = req.stocks.iter().map(|s| s.barcode.as_str()).collect();
        assert_eq!(barcodes, vec!["111", "999"]);
        assert_eq!(req.total_quantity(), 3);
    }

    #[test]
    fn adjustment_request_serializes_to_the_wire_shape() {
        let req = StockAdjustmentRequest {
            stocks: vec![StockAdjustmentLine {
                barcode: "5011417559744".to_string(),
                quantity: 3,
                operation_type: OperationType::Deduct,
            }],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "stocks": [
                    {"barcode": "5011417559744", "quantity": 3, "operationType": "DEDUCT"}
                ]
            })
        );
    }
}
