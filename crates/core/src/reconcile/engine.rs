//! Batch driver for stock reconciliation.
//!
//! Dry-run and live share one code path up to the payload-build step; a
//! single late branch decides whether to POST and record transfers.
//! Exceptions are always recorded before any network side effect, so a
//! mid-batch crash cannot lose an item's unprocessed status.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{Error, Result};

use super::{
    aggregate, build_request, classify, BranchPayload, ExceptionReason, OperationType,
    ReconcileStore, SaleItem, StockAdjuster, StockTransfer,
};

#[derive(Debug, Clone)]
pub struct ReconcileParams {
    /// The purchasing branch whose sale items are being re-homed.
    pub pk_branch_id: String,
    /// Dry-run logs payloads and records exceptions, then stops after one
    /// batch; it never POSTs and never records transfers.
    pub dry_run: bool,
    pub from_ts: DateTime<Utc>,
    pub to_ts: DateTime<Utc>,
    pub limit: i64,
    /// Restrict the run to a single barcode, for controlled live tests.
    pub test_barcode: Option<String>,
    /// How many payload lines to echo into the log per request.
    pub max_preview: usize,
    pub print_json: bool,
}

impl ReconcileParams {
    pub const DEFAULT_LIMIT: i64 = 500;
    pub const DEFAULT_MAX_PREVIEW: usize = 25;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub batches: usize,
    pub rows: usize,
    pub mapped: usize,
    pub unmapped_staff: usize,
    pub missing_barcode: usize,
    pub transfers: usize,
    pub exceptions: usize,
}

/// Run reconciliation batches until the fetch comes back empty (or, in
/// dry-run, after exactly one batch).
pub async fn run_reconcile(
    store: &dyn ReconcileStore,
    adjuster: Option<&dyn StockAdjuster>,
    params: &ReconcileParams,
    cancel: &CancellationToken,
) -> Result<ReconcileSummary> {
    if params.pk_branch_id.trim().is_empty() {
        return Err(Error::config("reconcile: purchasing branch id is required"));
    }
    let limit = if params.limit > 0 {
        params.limit
    } else {
        ReconcileParams::DEFAULT_LIMIT
    };
    let max_preview = if params.max_preview > 0 {
        params.max_preview
    } else {
        ReconcileParams::DEFAULT_MAX_PREVIEW
    };

    let mut summary = ReconcileSummary::default();

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let rows = store.fetch_unprocessed(
            &params.pk_branch_id,
            params.from_ts,
            params.to_ts,
            limit,
            params.test_barcode.as_deref(),
        )?;

        if rows.is_empty() {
            if summary.batches == 0 {
                info!(dry_run = params.dry_run, "reconcile: no rows to process");
            } else {
                info!(
                    batches = summary.batches,
                    rows = summary.rows,
                    mapped = summary.mapped,
                    unmapped_staff = summary.unmapped_staff,
                    missing_barcode = summary.missing_barcode,
                    transfers = summary.transfers,
                    exceptions = summary.exceptions,
                    "reconcile: done"
                );
            }
            return Ok(summary);
        }

        summary.batches += 1;
        summary.rows += rows.len();

        let classified = classify(rows);
        summary.mapped += classified.mapped.len();
        summary.unmapped_staff += classified.unmapped_staff.len();
        summary.missing_barcode += classified.missing_barcode.len();

        info!(
            batch = summary.batches,
            dry_run = params.dry_run,
            from = %params.from_ts.to_rfc3339(),
            to = %params.to_ts.to_rfc3339(),
            limit,
            rows = classified.mapped.len()
                + classified.unmapped_staff.len()
                + classified.missing_barcode.len(),
            mapped = classified.mapped.len(),
            unmapped_staff = classified.unmapped_staff.len(),
            missing_barcode = classified.missing_barcode.len(),
            "reconcile: batch"
        );

        // Exceptions first, before any network side effects.
        if !classified.missing_barcode.is_empty() {
            preview_exceptions(&classified.missing_barcode, "missing barcode", max_preview);
            summary.exceptions +=
                store.insert_exceptions(&classified.missing_barcode, ExceptionReason::MissingBarcode)?;
        }
        if !classified.unmapped_staff.is_empty() {
            preview_exceptions(
                &classified.unmapped_staff,
                "no active physical-branch override",
                max_preview,
            );
            summary.exceptions +=
                store.insert_exceptions(&classified.unmapped_staff, ExceptionReason::UnmappedStaff)?;
        }

        let agg = aggregate(&classified.mapped);
        let deduct_payloads: Vec<BranchPayload> = agg
            .deduct
            .iter()
            .map(|(branch_id, by_barcode)| BranchPayload {
                branch_id: branch_id.clone(),
                request: build_request(by_barcode, OperationType::Deduct),
            })
            .collect();
        let increase = BranchPayload {
            branch_id: params.pk_branch_id.clone(),
            request: build_request(&agg.increase, OperationType::Increase),
        };

        for payload in &deduct_payloads {
            preview_payload("DEDUCT", payload, max_preview, params.print_json);
        }
        preview_payload("INCREASE", &increase, max_preview, params.print_json);

        if params.dry_run {
            // Without transfer marks the same rows would come back forever.
            info!("reconcile: dry-run, stopping after one batch (no transfers recorded)");
            return Ok(summary);
        }

        let adjuster =
            adjuster.ok_or_else(|| Error::config("refusing live reconcile: no stock adjuster"))?;

        for payload in &deduct_payloads {
            if payload.request.stocks.is_empty() {
                continue;
            }
            info!(
                branch = %payload.branch_id,
                lines = payload.request.lines(),
                "reconcile: POST DEDUCT"
            );
            adjuster
                .adjust_stock(&payload.branch_id, &payload.request)
                .await?;
        }

        if !increase.request.stocks.is_empty() {
            info!(
                branch = %increase.branch_id,
                lines = increase.request.lines(),
                "reconcile: POST INCREASE"
            );
            adjuster
                .adjust_stock(&increase.branch_id, &increase.request)
                .await?;
        }

        let transfers: Vec<StockTransfer> = classified
            .mapped
            .iter()
            .map(|item| StockTransfer {
                transaction_item_id: item.transaction_item_id.clone(),
                from_branch_id: item.physical_branch_id.clone().unwrap_or_default(),
                to_branch_id: params.pk_branch_id.clone(),
                barcode: item.barcode.clone(),
                quantity: item.quantity,
            })
            .collect();

        summary.transfers += store.insert_transfers(&transfers)?;
        info!(
            batch = summary.batches,
            transfers = transfers.len(),
            "reconcile: live batch complete"
        );
        // Next fetch excludes everything just recorded.
    }
}

fn preview_exceptions(items: &[SaleItem], why: &str, max_preview: usize) {
    warn!(count = items.len(), why, "reconcile: recording exceptions");
    for item in items.iter().take(max_preview) {
        debug!(
            item_id = %item.transaction_item_id,
            barcode = %item.barcode,
            qty = item.quantity,
            staff_id = %item.staff_id,
            updated_at_upstream = %item.updated_at_upstream.to_rfc3339(),
            "reconcile: exception row"
        );
    }
    if items.len() > max_preview {
        debug!(more = items.len() - max_preview, "reconcile: preview truncated");
    }
}

fn preview_payload(op: &str, payload: &BranchPayload, max_preview: usize, print_json: bool) {
    info!(
        op,
        branch = %payload.branch_id,
        lines = payload.request.lines(),
        total_qty = payload.request.total_quantity(),
        "reconcile: payload"
    );
    for line in payload.request.stocks.iter().take(max_preview) {
        debug!(op, barcode = %line.barcode, qty = line.quantity, "reconcile: payload line");
    }
    if payload.request.stocks.len() > max_preview {
        debug!(
            more = payload.request.stocks.len() - max_preview,
            "reconcile: preview truncated"
        );
    }
    if print_json {
        match serde_json::to_string_pretty(&payload.request) {
            Ok(body) => info!(op, branch = %payload.branch_id, %body, "reconcile: payload json"),
            Err(err) => warn!(op, %err, "reconcile: payload json marshal failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::super::StockAdjustmentRequest;
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

    fn params(dry_run: bool) -> ReconcileParams {
        ReconcileParams {
            pk_branch_id: "PK".to_string(),
            dry_run,
            from_ts: Utc.timestamp_opt(0, 0).unwrap(),
            to_ts: Utc.timestamp_opt(2_000_000_000, 0).unwrap(),
            limit: 500,
            test_barcode: None,
            max_preview: 25,
            print_json: false,
        }
    }

    #[derive(Default)]
    struct ScriptedStore {
        batches: Mutex<Vec<Vec<SaleItem>>>,
        exceptions: Mutex<Vec<(String, &'static str)>>,
        transfers: Mutex<Vec<StockTransfer>>,
        fetches: Mutex<usize>,
    }

    impl ScriptedStore {
        fn new(mut batches: Vec<Vec<SaleItem>>) -> Self {
            batches.reverse();
            Self {
                batches: Mutex::new(batches),
                ..Self::default()
            }
        }
    }

    impl ReconcileStore for ScriptedStore {
        fn fetch_unprocessed(
            &self,
            _pk_branch_id: &str,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
            _limit: i64,
            _test_barcode: Option<&str>,
        ) -> Result<Vec<SaleItem>> {
            *self.fetches.lock().unwrap() += 1;
            Ok(self.batches.lock().unwrap().pop().unwrap_or_default())
        }

        fn insert_exceptions(&self, items: &[SaleItem], reason: ExceptionReason) -> Result<usize> {
            let mut log = self.exceptions.lock().unwrap();
            for i in items {
                log.push((i.transaction_item_id.clone(), reason.as_str()));
            }
            Ok(items.len())
        }

        fn insert_transfers(&self, transfers: &[StockTransfer]) -> Result<usize> {
            self.transfers.lock().unwrap().extend_from_slice(transfers);
            Ok(transfers.len())
        }
    }

    #[derive(Default)]
    struct RecordingAdjuster {
        posts: Mutex<Vec<(String, StockAdjustmentRequest)>>,
        fail: bool,
    }

    #[async_trait]
    impl StockAdjuster for RecordingAdjuster {
        async fn adjust_stock(
            &self,
            branch_id: &str,
            request: &StockAdjustmentRequest,
        ) -> Result<()> {
            if self.fail {
                return Err(Error::HttpStatus {
                    status: 500,
                    body: "boom".into(),
                });
            }
            self.posts
                .lock()
                .unwrap()
                .push((branch_id.to_string(), request.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn dry_run_records_exceptions_and_stops_after_one_batch() {
        let store = ScriptedStore::new(vec![
            vec![
                item("m1", "111", 1, Some("B2")),
                item("m2", "222", 2, Some("B3")),
                item("u1", "333", 1, None),
                item("u2", "444", 1, None),
                item("x1", "", 1, Some("B2")),
            ],
            // A second batch exists but must never be fetched in dry-run.
            vec![item("m3", "555", 1, Some("B2"))],
        ]);

        let summary = run_reconcile(&store, None, &params(true), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.batches, 1);
        assert_eq!(summary.mapped, 2);
        assert_eq!(summary.unmapped_staff, 2);
        assert_eq!(summary.missing_barcode, 1);
        assert_eq!(summary.exceptions, 3);
        assert_eq!(summary.transfers, 0);
        assert_eq!(*store.fetches.lock().unwrap(), 1);

        let exceptions = store.exceptions.lock().unwrap().clone();
        assert!(exceptions.contains(&("x1".to_string(), "MISSING_BARCODE")));
        assert!(exceptions.contains(&("u1".to_string(), "UNMAPPED_STAFF")));
        assert!(exceptions.contains(&("u2".to_string(), "UNMAPPED_STAFF")));
        assert!(store.transfers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn live_posts_deducts_per_branch_then_increase_then_records_transfers() {
        let store = ScriptedStore::new(vec![
            vec![
                item("1", "999", 1, Some("B3")),
                item("2", "111", 2, Some("B2")),
                item("3", "111", 3, Some("B2")),
                item("4", "555", 4, Some("B3")),
            ],
            // Second fetch: everything is processed now.
            vec![],
        ]);
        let adjuster = RecordingAdjuster::default();

        let summary = run_reconcile(
            &store,
            Some(&adjuster),
            &params(false),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.batches, 1);
        assert_eq!(summary.transfers, 4);
        assert_eq!(*store.fetches.lock().unwrap(), 2);

        let posts = adjuster.posts.lock().unwrap().clone();
        // DEDUCTs in branch order, then one INCREASE at the purchasing branch.
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].0, "B2");
        assert_eq!(posts[1].0, "B3");
        assert_eq!(posts[2].0, "PK");

        // B2: 111 x5 summed. B3: barcodes sorted ascending.
        assert_eq!(posts[0].1.stocks.len(), 1);
        assert_eq!(posts[0].1.stocks[0].barcode, "111");
        assert_eq!(posts[0].1.stocks[0].quantity, 5);
        let b3_barcodes: Vec<&str> = posts[1].1.stocks.iter().map(|s| s.barcode.as_str()).collect();
        assert_eq!(b3_barcodes, vec!["555", "999"]);

        // INCREASE mirrors the union of barcodes at summed quantities.
        let pk_lines: Vec<(&str, i32)> = posts[2]
            .1
            .stocks
            .iter()
            .map(|s| (s.barcode.as_str(), s.quantity))
            .collect();
        assert_eq!(pk_lines, vec![("111", 5), ("555", 4), ("999", 1)]);
        assert!(posts[2]
            .1
            .stocks
            .iter()
            .all(|s| s.operation_type == OperationType::Increase));

        let transfers = store.transfers.lock().unwrap().clone();
        assert_eq!(transfers.len(), 4);
        assert!(transfers
            .iter()
            .all(|t| t.to_branch_id == "PK" && !t.from_branch_id.is_empty()));
    }

    #[tokio::test]
    async fn live_aborts_on_post_failure_without_recording_transfers() {
        let store = ScriptedStore::new(vec![vec![item("1", "111", 1, Some("B2"))]]);
        let adjuster = RecordingAdjuster {
            fail: true,
            ..Default::default()
        };

        let err = run_reconcile(
            &store,
            Some(&adjuster),
            &params(false),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), Some(500));
        // The item stays unprocessed and will be retried next run.
        assert!(store.transfers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn live_without_adjuster_is_refused_after_exceptions_are_recorded() {
        let store = ScriptedStore::new(vec![vec![
            item("m", "111", 1, Some("B2")),
            item("x", "", 1, None),
        ]]);

        let err = run_reconcile(&store, None, &params(false), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        // The exception row was still recorded before the guard fired.
        assert_eq!(store.exceptions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_fetch_returns_immediately() {
        let store = ScriptedStore::new(vec![]);
        let summary = run_reconcile(&store, None, &params(true), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(summary, ReconcileSummary::default());
        assert_eq!(*store.fetches.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn cancellation_surfaces_before_fetching() {
        let store = ScriptedStore::new(vec![vec![item("1", "111", 1, Some("B2"))]]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = run_reconcile(&store, None, &params(true), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(*store.fetches.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn blank_pk_branch_is_a_config_error() {
        let store = ScriptedStore::new(vec![]);
        let mut p = params(true);
        p.pk_branch_id = "  ".into();
        let err = run_reconcile(&store, None, &p, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
