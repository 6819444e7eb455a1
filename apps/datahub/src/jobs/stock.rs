//! Stock reconciliation job: dry-run and live share the engine; only the
//! `dry_run` flag and the presence of the adjuster differ.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::info;

use datahub_core::reconcile::{
    run_reconcile, ReconcileParams, StockAdjuster,
};
use datahub_core::settings::{date_env, flag, int_env, str_env};
use datahub_core::Result;
use datahub_storage_postgres::StockReconcileRepository;
use datahub_upstream::HttpStockAdjuster;

use crate::context::JobContext;

const DEFAULT_LOOKBACK_DAYS: i64 = 30;

pub async fn run(ctx: &JobContext, dry_run: bool, cancel: CancellationToken) -> Result<()> {
    let store = StockReconcileRepository::new(ctx.pool.clone());

    let from_ts: DateTime<Utc> = match date_env("STOCK_RECONCILE_FROM_DATE")? {
        Some(date) => date
            .and_time(NaiveTime::MIN)
            .and_utc(),
        None => Utc::now() - Duration::days(DEFAULT_LOOKBACK_DAYS),
    };

    let params = ReconcileParams {
        pk_branch_id: ctx.settings.reconcile_pk_branch_id()?,
        dry_run,
        from_ts,
        to_ts: Utc::now(),
        limit: int_env("STOCK_RECONCILE_LIMIT", ReconcileParams::DEFAULT_LIMIT),
        test_barcode: str_env("STOCK_RECONCILE_TEST_BARCODE"),
        max_preview: int_env(
            "STOCK_RECONCILE_MAX_PREVIEW",
            ReconcileParams::DEFAULT_MAX_PREVIEW as i64,
        ) as usize,
        print_json: flag("STOCK_RECONCILE_PRINT_JSON"),
    };

    let adjuster = (!dry_run).then(|| HttpStockAdjuster::new(ctx.upstream_config()));
    let summary = run_reconcile(
        &store,
        adjuster.as_ref().map(|a| a as &dyn StockAdjuster),
        &params,
        &cancel,
    )
    .await?;

    info!(
        dry_run,
        batches = summary.batches,
        rows = summary.rows,
        mapped = summary.mapped,
        unmapped_staff = summary.unmapped_staff,
        missing_barcode = summary.missing_barcode,
        transfers = summary.transfers,
        exceptions = summary.exceptions,
        "stock reconcile: summary"
    );
    Ok(())
}
