//! Product catalogue sync: full sweep per branch, version-gated upsert.

use tokio_util::sync::CancellationToken;
use tracing::info;

use datahub_core::sync::{run_cursor_sync, SyncTuning};
use datahub_core::Result;
use datahub_storage_postgres::ProductRepository;
use datahub_upstream::ProductsClient;

use crate::context::JobContext;

const ENTITY: &str = "products_api";

pub async fn run(ctx: &JobContext, cancel: CancellationToken) -> Result<()> {
    let client = ProductsClient::new(ctx.upstream_config());
    let repo = ProductRepository::new(ctx.pool.clone());
    let watermarks = ctx.watermarks();
    let tuning = SyncTuning::backfill(ENTITY);

    for branch in &ctx.settings.branches {
        let outcome = run_cursor_sync(
            &branch.branch_id,
            &tuning,
            &client,
            &repo,
            &watermarks,
            &cancel,
        )
        .await?;
        info!(branch = %branch.branch_id, rows = outcome.rows.len(), "products: branch finished");
    }
    Ok(())
}
