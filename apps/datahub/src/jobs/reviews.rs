//! Incremental reviews sync (business-wide, cursor on `updatedAfter`).
//! Best-effort: the dispatcher logs failures and carries on.

use tokio_util::sync::CancellationToken;
use tracing::info;

use datahub_core::sync::{run_cursor_sync, SyncTuning, SCOPE_ALL};
use datahub_core::Result;
use datahub_storage_postgres::ReviewRepository;
use datahub_upstream::ReviewsClient;

use crate::context::JobContext;

const ENTITY: &str = "reviews_api";

pub async fn run(ctx: &JobContext, cancel: CancellationToken) -> Result<()> {
    let client = ReviewsClient::new(ctx.upstream_config());
    let repo = ReviewRepository::new(ctx.pool.clone());
    let watermarks = ctx.watermarks();
    let tuning = SyncTuning::incremental(ENTITY);

    let outcome = run_cursor_sync(SCOPE_ALL, &tuning, &client, &repo, &watermarks, &cancel).await?;
    info!(
        rows = outcome.rows.len(),
        watermark_advanced = outcome.watermark_advanced,
        "reviews: finished"
    );
    Ok(())
}
