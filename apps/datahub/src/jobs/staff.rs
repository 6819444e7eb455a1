//! Staff roster sync: full sweep per branch, version-gated upsert. Runs
//! every invocation and carries no watermark.

use tokio_util::sync::CancellationToken;
use tracing::info;

use datahub_core::sync::{run_cursor_sync, SyncTuning};
use datahub_core::Result;
use datahub_storage_postgres::StaffRepository;
use datahub_upstream::StaffClient;

use crate::context::JobContext;

const ENTITY: &str = "staff_api";

pub async fn run(ctx: &JobContext, cancel: CancellationToken) -> Result<()> {
    let client = StaffClient::new(ctx.upstream_config());
    let repo = StaffRepository::new(ctx.pool.clone());
    let watermarks = ctx.watermarks();
    // Full sweep: no cursor filter and the watermark stays untouched.
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
        info!(branch = %branch.branch_id, rows = outcome.rows.len(), "staff: branch finished");
    }
    Ok(())
}
