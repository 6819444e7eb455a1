//! Break sync: rolling window every run, plus an explicitly gated
//! historical backfill range. The breaks endpoint has no mutation-time
//! filter, so there is no watermark; the version-gated sink makes the
//! re-scan idempotent.

use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;
use tracing::info;

use datahub_core::settings::{bool_env, date_env, int_env};
use datahub_core::sync::{run_windowed_sync, DateWindow, SyncTuning};
use datahub_core::{Error, Result};
use datahub_storage_postgres::WorkBreakRepository;
use datahub_upstream::BreaksClient;

use crate::context::JobContext;

const ENTITY: &str = "breaks_api";

pub async fn run(ctx: &JobContext, cancel: CancellationToken) -> Result<()> {
    let client = BreaksClient::new(ctx.upstream_config());
    let repo = WorkBreakRepository::new(ctx.pool.clone());
    let watermarks = ctx.watermarks();
    let tuning = SyncTuning::backfill(ENTITY);

    let back_days = int_env("BREAKS_BACK_DAYS", 60);
    let forward_days = int_env("BREAKS_FORWARD_DAYS", 180);
    let today = Utc::now().date_naive();
    let rolling = DateWindow::new(
        today - Duration::days(back_days),
        today + Duration::days(forward_days),
    );

    let backfill_enabled = bool_env("BREAKS_BACKFILL", false);
    let from_override = date_env("BREAKS_FROM_DATE")?;
    let to_override = date_env("BREAKS_TO_DATE")?;

    let backfill = if backfill_enabled {
        let (Some(from), Some(to)) = (from_override, to_override) else {
            return Err(Error::config(
                "BREAKS_BACKFILL=true requires BREAKS_FROM_DATE and BREAKS_TO_DATE (YYYY-MM-DD)",
            ));
        };
        if from > to {
            return Err(Error::Config(format!(
                "breaks backfill: invalid window {from}..{to}"
            )));
        }
        Some(DateWindow::new(from, to))
    } else {
        None
    };

    info!(
        from = %rolling.from,
        to = %rolling.to,
        back_days,
        forward_days,
        "breaks: rolling window"
    );

    for branch in &ctx.settings.branches {
        run_windowed_sync(
            &branch.branch_id,
            rolling,
            &tuning,
            &client,
            &repo,
            &watermarks,
            &cancel,
        )
        .await?;

        if let Some(window) = backfill {
            info!(branch = %branch.branch_id, from = %window.from, to = %window.to, "breaks: backfill window");
            run_windowed_sync(
                &branch.branch_id,
                window,
                &tuning,
                &client,
                &repo,
                &watermarks,
                &cancel,
            )
            .await?;
        }
        info!(branch = %branch.branch_id, "breaks: branch finished");
    }
    Ok(())
}
