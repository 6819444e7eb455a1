//! Incremental appointments sync, month-windowed per branch.

use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;
use tracing::info;

use datahub_core::settings::{bool_env, date_env, int_env};
use datahub_core::sync::{run_windowed_sync, DateWindow, SyncTuning};
use datahub_core::{Error, Result};
use datahub_storage_postgres::AppointmentRepository;
use datahub_upstream::AppointmentsClient;

use crate::context::JobContext;

const ENTITY: &str = "appointments_api";

pub async fn run(ctx: &JobContext, cancel: CancellationToken) -> Result<()> {
    let client = AppointmentsClient::new(ctx.upstream_config());
    let repo = AppointmentRepository::new(ctx.pool.clone());
    let watermarks = ctx.watermarks();

    let history_days = int_env("APPOINTMENTS_HISTORY_DAYS", 365);
    let future_days = int_env("APPOINTMENTS_FUTURE_DAYS", 120);
    let ignore_watermark = bool_env("APPOINTMENTS_IGNORE_WATERMARK", false);

    let today = Utc::now().date_naive();
    let mut start = today - Duration::days(history_days);
    let mut end = today + Duration::days(future_days);

    if let Some(from) = date_env("APPOINTMENTS_FROM_DATE")? {
        start = from;
    }
    if let Some(to) = date_env("APPOINTMENTS_TO_DATE")? {
        end = to;
    }
    if start > end {
        return Err(Error::Config(format!(
            "appointments: invalid window: start={start} is after end={end}"
        )));
    }

    let tuning = if ignore_watermark {
        info!("appointments: backfill mode (no cursor filter, no watermark updates)");
        SyncTuning::backfill(ENTITY)
    } else {
        SyncTuning::incremental(ENTITY)
    };
    info!(%start, %end, "appointments: scanning");

    for branch in &ctx.settings.branches {
        let outcome = run_windowed_sync(
            &branch.branch_id,
            DateWindow::new(start, end),
            &tuning,
            &client,
            &repo,
            &watermarks,
            &cancel,
        )
        .await?;
        info!(
            branch = %branch.branch_id,
            rows = outcome.rows_touched,
            watermark_advanced = outcome.watermark_advanced,
            "appointments: branch finished"
        );
    }
    Ok(())
}
