//! Work-timetable sync: window-replace over a rolling range every run,
//! plus a marker-gated one-off historical backfill per branch.

use chrono::{Duration, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use datahub_core::settings::{bool_env, date_env, int_env, str_env};
use datahub_core::sync::window::day_before;
use datahub_core::sync::{
    run_window_replace_sync, DateWindow, SyncTuning, WatermarkStore,
};
use datahub_core::{Error, Result};
use datahub_storage_postgres::TimetableRepository;
use datahub_upstream::TimetableClient;

use crate::context::JobContext;

/// Rolling "last refreshed" marker; informational only, unlike the
/// backfill-done marker which gates work.
const ROLLING_MARKER_ENTITY: &str = "worktimetable_rolling";

const DEFAULT_BACKFILL_FROM: (i32, u32, u32) = (2017, 1, 1);

pub async fn run(ctx: &JobContext, cancel: CancellationToken) -> Result<()> {
    let activity_type = str_env("WORKTIMETABLE_ACTIVITY_TYPE");
    if let Some(activity) = &activity_type {
        info!(activity, "worktimetable: filtering by activity type");
    }
    let client = TimetableClient::with_activity_type(ctx.upstream_config(), activity_type);
    let repo = TimetableRepository::new(ctx.pool.clone());
    let watermarks = ctx.watermarks();

    let mut past_days = int_env("WORKTIMETABLE_PAST_DAYS", 0);
    if past_days <= 0 {
        past_days = int_env("WORKTIMETABLE_HISTORY_DAYS", 365);
    }
    let future_days = int_env("WORKTIMETABLE_FUTURE_DAYS", 120);

    let today = Utc::now().date_naive();
    let mut rolling = DateWindow::new(
        today - Duration::days(past_days),
        today + Duration::days(future_days),
    );
    if let Some(from) = date_env("WORKTIMETABLE_FROM_DATE")? {
        rolling.from = from;
    }
    if let Some(to) = date_env("WORKTIMETABLE_TO_DATE")? {
        rolling.to = to;
    }
    if rolling.from > rolling.to {
        return Err(Error::Config(format!(
            "worktimetable: invalid rolling window {}..{}",
            rolling.from, rolling.to
        )));
    }

    let backfill_enabled = bool_env("WORKTIMETABLE_BACKFILL", false);
    let backfill_from = date_env("WORKTIMETABLE_BACKFILL_FROM")?.unwrap_or_else(|| {
        let (y, m, d) = DEFAULT_BACKFILL_FROM;
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    });
    let backfill_to = date_env("WORKTIMETABLE_BACKFILL_TO")?;

    for branch in &ctx.settings.branches {
        let branch_id = branch.branch_id.as_str();

        if backfill_enabled {
            match watermarks.backfill_done_at(branch_id)? {
                Some(done_at) => {
                    info!(branch = branch_id, done_at = %done_at.to_rfc3339(), "worktimetable: backfill already done");
                }
                None => {
                    // The backfill ends the day before the rolling start so
                    // the two ranges never overlap, unless capped earlier.
                    let mut backfill_end = day_before(rolling.from);
                    if let Some(cap) = backfill_to {
                        if cap < backfill_end {
                            backfill_end = cap;
                        }
                    }

                    if backfill_from > backfill_end {
                        warn!(
                            branch = branch_id,
                            from = %backfill_from,
                            to = %backfill_end,
                            "worktimetable: backfill range invalid; skipping"
                        );
                    } else {
                        info!(branch = branch_id, from = %backfill_from, to = %backfill_end, "worktimetable: one-off backfill");
                        run_window_replace_sync(
                            branch_id,
                            DateWindow::new(backfill_from, backfill_end),
                            SyncTuning::DEFAULT_MAX_WINDOW_ITERATIONS,
                            &client,
                            &repo,
                            &cancel,
                        )
                        .await?;
                    }

                    // Marked even when the range was empty or invalid, so a
                    // misconfigured backfill cannot retry forever.
                    watermarks.mark_backfill_done(branch_id)?;
                    info!(branch = branch_id, "worktimetable: backfill marked done");
                }
            }
        }

        info!(branch = branch_id, from = %rolling.from, to = %rolling.to, "worktimetable: rolling scan");
        let slots = run_window_replace_sync(
            branch_id,
            rolling,
            SyncTuning::DEFAULT_MAX_WINDOW_ITERATIONS,
            &client,
            &repo,
            &cancel,
        )
        .await?;
        info!(branch = branch_id, slots, "worktimetable: branch finished");

        if let Err(err) = watermarks.upsert(ROLLING_MARKER_ENTITY, branch_id, Utc::now()) {
            warn!(branch = branch_id, %err, "worktimetable: rolling marker not recorded");
        }
    }
    Ok(())
}
