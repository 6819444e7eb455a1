//! Scheduled batch runner: composes settings, warehouse pool, upstream
//! clients and repositories into named jobs selected by environment flags.
//! One invocation runs any subset of jobs sequentially; the first fatal
//! error stops the process with a non-zero exit code.

mod context;
mod jobs;

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use datahub_core::settings::{flag, Settings};
use datahub_core::Result;
use datahub_storage_postgres::{establish_pool, health_check, run_migrations};

use crate::context::JobContext;

const DB_HEALTH_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const APPOINTMENTS_JOB_TIMEOUT: Duration = Duration::from_secs(15 * 60);
const RECONCILE_DRY_RUN_TIMEOUT: Duration = Duration::from_secs(2 * 60);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err((subsystem, err)) = run().await {
        error!(subsystem, %err, "invocation failed");
        std::process::exit(1);
    }
    info!("invocation complete");
}

async fn run() -> std::result::Result<(), (&'static str, datahub_core::Error)> {
    let settings = Settings::from_env().map_err(|e| ("config", e))?;

    std::fs::create_dir_all(&settings.export_dir).map_err(|e| {
        (
            "config",
            datahub_core::Error::Config(format!(
                "create export dir {}: {e}",
                settings.export_dir.display()
            )),
        )
    })?;
    info!(export_dir = %settings.export_dir.display(), "using export dir");

    let dsn = settings.active_database_url().map_err(|e| ("config", e))?;
    if settings.sandbox_mode {
        info!("sandbox mode enabled: using SANDBOX_DATABASE_URL");
    } else {
        info!("normal mode: using DATABASE_URL");
    }

    let pool = establish_pool(dsn).map_err(|e| ("db", e))?;
    health_check(&pool, DB_HEALTH_TIMEOUT).map_err(|e| ("db", e))?;
    info!("database connection healthy");

    if settings.auto_migrate {
        info!("running migrations");
        run_migrations(&pool).map_err(|e| ("migrations", e))?;
        info!("database migrated");
    }

    for branch in &settings.branches {
        info!(name = %branch.name, branch_id = %branch.branch_id, "branch configured");
    }

    let ctx = JobContext::new(settings, pool);

    // Staff roster refresh runs every invocation so branch/staff joins in
    // downstream reporting never go stale.
    with_deadline(DEFAULT_JOB_TIMEOUT, |cancel| jobs::staff::run(&ctx, cancel))
        .await
        .map_err(|e| ("staff", e))?;

    if flag("RUN_PRODUCTS_SYNC") {
        info!("running products sync");
        with_deadline(DEFAULT_JOB_TIMEOUT, |cancel| jobs::products::run(&ctx, cancel))
            .await
            .map_err(|e| ("products", e))?;
    }

    if flag("RUN_CLIENTS_API_INCREMENTAL") {
        info!("running incremental clients sync");
        with_deadline(DEFAULT_JOB_TIMEOUT, |cancel| jobs::clients::run(&ctx, cancel))
            .await
            .map_err(|e| ("clients", e))?;
    }

    if flag("RUN_APPOINTMENTS_API_INCREMENTAL") {
        info!("running incremental appointments sync");
        with_deadline(APPOINTMENTS_JOB_TIMEOUT, |cancel| {
            jobs::appointments::run(&ctx, cancel)
        })
        .await
        .map_err(|e| ("appointments", e))?;
    }

    if flag("RUN_BREAKS_API_INCREMENTAL") {
        info!("running breaks sync");
        with_deadline(DEFAULT_JOB_TIMEOUT, |cancel| jobs::breaks::run(&ctx, cancel))
            .await
            .map_err(|e| ("breaks", e))?;
    }

    if flag("RUN_WORKTIMETABLE_SYNC") {
        info!("running work-timetable sync");
        with_deadline(DEFAULT_JOB_TIMEOUT, |cancel| jobs::timetable::run(&ctx, cancel))
            .await
            .map_err(|e| ("worktimetable", e))?;
    }

    if flag("RUN_REVIEWS_INCREMENTAL") {
        info!("running incremental reviews sync");
        // Reviews are best-effort: a failure is logged and the invocation
        // carries on.
        if let Err(err) =
            with_deadline(DEFAULT_JOB_TIMEOUT, |cancel| jobs::reviews::run(&ctx, cancel)).await
        {
            error!(%err, "reviews sync ended with errors; continuing");
        }
    }

    if flag("RUN_STOCK_RECONCILE_DRY_RUN") {
        info!("running stock reconcile (dry-run)");
        with_deadline(RECONCILE_DRY_RUN_TIMEOUT, |cancel| {
            jobs::stock::run(&ctx, true, cancel)
        })
        .await
        .map_err(|e| ("stock-reconcile", e))?;
    }

    if flag("RUN_STOCK_RECONCILE_LIVE") {
        info!("running stock reconcile (LIVE)");
        with_deadline(DEFAULT_JOB_TIMEOUT, |cancel| {
            jobs::stock::run(&ctx, false, cancel)
        })
        .await
        .map_err(|e| ("stock-reconcile", e))?;
    }

    Ok(())
}

/// Run one job under a deadline. The token is cancelled when the timer
/// fires; the job observes it between pages/windows/batches and surfaces
/// `cancelled`, leaving committed batches durable and watermarks unwritten.
async fn with_deadline<F, Fut>(timeout: Duration, job: F) -> Result<()>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    let timer = tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        deadline.cancel();
    });
    let result = job(cancel).await;
    timer.abort();
    result
}
