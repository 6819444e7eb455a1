//! The incremental sync engine: windows, cursors, trait seams and the
//! generic per-entity loops.

mod orchestrator;
pub mod window;

pub use orchestrator::{
    run_cursor_sync, run_window_replace_sync, run_windowed_sync, CursorOutcome, WindowedOutcome,
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::errors::Result;

/// Scope used for business-wide entities that are not split per branch.
pub const SCOPE_ALL: &str = "ALL";

/// Watermark entity whose presence per branch marks the one-off historical
/// work-timetable load as completed.
pub const WORKTIMETABLE_BACKFILL_ENTITY: &str = "worktimetable_backfill";

/// An inclusive date range `[from, to]`, the unit of fetching. The planner
/// only ever emits windows contained in a single calendar month, which is
/// the widest range the provider accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }
}

/// One decoded page from the upstream, in provider order, together with the
/// total page count the provider declared for the query. A total of zero
/// means the provider did not say; paging then continues until an empty page.
#[derive(Debug, Clone)]
pub struct FetchedPage<T> {
    pub rows: Vec<T>,
    pub total_pages: i64,
}

impl<T> FetchedPage<T> {
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            total_pages: 0,
        }
    }
}

/// A typed page fetcher for one upstream entity. Implementations are
/// stateless between calls; URL templating, auth and JSON decoding are
/// their whole job.
#[async_trait]
pub trait Paginator: Send + Sync {
    type Item;

    /// Fetch one zero-based page. `window` is `None` for business-wide
    /// entities that take no date filter; `updated_since` restricts rows by
    /// upstream mutation time when the entity supports it.
    async fn fetch_page(
        &self,
        scope: &str,
        window: Option<DateWindow>,
        updated_since: Option<DateTime<Utc>>,
        page: i64,
    ) -> Result<FetchedPage<Self::Item>>;
}

/// Idempotent batch upsert into the warehouse (version-gated entities).
pub trait EntitySink<T>: Send + Sync {
    fn upsert_batch(&self, rows: &[T]) -> Result<usize>;
}

/// Transactional delete-then-insert of a whole window snapshot, for
/// entities without a stable per-row identity.
pub trait WindowReplaceSink<T>: Send + Sync {
    fn replace_window(&self, branch_id: &str, window: DateWindow, rows: &[T]) -> Result<usize>;
}

/// Persistence for `(entity, scope) -> last seen upstream timestamp`.
/// The store does not enforce monotonicity: backfills and manual re-runs
/// legitimately rewind, so advancing is the orchestrator's decision.
pub trait WatermarkStore: Send + Sync {
    fn get(&self, entity: &str, scope: &str) -> Result<Option<DateTime<Utc>>>;
    fn upsert(&self, entity: &str, scope: &str, ts: DateTime<Utc>) -> Result<()>;
}

/// Access to the upstream mutation timestamp of a fetched row, used by the
/// loops to track the highest timestamp durably absorbed.
pub trait UpstreamTimestamped {
    fn updated_at_upstream(&self) -> Option<DateTime<Utc>>;
}

/// Per-entity knobs for the incremental loops.
#[derive(Debug, Clone)]
pub struct SyncTuning {
    /// Watermark entity name, e.g. `"appointments_api"`.
    pub entity: String,
    /// Subtracted from the stored watermark when computing `updated_since`,
    /// absorbing upstream clock skew and mid-write visibility lag.
    pub overlap: Duration,
    /// Backfill mode: fetch without a cursor filter and never advance the
    /// watermark, so historical re-imports cannot pollute it.
    pub ignore_watermark: bool,
    /// Trip wire against malformed planner input.
    pub max_window_iterations: usize,
}

impl SyncTuning {
    pub const DEFAULT_OVERLAP_SECS: i64 = 120;
    pub const DEFAULT_MAX_WINDOW_ITERATIONS: usize = 500;

    pub fn incremental(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            overlap: Duration::seconds(Self::DEFAULT_OVERLAP_SECS),
            ignore_watermark: false,
            max_window_iterations: Self::DEFAULT_MAX_WINDOW_ITERATIONS,
        }
    }

    pub fn backfill(entity: impl Into<String>) -> Self {
        Self {
            ignore_watermark: true,
            ..Self::incremental(entity)
        }
    }
}
