//! Generic per-entity sync loops.
//!
//! Three loop shapes cover every mirrored entity:
//!
//! * [`run_windowed_sync`]: branch-scoped entities fetched through
//!   month windows with an optional watermark cursor (appointments, breaks).
//! * [`run_cursor_sync`]: business-wide entities with no date filter
//!   (clients, reviews) and full sweeps (staff, products).
//! * [`run_window_replace_sync`]: snapshot entities without per-row
//!   identity (staff work-timetable), replaced window by window.
//!
//! All loops share the same contract: branches are processed by the caller
//! sequentially, windows chronologically, pages in ascending order, one
//! in-flight request at a time. Any error aborts the current scope with
//! committed batches left durable and the watermark unwritten.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{Error, Result};

use super::window::month_windows;
use super::{
    DateWindow, EntitySink, Paginator, SyncTuning, UpstreamTimestamped, WatermarkStore,
    WindowReplaceSink,
};

/// Result of one windowed or cursor sync for a single scope.
#[derive(Debug, Clone, Default)]
pub struct WindowedOutcome {
    pub rows_touched: usize,
    pub max_observed: Option<DateTime<Utc>>,
    pub watermark_advanced: bool,
}

/// Result of a cursor sync; the fetched rows are handed back so callers can
/// derive artifacts (e.g. the client CSV snapshot) from exactly what was
/// persisted.
#[derive(Debug, Clone)]
pub struct CursorOutcome<T> {
    pub rows: Vec<T>,
    pub max_observed: Option<DateTime<Utc>>,
    pub watermark_advanced: bool,
}

/// Read the stored watermark and derive the `updated_since` filter for
/// this run. Returns `(updated_since, stored_watermark)`.
fn resolve_updated_since(
    scope: &str,
    tuning: &SyncTuning,
    watermarks: &dyn WatermarkStore,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    if tuning.ignore_watermark {
        info!(entity = %tuning.entity, scope, "backfill mode: no cursor filter, watermark frozen");
        return Ok((None, None));
    }
    match watermarks.get(&tuning.entity, scope)? {
        Some(last) => {
            let since = last - tuning.overlap;
            info!(
                entity = %tuning.entity,
                scope,
                watermark = %last.to_rfc3339(),
                updated_since = %since.to_rfc3339(),
                "incremental mode"
            );
            Ok((Some(since), Some(last)))
        }
        None => {
            info!(entity = %tuning.entity, scope, "no watermark yet: bootstrap sweep");
            Ok((None, None))
        }
    }
}

/// Advance the watermark after a completed scope, per the mode rules. The
/// cursor only ever moves forward: when every returned row fell inside the
/// overlap (max observed at or below the stored value) nothing is written.
fn conclude_watermark(
    scope: &str,
    tuning: &SyncTuning,
    watermarks: &dyn WatermarkStore,
    stored: Option<DateTime<Utc>>,
    rows_touched: usize,
    max_observed: Option<DateTime<Utc>>,
) -> Result<bool> {
    if rows_touched == 0 {
        debug!(entity = %tuning.entity, scope, "no rows returned, watermark unchanged");
        return Ok(false);
    }
    if tuning.ignore_watermark {
        debug!(entity = %tuning.entity, scope, "backfill mode, watermark not advanced");
        return Ok(false);
    }
    match max_observed {
        Some(ts) => {
            if stored.is_some_and(|prior| ts <= prior) {
                debug!(
                    entity = %tuning.entity,
                    scope,
                    "max observed not beyond the stored watermark; unchanged"
                );
                return Ok(false);
            }
            watermarks.upsert(&tuning.entity, scope, ts)?;
            info!(entity = %tuning.entity, scope, watermark = %ts.to_rfc3339(), "watermark advanced");
            Ok(true)
        }
        None => {
            warn!(
                entity = %tuning.entity,
                scope,
                rows_touched,
                "rows touched but none carried an upstream timestamp; watermark unchanged"
            );
            Ok(false)
        }
    }
}

fn track_max<T: UpstreamTimestamped>(max: &mut Option<DateTime<Utc>>, rows: &[T]) {
    for row in rows {
        if let Some(ts) = row.updated_at_upstream() {
            *max = Some(max.map_or(ts, |m| m.max(ts)));
        }
    }
}

/// Drive all pages of one query, upserting each page as it arrives.
/// Stops on the first empty page, or once the provider-declared page count
/// is exhausted (a declared total of zero keeps paging until empty).
async fn drain_pages<T>(
    scope: &str,
    window: Option<DateWindow>,
    updated_since: Option<DateTime<Utc>>,
    paginator: &dyn Paginator<Item = T>,
    cancel: &CancellationToken,
    mut on_page: impl FnMut(Vec<T>) -> Result<()>,
) -> Result<()> {
    let mut page = 0i64;
    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let fetched = paginator.fetch_page(scope, window, updated_since, page).await?;
        if fetched.rows.is_empty() {
            break;
        }
        on_page(fetched.rows)?;
        page += 1;
        if fetched.total_pages > 0 && page >= fetched.total_pages {
            break;
        }
    }
    Ok(())
}

/// Incremental (or backfill) sync of a branch-scoped, windowed entity.
pub async fn run_windowed_sync<T>(
    scope: &str,
    range: DateWindow,
    tuning: &SyncTuning,
    paginator: &dyn Paginator<Item = T>,
    sink: &dyn EntitySink<T>,
    watermarks: &dyn WatermarkStore,
    cancel: &CancellationToken,
) -> Result<WindowedOutcome>
where
    T: UpstreamTimestamped,
{
    let (updated_since, stored) = resolve_updated_since(scope, tuning, watermarks)?;

    let windows = month_windows(range.from, range.to);
    if windows.len() > tuning.max_window_iterations {
        return Err(Error::Invariant(format!(
            "{}/{scope}: window planner emitted {} windows for {}..{} (limit {})",
            tuning.entity,
            windows.len(),
            range.from,
            range.to,
            tuning.max_window_iterations,
        )));
    }

    let mut rows_touched = 0usize;
    let mut max_observed: Option<DateTime<Utc>> = None;

    for window in windows {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        debug!(
            entity = %tuning.entity,
            scope,
            from = %window.from,
            to = %window.to,
            "scanning window"
        );
        drain_pages(scope, Some(window), updated_since, paginator, cancel, |rows| {
            sink.upsert_batch(&rows)?;
            rows_touched += rows.len();
            track_max(&mut max_observed, &rows);
            Ok(())
        })
        .await?;
    }

    let watermark_advanced =
        conclude_watermark(scope, tuning, watermarks, stored, rows_touched, max_observed)?;
    info!(entity = %tuning.entity, scope, rows_touched, "sync finished");
    Ok(WindowedOutcome {
        rows_touched,
        max_observed,
        watermark_advanced,
    })
}

/// Incremental sync of an entity addressed by cursor alone (no date
/// windows). Also used for plain full sweeps with `ignore_watermark`.
pub async fn run_cursor_sync<T>(
    scope: &str,
    tuning: &SyncTuning,
    paginator: &dyn Paginator<Item = T>,
    sink: &dyn EntitySink<T>,
    watermarks: &dyn WatermarkStore,
    cancel: &CancellationToken,
) -> Result<CursorOutcome<T>>
where
    T: UpstreamTimestamped,
{
    let (updated_since, stored) = resolve_updated_since(scope, tuning, watermarks)?;

    let mut all_rows: Vec<T> = Vec::new();
    let mut max_observed: Option<DateTime<Utc>> = None;

    drain_pages(scope, None, updated_since, paginator, cancel, |rows| {
        sink.upsert_batch(&rows)?;
        track_max(&mut max_observed, &rows);
        all_rows.extend(rows);
        Ok(())
    })
    .await?;

    let watermark_advanced =
        conclude_watermark(scope, tuning, watermarks, stored, all_rows.len(), max_observed)?;
    info!(entity = %tuning.entity, scope, rows_touched = all_rows.len(), "sync finished");
    Ok(CursorOutcome {
        rows: all_rows,
        max_observed,
        watermark_advanced,
    })
}

/// Snapshot sync for entities without per-row identity: every month window
/// is fetched completely, then swapped into the warehouse in one
/// transaction. Windows the provider no longer has rows for are still
/// replaced, so locally stored rows that disappeared upstream disappear
/// here too.
pub async fn run_window_replace_sync<T>(
    scope: &str,
    range: DateWindow,
    max_window_iterations: usize,
    paginator: &dyn Paginator<Item = T>,
    sink: &dyn WindowReplaceSink<T>,
    cancel: &CancellationToken,
) -> Result<usize> {
    let windows = month_windows(range.from, range.to);
    if windows.len() > max_window_iterations {
        return Err(Error::Invariant(format!(
            "{scope}: window planner emitted {} windows for {}..{} (limit {max_window_iterations})",
            windows.len(),
            range.from,
            range.to,
        )));
    }

    let mut total = 0usize;
    for window in windows {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let mut fetched: Vec<T> = Vec::new();
        drain_pages(scope, Some(window), None, paginator, cancel, |rows| {
            fetched.extend(rows);
            Ok(())
        })
        .await?;

        sink.replace_window(scope, window, &fetched)?;
        total += fetched.len();
        info!(
            scope,
            from = %window.from,
            to = %window.to,
            slots = fetched.len(),
            "window replaced"
        );
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, TimeZone};

    use super::super::FetchedPage;
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestRow {
        id: String,
        updated: Option<DateTime<Utc>>,
    }

    impl UpstreamTimestamped for TestRow {
        fn updated_at_upstream(&self) -> Option<DateTime<Utc>> {
            self.updated
        }
    }

    fn row(id: &str, updated_secs: Option<i64>) -> TestRow {
        TestRow {
            id: id.to_string(),
            updated: updated_secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        window: Option<DateWindow>,
        updated_since: Option<DateTime<Utc>>,
        page: i64,
    }

    /// Serves a scripted sequence of pages and records every call.
    struct ScriptedPaginator {
        responses: Mutex<Vec<FetchedPage<TestRow>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl ScriptedPaginator {
        fn new(responses: Vec<FetchedPage<TestRow>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Paginator for ScriptedPaginator {
        type Item = TestRow;

        async fn fetch_page(
            &self,
            _scope: &str,
            window: Option<DateWindow>,
            updated_since: Option<DateTime<Utc>>,
            page: i64,
        ) -> Result<FetchedPage<TestRow>> {
            self.calls.lock().unwrap().push(Call {
                window,
                updated_since,
                page,
            });
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(FetchedPage::empty))
        }
    }

    #[derive(Default)]
    struct MemorySink {
        rows: Mutex<Vec<TestRow>>,
    }

    impl EntitySink<TestRow> for MemorySink {
        fn upsert_batch(&self, rows: &[TestRow]) -> Result<usize> {
            self.rows.lock().unwrap().extend_from_slice(rows);
            Ok(rows.len())
        }
    }

    #[derive(Default)]
    struct MemoryWatermarks {
        map: Mutex<HashMap<(String, String), DateTime<Utc>>>,
    }

    impl MemoryWatermarks {
        fn seed(&self, entity: &str, scope: &str, ts: DateTime<Utc>) {
            self.map
                .lock()
                .unwrap()
                .insert((entity.to_string(), scope.to_string()), ts);
        }

        fn value(&self, entity: &str, scope: &str) -> Option<DateTime<Utc>> {
            self.map
                .lock()
                .unwrap()
                .get(&(entity.to_string(), scope.to_string()))
                .copied()
        }
    }

    impl WatermarkStore for MemoryWatermarks {
        fn get(&self, entity: &str, scope: &str) -> Result<Option<DateTime<Utc>>> {
            Ok(self.value(entity, scope))
        }

        fn upsert(&self, entity: &str, scope: &str, ts: DateTime<Utc>) -> Result<()> {
            self.seed(entity, scope, ts);
            Ok(())
        }
    }

    #[derive(Default)]
    struct ReplaceRecorder {
        windows: Mutex<Vec<(DateWindow, usize)>>,
    }

    impl WindowReplaceSink<TestRow> for ReplaceRecorder {
        fn replace_window(
            &self,
            _branch_id: &str,
            window: DateWindow,
            rows: &[TestRow],
        ) -> Result<usize> {
            self.windows.lock().unwrap().push((window, rows.len()));
            Ok(rows.len())
        }
    }

    fn page(rows: Vec<TestRow>, total_pages: i64) -> FetchedPage<TestRow> {
        FetchedPage { rows, total_pages }
    }

    #[tokio::test]
    async fn bootstrap_sweep_advances_watermark_to_max_observed() {
        let paginator = ScriptedPaginator::new(vec![
            page(vec![row("a", Some(100)), row("b", Some(300))], 2),
            page(vec![row("c", Some(200))], 2),
        ]);
        let sink = MemorySink::default();
        let watermarks = MemoryWatermarks::default();
        let tuning = SyncTuning::incremental("appointments_api");

        let outcome = run_windowed_sync(
            "B1",
            DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)),
            &tuning,
            &paginator,
            &sink,
            &watermarks,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.rows_touched, 3);
        assert!(outcome.watermark_advanced);
        assert_eq!(
            watermarks.value("appointments_api", "B1"),
            Some(Utc.timestamp_opt(300, 0).unwrap())
        );
        // Bootstrap: no cursor filter on any call.
        assert!(paginator.calls().iter().all(|c| c.updated_since.is_none()));
    }

    #[tokio::test]
    async fn incremental_mode_applies_overlap_to_the_cursor() {
        let last = Utc.timestamp_opt(10_000, 0).unwrap();
        let paginator = ScriptedPaginator::new(vec![page(vec![row("a", Some(10_050))], 1)]);
        let sink = MemorySink::default();
        let watermarks = MemoryWatermarks::default();
        watermarks.seed("appointments_api", "B1", last);
        let tuning = SyncTuning::incremental("appointments_api");

        run_windowed_sync(
            "B1",
            DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)),
            &tuning,
            &paginator,
            &sink,
            &watermarks,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let expected = last - Duration::seconds(SyncTuning::DEFAULT_OVERLAP_SECS);
        assert_eq!(paginator.calls()[0].updated_since, Some(expected));
    }

    #[tokio::test]
    async fn backfill_mode_leaves_watermark_untouched() {
        let prior = Utc.timestamp_opt(5_000, 0).unwrap();
        let paginator = ScriptedPaginator::new(vec![page(vec![row("a", Some(99_999))], 1)]);
        let sink = MemorySink::default();
        let watermarks = MemoryWatermarks::default();
        watermarks.seed("appointments_api", "B1", prior);
        let tuning = SyncTuning::backfill("appointments_api");

        let outcome = run_windowed_sync(
            "B1",
            DateWindow::new(date(2020, 1, 1), date(2020, 1, 31)),
            &tuning,
            &paginator,
            &sink,
            &watermarks,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.rows_touched, 1);
        assert!(!outcome.watermark_advanced);
        assert_eq!(watermarks.value("appointments_api", "B1"), Some(prior));
        assert!(paginator.calls()[0].updated_since.is_none());
    }

    #[tokio::test]
    async fn overlap_only_rows_never_rewind_the_watermark() {
        // Every returned row sits inside the overlap window, so the max
        // observed timestamp is below the stored cursor. Writing it would
        // move the cursor backwards.
        let stored = Utc.timestamp_opt(10_000, 0).unwrap();
        let paginator = ScriptedPaginator::new(vec![page(vec![row("a", Some(9_950))], 1)]);
        let sink = MemorySink::default();
        let watermarks = MemoryWatermarks::default();
        watermarks.seed("appointments_api", "B1", stored);
        let tuning = SyncTuning::incremental("appointments_api");

        let outcome = run_windowed_sync(
            "B1",
            DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)),
            &tuning,
            &paginator,
            &sink,
            &watermarks,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.rows_touched, 1);
        assert!(!outcome.watermark_advanced);
        assert_eq!(watermarks.value("appointments_api", "B1"), Some(stored));
    }

    #[tokio::test]
    async fn paging_stops_at_declared_total_pages() {
        let paginator = ScriptedPaginator::new(vec![
            page(vec![row("a", Some(1))], 2),
            page(vec![row("b", Some(2))], 2),
            // A third response would be an over-fetch; it must never be read.
            page(vec![row("never", Some(3))], 2),
        ]);
        let sink = MemorySink::default();
        let watermarks = MemoryWatermarks::default();
        let tuning = SyncTuning::incremental("appointments_api");

        let outcome = run_windowed_sync(
            "B1",
            DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)),
            &tuning,
            &paginator,
            &sink,
            &watermarks,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.rows_touched, 2);
        assert_eq!(paginator.calls().len(), 2);
        assert_eq!(paginator.calls()[1].page, 1);
    }

    #[tokio::test]
    async fn zero_total_pages_keeps_paging_until_empty() {
        let paginator = ScriptedPaginator::new(vec![
            page(vec![row("a", Some(1))], 0),
            page(vec![row("b", Some(2))], 0),
            FetchedPage::empty(),
        ]);
        let sink = MemorySink::default();
        let watermarks = MemoryWatermarks::default();
        let tuning = SyncTuning::incremental("appointments_api");

        let outcome = run_windowed_sync(
            "B1",
            DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)),
            &tuning,
            &paginator,
            &sink,
            &watermarks,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.rows_touched, 2);
        assert_eq!(paginator.calls().len(), 3);
    }

    #[tokio::test]
    async fn windows_are_visited_in_chronological_order() {
        let paginator = ScriptedPaginator::new(vec![
            page(vec![row("jan", Some(1))], 1),
            page(vec![row("feb", Some(2))], 1),
            page(vec![row("mar", Some(3))], 1),
        ]);
        let sink = MemorySink::default();
        let watermarks = MemoryWatermarks::default();
        let tuning = SyncTuning::incremental("appointments_api");

        run_windowed_sync(
            "B1",
            DateWindow::new(date(2024, 1, 15), date(2024, 3, 15)),
            &tuning,
            &paginator,
            &sink,
            &watermarks,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let firsts: Vec<NaiveDate> = paginator
            .calls()
            .iter()
            .map(|c| c.window.unwrap().from)
            .collect();
        assert_eq!(
            firsts,
            vec![date(2024, 1, 15), date(2024, 2, 1), date(2024, 3, 1)]
        );
    }

    #[tokio::test]
    async fn cancellation_aborts_before_fetching_and_freezes_watermark() {
        let paginator = ScriptedPaginator::new(vec![page(vec![row("a", Some(1))], 1)]);
        let sink = MemorySink::default();
        let watermarks = MemoryWatermarks::default();
        let tuning = SyncTuning::incremental("appointments_api");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = run_windowed_sync(
            "B1",
            DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)),
            &tuning,
            &paginator,
            &sink,
            &watermarks,
            &cancel,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert!(paginator.calls().is_empty());
        assert_eq!(watermarks.value("appointments_api", "B1"), None);
    }

    #[tokio::test]
    async fn window_safety_bound_trips_as_invariant() {
        let paginator = ScriptedPaginator::new(vec![]);
        let sink = MemorySink::default();
        let watermarks = MemoryWatermarks::default();
        let mut tuning = SyncTuning::incremental("appointments_api");
        tuning.max_window_iterations = 3;

        let err = run_windowed_sync(
            "B1",
            DateWindow::new(date(2024, 1, 1), date(2024, 6, 30)),
            &tuning,
            &paginator,
            &sink,
            &watermarks,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Invariant(_)));
        assert!(paginator.calls().is_empty());
    }

    #[tokio::test]
    async fn rows_without_timestamps_leave_watermark_unchanged() {
        let paginator = ScriptedPaginator::new(vec![page(vec![row("a", None), row("b", None)], 1)]);
        let sink = MemorySink::default();
        let watermarks = MemoryWatermarks::default();
        let tuning = SyncTuning::incremental("breaks_api");

        let outcome = run_windowed_sync(
            "B1",
            DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)),
            &tuning,
            &paginator,
            &sink,
            &watermarks,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.rows_touched, 2);
        assert!(!outcome.watermark_advanced);
        assert_eq!(watermarks.value("breaks_api", "B1"), None);
    }

    #[tokio::test]
    async fn cursor_sync_collects_rows_and_advances_watermark() {
        let paginator = ScriptedPaginator::new(vec![
            page(vec![row("a", Some(100))], 0),
            page(vec![row("b", Some(400))], 0),
            FetchedPage::empty(),
        ]);
        let sink = MemorySink::default();
        let watermarks = MemoryWatermarks::default();
        let tuning = SyncTuning::incremental("clients_api");

        let outcome = run_cursor_sync(
            super::super::SCOPE_ALL,
            &tuning,
            &paginator,
            &sink,
            &watermarks,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.rows.len(), 2);
        assert!(outcome.watermark_advanced);
        assert_eq!(
            watermarks.value("clients_api", "ALL"),
            Some(Utc.timestamp_opt(400, 0).unwrap())
        );
        assert_eq!(sink.rows.lock().unwrap().len(), 2);
        // Cursor entities take no date window.
        assert!(paginator.calls().iter().all(|c| c.window.is_none()));
    }

    #[tokio::test]
    async fn window_replace_runs_even_for_windows_that_came_back_empty() {
        let paginator = ScriptedPaginator::new(vec![
            // March: two pages of slots.
            page(vec![row("s1", None), row("s2", None)], 2),
            page(vec![row("s3", None)], 2),
            // April: nothing upstream; the window must still be replaced so
            // stale local rows are deleted.
            FetchedPage::empty(),
        ]);
        let sink = ReplaceRecorder::default();

        let total = run_window_replace_sync(
            "B1",
            DateWindow::new(date(2024, 3, 1), date(2024, 4, 30)),
            SyncTuning::DEFAULT_MAX_WINDOW_ITERATIONS,
            &paginator,
            &sink,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(total, 3);
        let replaced = sink.windows.lock().unwrap().clone();
        assert_eq!(
            replaced,
            vec![
                (DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)), 3),
                (DateWindow::new(date(2024, 4, 1), date(2024, 4, 30)), 0),
            ]
        );
    }
}
