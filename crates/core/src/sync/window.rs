//! Calendar-month window planning.
//!
//! The provider rejects date ranges wider than one calendar month, so a
//! requested `[from, to]` range is split into month-aligned sub-windows.

use chrono::{Datelike, Duration, NaiveDate};

use super::DateWindow;

/// Split `[from, to]` (inclusive) into windows each contained in a single
/// calendar month, in ascending order. The first window starts at `from`,
/// the last ends at `to`, intermediate windows span whole months. An empty
/// range (`from > to`) yields no windows.
pub fn month_windows(from: NaiveDate, to: NaiveDate) -> Vec<DateWindow> {
    let mut windows = Vec::new();
    let mut start = from;
    while start <= to {
        let end = end_of_month(start).min(to);
        windows.push(DateWindow::new(start, end));
        start = first_day_of_next_month(start);
    }
    windows
}

/// Last day of the month `d` falls in.
pub fn end_of_month(d: NaiveDate) -> NaiveDate {
    first_day_of_next_month(d) - Duration::days(1)
}

/// First day of the month after the one `d` falls in.
pub fn first_day_of_next_month(d: NaiveDate) -> NaiveDate {
    let (year, month) = if d.month() == 12 {
        (d.year() + 1, 1)
    } else {
        (d.year(), d.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

/// The day before `d`.
pub fn day_before(d: NaiveDate) -> NaiveDate {
    d - Duration::days(1)
}
