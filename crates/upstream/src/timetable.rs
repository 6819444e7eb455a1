//! Staff work-timetable page fetcher. One response page carries the
//! timetables of several staff members, each with nested time slots; rows
//! are flattened to one slot per row for the window-replace sink.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use datahub_core::models::TimetableSlot;
use datahub_core::sync::{DateWindow, FetchedPage, Paginator};
use datahub_core::{Error, Result};

use crate::http::{
    self, clamp_page_size, format_date, get_json, parse_date, HalPageInfo, UpstreamConfig,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTimeSlot {
    #[serde(default)]
    date: String,
    #[serde(default)]
    start_time: String,
    #[serde(default)]
    end_time: String,
    #[serde(default)]
    time_off_start_time: Option<String>,
    #[serde(default)]
    time_off_end_time: Option<String>,
    #[serde(rename = "type", default)]
    slot_type: String,
    #[serde(default)]
    custom: Option<String>,
    #[serde(default)]
    branch_id: Option<String>,
    #[serde(default)]
    work_activity_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTimetable {
    #[serde(default)]
    staff_id: String,
    #[serde(default)]
    time_slots: Vec<WireTimeSlot>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEmbedded {
    #[serde(default)]
    work_time_tables: Vec<WireTimetable>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(rename = "_embedded", default)]
    embedded: WireEmbedded,
    #[serde(default)]
    page: HalPageInfo,
}

pub struct TimetableClient {
    config: UpstreamConfig,
    http: Client,
    page_size: i64,
    activity_type: Option<String>,
}

impl TimetableClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self::with_activity_type(config, None)
    }

    pub fn with_activity_type(config: UpstreamConfig, activity_type: Option<String>) -> Self {
        Self {
            config,
            http: http::build_client(),
            page_size: http::DEFAULT_PAGE_SIZE,
            activity_type: activity_type.filter(|v| !v.is_empty()),
        }
    }

    fn query(&self, window: DateWindow, page: i64) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("from_date", format_date(window.from)),
            ("to_date", format_date(window.to)),
            ("page", page.to_string()),
            ("size", clamp_page_size(self.page_size).to_string()),
        ];
        if let Some(activity_type) = &self.activity_type {
            query.push(("activity_type", activity_type.clone()));
        }
        query
    }
}

fn flatten(branch_id: &str, timetables: Vec<WireTimetable>) -> Vec<TimetableSlot> {
    let mut out = Vec::new();
    for timetable in timetables {
        for slot in timetable.time_slots {
            let Some(slot_date) = parse_date(&slot.date) else {
                warn!(
                    staff_id = %timetable.staff_id,
                    raw = %slot.date,
                    "skipping timetable slot with unparsable date"
                );
                continue;
            };
            out.push(TimetableSlot {
                branch_id: branch_id.to_string(),
                staff_id: timetable.staff_id.clone(),
                slot_date,
                start_time: slot.start_time,
                end_time: slot.end_time,
                time_off_start_time: slot.time_off_start_time,
                time_off_end_time: slot.time_off_end_time,
                slot_type: slot.slot_type,
                custom: slot.custom,
                slot_branch_id: slot.branch_id,
                work_activity_id: slot.work_activity_id,
            });
        }
    }
    out
}

#[async_trait]
impl Paginator for TimetableClient {
    type Item = TimetableSlot;

    async fn fetch_page(
        &self,
        scope: &str,
        window: Option<DateWindow>,
        _updated_since: Option<DateTime<Utc>>,
        page: i64,
    ) -> Result<FetchedPage<TimetableSlot>> {
        let window =
            window.ok_or_else(|| Error::invariant("timetable fetch requires a date window"))?;
        let url = self.config.branch_url(scope, "/staff/worktimetable");
        let response: WireResponse =
            get_json(&self.http, &self.config, &url, &self.query(window, page))
                .await
                .map_err(Error::from)?;

        Ok(FetchedPage {
            rows: flatten(scope, response.embedded.work_time_tables),
            total_pages: response.page.total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn nested_timetables_flatten_to_per_slot_rows() {
        let body = r#"{
            "_embedded": {
                "workTimeTables": [
                    {"staffId": "st-1", "branchId": "br-1", "timeSlots": [
                        {"date": "2024-03-04", "startTime": "09:00:00", "endTime": "17:00:00", "type": "SHIFT"},
                        {"date": "2024-03-05", "startTime": "09:00:00", "endTime": "13:00:00",
                         "timeOffStartTime": "11:00:00", "timeOffEndTime": "11:30:00",
                         "type": "SHIFT", "workActivityId": "act-2"}
                    ]},
                    {"staffId": "st-2", "timeSlots": [
                        {"date": "not-a-date", "startTime": "09:00:00", "endTime": "17:00:00", "type": "SHIFT"}
                    ]}
                ]
            },
            "page": {"totalPages": 1, "number": 0, "size": 100}
        }"#;
        let response: WireResponse = serde_json::from_str(body).unwrap();
        let slots = flatten("br-1", response.embedded.work_time_tables);

        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| s.branch_id == "br-1" && s.staff_id == "st-1"));
        assert_eq!(slots[0].slot_date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(slots[1].time_off_start_time.as_deref(), Some("11:00:00"));
        assert_eq!(slots[1].work_activity_id.as_deref(), Some("act-2"));
    }
}
