//! Staff break page fetcher. Windowed per branch; the endpoint has no
//! mutation-time filter, so `updated_since` is ignored and the sync
//! re-scans its rolling window every run.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use datahub_core::models::WorkBreak;
use datahub_core::sync::{DateWindow, FetchedPage, Paginator};
use datahub_core::{Error, Result};

use crate::http::{
    self, clamp_page_size, format_date, get_json, parse_date, HalPageInfo, UpstreamConfig,
};

/// Optional server-side filters; all unset for a full branch scan.
#[derive(Debug, Clone, Default)]
pub struct BreakFilters {
    pub staff_id: Option<String>,
    pub room_id: Option<String>,
    pub machine_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBreak {
    #[serde(default)]
    break_id: String,
    #[serde(default)]
    version: i64,
    #[serde(default)]
    break_date: String,
    #[serde(default)]
    start_time: String,
    #[serde(default)]
    end_time: String,
    #[serde(default)]
    staff_id: String,
    #[serde(default)]
    room_id: Option<String>,
    #[serde(default)]
    machine_id: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    paid_break: bool,
}

#[derive(Debug, Default, Deserialize)]
struct WireEmbedded {
    #[serde(default)]
    breaks: Vec<WireBreak>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(rename = "_embedded", default)]
    embedded: WireEmbedded,
    #[serde(default)]
    page: HalPageInfo,
}

pub struct BreaksClient {
    config: UpstreamConfig,
    http: Client,
    page_size: i64,
    filters: BreakFilters,
}

impl BreaksClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self::with_filters(config, BreakFilters::default())
    }

    pub fn with_filters(config: UpstreamConfig, filters: BreakFilters) -> Self {
        Self {
            config,
            http: http::build_client(),
            page_size: http::DEFAULT_PAGE_SIZE,
            filters,
        }
    }

    fn query(&self, window: DateWindow, page: i64) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("from_date", format_date(window.from)),
            ("to_date", format_date(window.to)),
            ("size", clamp_page_size(self.page_size).to_string()),
            ("page", page.to_string()),
        ];
        if let Some(staff_id) = self.filters.staff_id.as_ref().filter(|v| !v.is_empty()) {
            query.push(("staff_id", staff_id.clone()));
        }
        if let Some(room_id) = self.filters.room_id.as_ref().filter(|v| !v.is_empty()) {
            query.push(("room_id", room_id.clone()));
        }
        if let Some(machine_id) = self.filters.machine_id.as_ref().filter(|v| !v.is_empty()) {
            query.push(("machine_id", machine_id.clone()));
        }
        query
    }
}

fn map_row(branch_id: &str, wire: WireBreak) -> Option<WorkBreak> {
    let Some(break_date) = parse_date(&wire.break_date) else {
        warn!(break_id = %wire.break_id, raw = %wire.break_date, "skipping break with unparsable date");
        return None;
    };
    Some(WorkBreak {
        branch_id: branch_id.to_string(),
        break_id: wire.break_id,
        version: wire.version,
        break_date,
        start_time: wire.start_time,
        end_time: wire.end_time,
        staff_id: wire.staff_id,
        room_id: wire.room_id,
        machine_id: wire.machine_id,
        label: wire.label,
        paid_break: wire.paid_break,
    })
}

#[async_trait]
impl Paginator for BreaksClient {
    type Item = WorkBreak;

    async fn fetch_page(
        &self,
        scope: &str,
        window: Option<DateWindow>,
        _updated_since: Option<DateTime<Utc>>,
        page: i64,
    ) -> Result<FetchedPage<WorkBreak>> {
        let window =
            window.ok_or_else(|| Error::invariant("breaks fetch requires a date window"))?;
        let url = self.config.branch_url(scope, "/break");
        let response: WireResponse =
            get_json(&self.http, &self.config, &url, &self.query(window, page))
                .await
                .map_err(Error::from)?;

        let rows = response
            .embedded
            .breaks
            .into_iter()
            .filter_map(|wire| map_row(scope, wire))
            .collect();
        Ok(FetchedPage {
            rows,
            total_pages: response.page.total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn rows_decode_with_optional_fields_absent() {
        let body = r#"{
            "_embedded": {
                "breaks": [
                    {"breakId": "bk-1", "version": 3, "breakDate": "2024-03-04",
                     "startTime": "12:00:00", "endTime": "12:30:00",
                     "staffId": "st-1", "label": "Lunch", "paidBreak": true},
                    {"breakId": "bk-bad", "version": 1, "breakDate": "yesterday",
                     "startTime": "13:00:00", "endTime": "13:30:00", "staffId": "st-2"}
                ]
            },
            "page": {"size": 100, "totalElements": 2, "totalPages": 1, "number": 0}
        }"#;
        let response: WireResponse = serde_json::from_str(body).unwrap();
        let rows: Vec<WorkBreak> = response
            .embedded
            .breaks
            .into_iter()
            .filter_map(|w| map_row("br-1", w))
            .collect();

        // The malformed date is skipped, not fatal.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].break_id, "bk-1");
        assert_eq!(rows[0].break_date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(rows[0].room_id, None);
        assert_eq!(rows[0].label.as_deref(), Some("Lunch"));
        assert!(rows[0].paid_break);
    }

    #[test]
    fn filters_only_appear_when_set() {
        let config = UpstreamConfig {
            base_url: "https://api.example.test/api".into(),
            business: "biz".into(),
            username: "u".into(),
            password: "p".into(),
        };
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        );

        let plain = BreaksClient::new(config.clone());
        assert!(plain.query(window, 0).iter().all(|(k, _)| *k != "staff_id"));

        let filtered = BreaksClient::with_filters(
            config,
            BreakFilters {
                staff_id: Some("st-9".into()),
                ..Default::default()
            },
        );
        assert!(filtered
            .query(window, 0)
            .contains(&("staff_id", "st-9".to_string())));
    }
}
