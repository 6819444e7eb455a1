//! Appointment page fetcher.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use datahub_core::models::Appointment;
use datahub_core::sync::{DateWindow, FetchedPage, Paginator};
use datahub_core::{Error, Result};

use crate::http::{
    self, clamp_page_size, format_date, format_instant, get_json, parse_date, parse_instant,
    HalPageInfo, UpstreamConfig,
};

/// Entity-specific fetch flags. Everything defaults to on: the mirror wants
/// complete history including canceled, deleted and archived rows.
#[derive(Debug, Clone, Copy)]
pub struct AppointmentFetchFlags {
    pub fetch_canceled: bool,
    pub fetch_deleted: bool,
    pub fetch_archived: bool,
    pub fetch_online_category: bool,
}

impl Default for AppointmentFetchFlags {
    fn default() -> Self {
        Self {
            fetch_canceled: true,
            fetch_deleted: true,
            fetch_archived: true,
            fetch_online_category: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCategory {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAppointment {
    #[serde(default)]
    appointment_id: String,
    #[serde(default)]
    version: i64,
    #[serde(default)]
    appointment_date: String,
    #[serde(default)]
    start_time: String,
    #[serde(default)]
    end_time: String,
    #[serde(default)]
    price: Decimal,
    #[serde(default)]
    deposit_amount: Option<Decimal>,
    #[serde(default)]
    deposit_date_time: Option<String>,
    #[serde(default)]
    staff_id: String,
    #[serde(default)]
    confirmed: bool,
    #[serde(default)]
    service_id: String,
    #[serde(default)]
    service_name: String,
    #[serde(default)]
    service_reward_id: String,
    #[serde(default)]
    staff_request: bool,
    #[serde(default)]
    preferred_staff: bool,
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    purchasing_branch_id: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    activation_state: String,
    #[serde(default)]
    booking_id: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    internet_service_categories: Vec<WireCategory>,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
}

#[derive(Debug, Default, Deserialize)]
struct WireEmbedded {
    #[serde(default)]
    appointments: Vec<WireAppointment>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(rename = "_embedded", default)]
    embedded: WireEmbedded,
    #[serde(default)]
    page: HalPageInfo,
}

pub struct AppointmentsClient {
    config: UpstreamConfig,
    http: Client,
    page_size: i64,
    flags: AppointmentFetchFlags,
}

impl AppointmentsClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self::with_flags(config, AppointmentFetchFlags::default())
    }

    pub fn with_flags(config: UpstreamConfig, flags: AppointmentFetchFlags) -> Self {
        Self {
            config,
            http: http::build_client(),
            page_size: http::DEFAULT_PAGE_SIZE,
            flags,
        }
    }

    fn query(
        &self,
        window: DateWindow,
        updated_since: Option<DateTime<Utc>>,
        page: i64,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("from_date", format_date(window.from)),
            ("to_date", format_date(window.to)),
            ("size", clamp_page_size(self.page_size).to_string()),
            ("page", page.to_string()),
            ("fetch_canceled", self.flags.fetch_canceled.to_string()),
            ("fetch_deleted", self.flags.fetch_deleted.to_string()),
            ("fetch_archived", self.flags.fetch_archived.to_string()),
            (
                "fetch_online_category",
                self.flags.fetch_online_category.to_string(),
            ),
        ];
        if let Some(since) = updated_since {
            query.push(("updated_from", format_instant(since)));
        }
        query
    }

    fn map_row(&self, branch_id: &str, wire: WireAppointment) -> Option<Appointment> {
        // Skip malformed rows rather than failing the whole sync.
        let Some(appointment_date) = parse_date(&wire.appointment_date) else {
            warn!(
                appointment_id = %wire.appointment_id,
                raw = %wire.appointment_date,
                "skipping appointment with unparsable date"
            );
            return None;
        };

        let online_service_categories = if self.flags.fetch_online_category {
            serde_json::to_string(
                &wire
                    .internet_service_categories
                    .iter()
                    .map(|c| serde_json::json!({ "id": c.id, "name": c.name }))
                    .collect::<Vec<_>>(),
            )
            .unwrap_or_else(|_| "[]".to_string())
        } else {
            "[]".to_string()
        };

        Some(Appointment {
            branch_id: branch_id.to_string(),
            appointment_id: wire.appointment_id,
            version: wire.version,
            appointment_date,
            start_time: wire.start_time,
            end_time: wire.end_time,
            price: wire.price,
            deposit_amount: wire.deposit_amount,
            deposit_datetime: wire.deposit_date_time.as_deref().and_then(parse_instant),
            staff_id: wire.staff_id,
            confirmed: wire.confirmed,
            service_id: wire.service_id,
            service_name: wire.service_name,
            service_reward_id: wire.service_reward_id,
            staff_request: wire.staff_request,
            preferred_staff: wire.preferred_staff,
            client_id: wire.client_id,
            purchasing_branch_id: wire.purchasing_branch_id,
            state: wire.state,
            activation_state: wire.activation_state,
            booking_id: wire.booking_id,
            source: wire.source,
            deleted: wire.deleted,
            online_service_categories,
            created_at_upstream: parse_instant(&wire.created_at),
            updated_at_upstream: parse_instant(&wire.updated_at),
        })
    }
}

#[async_trait]
impl Paginator for AppointmentsClient {
    type Item = Appointment;

    async fn fetch_page(
        &self,
        scope: &str,
        window: Option<DateWindow>,
        updated_since: Option<DateTime<Utc>>,
        page: i64,
    ) -> Result<FetchedPage<Appointment>> {
        let window = window
            .ok_or_else(|| Error::invariant("appointments fetch requires a date window"))?;
        let url = self.config.branch_url(scope, "/appointment");
        let response: WireResponse = get_json(
            &self.http,
            &self.config,
            &url,
            &self.query(window, updated_since, page),
        )
        .await
        .map_err(Error::from)?;

        let rows = response
            .embedded
            .appointments
            .into_iter()
            .filter_map(|wire| self.map_row(scope, wire))
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
    use rust_decimal::prelude::FromPrimitive;

    use super::*;

    fn client() -> AppointmentsClient {
        AppointmentsClient::new(UpstreamConfig {
            base_url: "https://api.example.test/api".into(),
            business: "biz".into(),
            username: "u".into(),
            password: "p".into(),
        })
    }

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
    }

    #[test]
    fn query_covers_window_paging_and_flags() {
        let since = DateTime::parse_from_rfc3339("2024-03-10T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let query = client().query(window(), Some(since), 2);
        assert!(query.contains(&("from_date", "2024-03-01".to_string())));
        assert!(query.contains(&("to_date", "2024-03-31".to_string())));
        assert!(query.contains(&("page", "2".to_string())));
        assert!(query.contains(&("size", "100".to_string())));
        assert!(query.contains(&("fetch_canceled", "true".to_string())));
        assert!(query.contains(&("updated_from", "2024-03-10T08:00:00.000Z".to_string())));
    }

    #[test]
    fn bootstrap_query_has_no_cursor_filter() {
        let query = client().query(window(), None, 0);
        assert!(!query.iter().any(|(k, _)| *k == "updated_from"));
    }

    #[test]
    fn rows_decode_and_map_into_the_domain() {
        let body = r#"{
            "_embedded": {
                "appointments": [{
                    "appointmentId": "apt-1",
                    "version": 7,
                    "appointmentDate": "2024-03-14",
                    "startTime": "10:00:00",
                    "endTime": "10:45:00",
                    "price": 42.50,
                    "depositAmount": 10.00,
                    "staffId": "st-1",
                    "confirmed": true,
                    "serviceId": "svc-1",
                    "serviceName": "Cut & Finish",
                    "clientId": "cl-1",
                    "state": "CHECKED_OUT",
                    "activationState": "ACTIVE",
                    "createdAt": "2024-03-01T09:00:00.000Z",
                    "updatedAt": "2024-03-14T11:02:03.000Z",
                    "internetServiceCategories": [{"id": "cat-1", "name": "Hair"}],
                    "branchId": "br-1"
                }]
            },
            "page": {"size": 100, "totalElements": 1, "totalPages": 1, "number": 0}
        }"#;
        let response: WireResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.page.total_pages, 1);

        let c = client();
        let row = c
            .map_row("br-1", response.embedded.appointments.into_iter().next().unwrap())
            .unwrap();
        assert_eq!(row.branch_id, "br-1");
        assert_eq!(row.appointment_id, "apt-1");
        assert_eq!(row.version, 7);
        assert_eq!(row.price, Decimal::from_f64(42.5).unwrap());
        assert_eq!(
            row.appointment_date,
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
        );
        assert!(row.updated_at_upstream.is_some());
        assert!(row.online_service_categories.contains("cat-1"));
    }

    #[test]
    fn malformed_dates_skip_the_row() {
        let wire = WireAppointment {
            appointment_id: "apt-bad".into(),
            appointment_date: "14/03/2024".into(),
            ..serde_json::from_str("{}").unwrap()
        };
        assert!(client().map_row("br-1", wire).is_none());
    }
}
