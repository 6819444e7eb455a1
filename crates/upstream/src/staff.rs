//! Staff roster page fetcher. Branch-scoped, no date filter; driven as a
//! full sweep every run so the roster never goes stale.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use datahub_core::models::StaffMember;
use datahub_core::sync::{DateWindow, FetchedPage, Paginator};
use datahub_core::{Error, Result};

use crate::http::{self, clamp_page_size, get_json, parse_instant, HalPageInfo, UpstreamConfig};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStaff {
    #[serde(default)]
    staff_id: String,
    #[serde(default)]
    version: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    mobile: String,
    #[serde(default)]
    staff_category_id: String,
    #[serde(default)]
    self_employed: bool,
    #[serde(default)]
    hide_from_online_bookings: bool,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireEmbedded {
    #[serde(default)]
    staffs: Vec<WireStaff>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(rename = "_embedded", default)]
    embedded: WireEmbedded,
    #[serde(default)]
    page: HalPageInfo,
}

pub struct StaffClient {
    config: UpstreamConfig,
    http: Client,
    page_size: i64,
}

impl StaffClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            config,
            http: http::build_client(),
            page_size: http::DEFAULT_PAGE_SIZE,
        }
    }
}

fn map_row(branch_id: &str, wire: WireStaff) -> StaffMember {
    let opt_instant = |raw: &Option<String>| raw.as_deref().and_then(parse_instant);
    StaffMember {
        branch_id: branch_id.to_string(),
        staff_id: wire.staff_id,
        version: wire.version,
        first_name: wire.first_name,
        last_name: wire.last_name,
        email: wire.email,
        mobile: wire.mobile,
        staff_category_id: wire.staff_category_id,
        self_employed: wire.self_employed,
        hide_from_online_bookings: wire.hide_from_online_bookings,
        archived: wire.archived,
        created_at_upstream: opt_instant(&wire.created_at),
        updated_at_upstream: opt_instant(&wire.updated_at),
    }
}

#[async_trait]
impl Paginator for StaffClient {
    type Item = StaffMember;

    async fn fetch_page(
        &self,
        scope: &str,
        _window: Option<DateWindow>,
        _updated_since: Option<DateTime<Utc>>,
        page: i64,
    ) -> Result<FetchedPage<StaffMember>> {
        let url = self.config.branch_url(scope, "/staff");
        let query = vec![
            ("size", clamp_page_size(self.page_size).to_string()),
            ("page", page.to_string()),
        ];
        let response: WireResponse = get_json(&self.http, &self.config, &url, &query)
            .await
            .map_err(Error::from)?;

        let rows = response
            .embedded
            .staffs
            .into_iter()
            .map(|wire| map_row(scope, wire))
            .collect();
        Ok(FetchedPage {
            rows,
            total_pages: response.page.total_pages,
        })
    }
}
