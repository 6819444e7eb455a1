//! Shared HTTP plumbing: configuration, client construction, the HAL page
//! envelope and wire-format helpers.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use datahub_core::settings::UpstreamSettings;

use crate::error::UpstreamError;

pub(crate) const DEFAULT_PAGE_SIZE: i64 = 100;
/// Hard provider maximum; larger requests are silently clamped upstream so
/// we clamp locally and keep paging math honest.
pub(crate) const MAX_PAGE_SIZE: i64 = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const ERROR_BODY_LIMIT: usize = 4096;

/// Addressing and credentials shared by every upstream client.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub business: String,
    pub username: String,
    pub password: String,
}

impl UpstreamConfig {
    /// `{base}/business/{business}` plus the given suffix.
    pub(crate) fn business_url(&self, suffix: &str) -> String {
        format!(
            "{}/business/{}{}",
            self.base_url.trim_end_matches('/'),
            self.business,
            suffix
        )
    }

    /// `{base}/business/{business}/branch/{branch}` plus the given suffix.
    pub(crate) fn branch_url(&self, branch_id: &str, suffix: &str) -> String {
        self.business_url(&format!("/branch/{branch_id}{suffix}"))
    }
}

impl From<&UpstreamSettings> for UpstreamConfig {
    fn from(settings: &UpstreamSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            business: settings.business.clone(),
            username: settings.username.clone(),
            password: settings.password.clone(),
        }
    }
}

/// HAL paging block: `page: { size, totalElements, totalPages, number }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HalPageInfo {
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub total_elements: i64,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default)]
    pub number: i64,
}

pub(crate) fn build_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Authenticated GET returning the decoded JSON body. Non-2xx statuses are
/// captured with a truncated body; decode failures of the whole body are
/// decode errors (individual malformed rows are the caller's business).
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    config: &UpstreamConfig,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, UpstreamError> {
    let response = client
        .get(url)
        .query(query)
        .basic_auth(&config.username, Some(&config.password))
        .header(ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body: truncate(body, ERROR_BODY_LIMIT),
        });
    }

    Ok(response.json::<T>().await?)
}

fn truncate(mut body: String, limit: usize) -> String {
    if body.len() > limit {
        let mut cut = limit;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

/// `YYYY-MM-DD` for `from_date` / `to_date` query parameters.
pub(crate) fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// UTC with millisecond precision for `updated_from` / `updatedAfter`.
pub(crate) fn format_instant(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Lenient instant parsing across the timestamp spellings the provider
/// emits. `None` means absent or unparsable; callers decide whether that
/// skips the row or just nulls the column.
pub(crate) fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Strict `YYYY-MM-DD`.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Dates the provider sometimes sends as plain dates and sometimes as full
/// instants (birth dates, client-since).
pub(crate) fn parse_date_loose(raw: &str) -> Option<NaiveDate> {
    parse_date(raw).or_else(|| parse_instant(raw).map(|ts| ts.date_naive()))
}

/// Page size clamped to the provider maximum.
pub(crate) fn clamp_page_size(size: i64) -> i64 {
    if size <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        size.min(MAX_PAGE_SIZE)
    }
}
