//! Review page fetcher. Business-wide, cursor-filtered by `updatedAfter`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use datahub_core::models::Review;
use datahub_core::sync::{DateWindow, FetchedPage, Paginator};
use datahub_core::{Error, Result};

use crate::http::{
    self, clamp_page_size, format_instant, get_json, parse_instant, HalPageInfo, UpstreamConfig,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReview {
    #[serde(default)]
    review_id: String,
    #[serde(default)]
    version: i64,
    #[serde(default)]
    branch_id: String,
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    staff_id: String,
    #[serde(default)]
    rating: i32,
    #[serde(default)]
    text: String,
    #[serde(default)]
    published: bool,
    #[serde(default)]
    review_date: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireEmbedded {
    #[serde(default)]
    reviews: Vec<WireReview>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(rename = "_embedded", default)]
    embedded: WireEmbedded,
    #[serde(default)]
    page: HalPageInfo,
}

pub struct ReviewsClient {
    config: UpstreamConfig,
    http: Client,
    page_size: i64,
}

impl ReviewsClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            config,
            http: http::build_client(),
            page_size: http::DEFAULT_PAGE_SIZE,
        }
    }
}

fn map_row(wire: WireReview) -> Review {
    let opt_instant = |raw: &Option<String>| raw.as_deref().and_then(parse_instant);
    Review {
        review_id: wire.review_id,
        version: wire.version,
        branch_id: wire.branch_id,
        client_id: wire.client_id,
        staff_id: wire.staff_id,
        rating: wire.rating,
        text: wire.text,
        published: wire.published,
        reviewed_at: opt_instant(&wire.review_date),
        created_at_upstream: opt_instant(&wire.created_at),
        updated_at_upstream: opt_instant(&wire.updated_at),
    }
}

#[async_trait]
impl Paginator for ReviewsClient {
    type Item = Review;

    async fn fetch_page(
        &self,
        _scope: &str,
        _window: Option<DateWindow>,
        updated_since: Option<DateTime<Utc>>,
        page: i64,
    ) -> Result<FetchedPage<Review>> {
        let url = self.config.business_url("/review");
        let mut query = vec![
            ("size", clamp_page_size(self.page_size).to_string()),
            ("page", page.to_string()),
        ];
        if let Some(since) = updated_since {
            query.push(("updatedAfter", format_instant(since)));
        }

        let response: WireResponse = get_json(&self.http, &self.config, &url, &query)
            .await
            .map_err(Error::from)?;

        Ok(FetchedPage {
            rows: response.embedded.reviews.into_iter().map(map_row).collect(),
            total_pages: response.page.total_pages,
        })
    }
}
