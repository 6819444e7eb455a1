//! Client (customer) page fetcher. Business-wide: branch scope and date
//! windows are meaningless here and are ignored; the cursor filter is
//! `updatedAfter`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use serde::Deserialize;

use datahub_core::models::Client;
use datahub_core::sync::{DateWindow, FetchedPage, Paginator};
use datahub_core::{Error, Result};

use crate::http::{
    self, clamp_page_size, format_instant, get_json, parse_date_loose, parse_instant, HalPageInfo,
    UpstreamConfig,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAddress {
    #[serde(default)]
    street_address1: String,
    #[serde(default)]
    street_address2: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    postal_code: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCreditAccount {
    #[serde(default)]
    outstanding_balance: Option<Decimal>,
    #[serde(default)]
    credit_days: Option<i64>,
    #[serde(default)]
    credit_limit: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLoyaltyCard {
    #[serde(default)]
    serial: String,
    #[serde(default)]
    points: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireClient {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    version: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    mobile: String,
    #[serde(default)]
    linked_client_mobile: String,
    #[serde(default)]
    land_line: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    address: WireAddress,
    #[serde(default)]
    birth_date: Option<String>,
    #[serde(default)]
    client_since: Option<String>,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    sms_marketing_consent: bool,
    #[serde(default)]
    email_marketing_consent: bool,
    #[serde(default)]
    sms_reminder_consent: bool,
    #[serde(default)]
    email_reminder_consent: bool,
    #[serde(default)]
    preferred_staff_id: String,
    #[serde(default)]
    external_id: String,
    #[serde(default)]
    creating_branch_id: String,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    banned: bool,
    #[serde(default)]
    client_category_ids: Vec<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    credit_account: Option<WireCreditAccount>,
    #[serde(default)]
    loyalty_card: Option<WireLoyaltyCard>,
    #[serde(default)]
    merged_to_client_id: String,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    first_visit: Option<String>,
    #[serde(default)]
    last_visit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireEmbedded {
    #[serde(default)]
    clients: Vec<WireClient>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(rename = "_embedded", default)]
    embedded: WireEmbedded,
    #[serde(default)]
    page: HalPageInfo,
}

pub struct ClientsClient {
    config: UpstreamConfig,
    http: HttpClient,
    page_size: i64,
}

impl ClientsClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            config,
            http: http::build_client(),
            page_size: http::DEFAULT_PAGE_SIZE,
        }
    }

    fn query(&self, updated_since: Option<DateTime<Utc>>, page: i64) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("size", clamp_page_size(self.page_size).to_string()),
            ("page", page.to_string()),
        ];
        if let Some(since) = updated_since {
            query.push(("updatedAfter", format_instant(since)));
        }
        query
    }
}

fn map_row(wire: WireClient) -> Client {
    let opt_instant = |raw: &Option<String>| raw.as_deref().and_then(parse_instant);
    let opt_date = |raw: &Option<String>| raw.as_deref().and_then(parse_date_loose);

    let (loyalty_card_serial, loyalty_points) = match &wire.loyalty_card {
        Some(card) => (card.serial.clone(), card.points),
        None => (String::new(), None),
    };
    let (credit_outstanding_balance, credit_days, credit_limit) = match &wire.credit_account {
        Some(acct) => (acct.outstanding_balance, acct.credit_days, acct.credit_limit),
        None => (None, None, None),
    };

    Client {
        client_id: wire.client_id,
        version: wire.version,
        first_name: wire.first_name,
        last_name: wire.last_name,
        mobile: wire.mobile,
        linked_client_mobile: wire.linked_client_mobile,
        land_line: wire.land_line,
        email: wire.email,
        street_address_1: wire.address.street_address1,
        street_address_2: wire.address.street_address2,
        city: wire.address.city,
        state: wire.address.state,
        postal_code: wire.address.postal_code,
        country: wire.address.country,
        birth_date: opt_date(&wire.birth_date),
        client_since: opt_date(&wire.client_since),
        gender: wire.gender,
        notes: wire.notes,
        sms_marketing_consent: wire.sms_marketing_consent,
        email_marketing_consent: wire.email_marketing_consent,
        sms_reminder_consent: wire.sms_reminder_consent,
        email_reminder_consent: wire.email_reminder_consent,
        preferred_staff_id: wire.preferred_staff_id,
        external_id: wire.external_id,
        creating_branch_id: wire.creating_branch_id,
        archived: wire.archived,
        banned: wire.banned,
        deleted: wire.deleted,
        merged_to_client_id: wire.merged_to_client_id,
        client_category_ids: wire.client_category_ids.join(","),
        first_visit: opt_instant(&wire.first_visit),
        last_visit: opt_instant(&wire.last_visit),
        photo_url: wire.photo_url.unwrap_or_default(),
        loyalty_card_serial,
        loyalty_points,
        credit_outstanding_balance,
        credit_days,
        credit_limit,
        created_at_upstream: opt_instant(&wire.created_at),
        updated_at_upstream: opt_instant(&wire.updated_at),
    }
}

#[async_trait]
impl Paginator for ClientsClient {
    type Item = Client;

    async fn fetch_page(
        &self,
        _scope: &str,
        _window: Option<DateWindow>,
        updated_since: Option<DateTime<Utc>>,
        page: i64,
    ) -> Result<FetchedPage<Client>> {
        let url = self.config.business_url("/client");
        let response: WireResponse = get_json(
            &self.http,
            &self.config,
            &url,
            &self.query(updated_since, page),
        )
        .await
        .map_err(Error::from)?;

        let rows = response.embedded.clients.into_iter().map(map_row).collect();
        Ok(FetchedPage {
            rows,
            total_pages: response.page.total_pages,
        })
    }
}
