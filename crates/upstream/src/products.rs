//! Product catalogue page fetcher. Branch-scoped full sweep.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use datahub_core::models::Product;
use datahub_core::sync::{DateWindow, FetchedPage, Paginator};
use datahub_core::{Error, Result};

use crate::http::{self, clamp_page_size, get_json, parse_instant, HalPageInfo, UpstreamConfig};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProduct {
    #[serde(default)]
    product_id: String,
    #[serde(default)]
    version: i64,
    #[serde(default)]
    barcode: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    brand: String,
    #[serde(default)]
    category_id: String,
    #[serde(default)]
    price: Decimal,
    #[serde(default)]
    special_price: Option<Decimal>,
    #[serde(default)]
    stock_quantity: Option<i32>,
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
    products: Vec<WireProduct>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(rename = "_embedded", default)]
    embedded: WireEmbedded,
    #[serde(default)]
    page: HalPageInfo,
}

pub struct ProductsClient {
    config: UpstreamConfig,
    http: Client,
    page_size: i64,
}

impl ProductsClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            config,
            http: http::build_client(),
            page_size: http::DEFAULT_PAGE_SIZE,
        }
    }
}

fn map_row(branch_id: &str, wire: WireProduct) -> Product {
    let opt_instant = |raw: &Option<String>| raw.as_deref().and_then(parse_instant);
    Product {
        branch_id: branch_id.to_string(),
        product_id: wire.product_id,
        version: wire.version,
        barcode: wire.barcode,
        name: wire.name,
        brand: wire.brand,
        category_id: wire.category_id,
        price: wire.price,
        special_price: wire.special_price,
        stock_quantity: wire.stock_quantity,
        archived: wire.archived,
        created_at_upstream: opt_instant(&wire.created_at),
        updated_at_upstream: opt_instant(&wire.updated_at),
    }
}

#[async_trait]
impl Paginator for ProductsClient {
    type Item = Product;

    async fn fetch_page(
        &self,
        scope: &str,
        _window: Option<DateWindow>,
        _updated_since: Option<DateTime<Utc>>,
        page: i64,
    ) -> Result<FetchedPage<Product>> {
        let url = self.config.branch_url(scope, "/product");
        let query = vec![
            ("size", clamp_page_size(self.page_size).to_string()),
            ("page", page.to_string()),
        ];
        let response: WireResponse = get_json(&self.http, &self.config, &url, &query)
            .await
            .map_err(Error::from)?;

        let rows = response
            .embedded
            .products
            .into_iter()
            .map(|wire| map_row(scope, wire))
            .collect();
        Ok(FetchedPage {
            rows,
            total_pages: response.page.total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::FromPrimitive;

    use super::*;

    #[test]
    fn product_rows_decode_into_the_domain() {
        let body = r#"{
            "_embedded": {
                "products": [{
                    "productId": "pr-1",
                    "version": 9,
                    "barcode": "5011417559744",
                    "name": "Silver Shampoo 250ml",
                    "brand": "Acme",
                    "categoryId": "retail",
                    "price": 14.95,
                    "stockQuantity": 12,
                    "updatedAt": "2024-02-11T09:00:00.000Z"
                }]
            },
            "page": {"size": 100, "totalElements": 1, "totalPages": 1, "number": 0}
        }"#;
        let response: WireResponse = serde_json::from_str(body).unwrap();
        let row = map_row("br-1", response.embedded.products.into_iter().next().unwrap());
        assert_eq!(row.barcode, "5011417559744");
        assert_eq!(row.price, Decimal::from_f64(14.95).unwrap());
        assert_eq!(row.stock_quantity, Some(12));
        assert_eq!(row.special_price, None);
    }
}
