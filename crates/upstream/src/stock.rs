//! Stock adjustment POST client.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use datahub_core::reconcile::{StockAdjuster, StockAdjustmentRequest};
use datahub_core::{Error, Result};

use crate::error::UpstreamError;
use crate::http::{self, UpstreamConfig};

const ERROR_BODY_LIMIT: usize = 4096;

/// POSTs `{ "stocks": [...] }` to
/// `/business/{business}/branch/{branch}/stock/adjustment`.
///
/// The endpoint is assumed idempotent per request on the provider side: the
/// reconcile engine records its transfer marks only after a successful POST,
/// so a crash in between re-sends the same payload on the next run.
pub struct HttpStockAdjuster {
    config: UpstreamConfig,
    http: Client,
}

impl HttpStockAdjuster {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            config,
            http: http::build_client(),
        }
    }

    fn adjustment_url(&self, branch_id: &str) -> String {
        self.config.branch_url(branch_id, "/stock/adjustment")
    }

    async fn post(&self, branch_id: &str, request: &StockAdjustmentRequest) -> Result<()> {
        if branch_id.is_empty() {
            return Err(Error::config("stock adjustment requires a branch id"));
        }

        let response = self
            .http
            .post(self.adjustment_url(branch_id))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|err| Error::from(UpstreamError::from(err)))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > ERROR_BODY_LIMIT {
                let mut cut = ERROR_BODY_LIMIT;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StockAdjuster for HttpStockAdjuster {
    async fn adjust_stock(&self, branch_id: &str, request: &StockAdjustmentRequest) -> Result<()> {
        self.post(branch_id, request).await
    }
}
