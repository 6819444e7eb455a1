//! Shared wiring handed to every job.

use std::sync::Arc;

use datahub_core::settings::Settings;
use datahub_storage_postgres::{PgPool, WatermarkRepository};
use datahub_upstream::UpstreamConfig;

pub struct JobContext {
    pub settings: Arc<Settings>,
    pub pool: PgPool,
}

impl JobContext {
    pub fn new(settings: Settings, pool: PgPool) -> Self {
        Self {
            settings: Arc::new(settings),
            pool,
        }
    }

    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig::from(&self.settings.upstream)
    }

    pub fn watermarks(&self) -> WatermarkRepository {
        WatermarkRepository::new(self.pool.clone())
    }
}
