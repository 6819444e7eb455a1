//! Pool construction, health check and embedded migrations.

use std::time::Duration;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

use datahub_core::Result;

use crate::errors::StorageError;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const DEFAULT_POOL_SIZE: u32 = 10;

pub fn establish_pool(database_url: &str) -> Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(DEFAULT_POOL_SIZE)
        .build(manager)
        .map_err(StorageError::from)
        .map_err(datahub_core::Error::from)?;
    Ok(pool)
}

pub fn get_connection(pool: &PgPool) -> Result<PgPooledConnection> {
    pool.get()
        .map_err(StorageError::from)
        .map_err(datahub_core::Error::from)
}

/// Cheap round-trip to fail fast at startup when the DSN is wrong or the
/// warehouse is down.
pub fn health_check(pool: &PgPool, timeout: Duration) -> Result<()> {
    let mut conn = pool
        .get_timeout(timeout)
        .map_err(StorageError::from)
        .map_err(datahub_core::Error::from)?;
    diesel::sql_query("SELECT 1")
        .execute(&mut conn)
        .map_err(StorageError::from)?;
    Ok(())
}

/// Apply any pending embedded migrations (`AUTO_MIGRATE=1`).
pub fn run_migrations(pool: &PgPool) -> Result<()> {
    let mut conn = get_connection(pool)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| StorageError::Migration(err.to_string()))?;
    for version in &applied {
        info!(%version, "applied migration");
    }
    Ok(())
}
