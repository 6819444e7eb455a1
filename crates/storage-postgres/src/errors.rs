//! Storage-side error wrapper, folded into the core taxonomy at the crate
//! boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("connection pool: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("query: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("connection: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("migration: {0}")]
    Migration(String),
}

impl From<StorageError> for datahub_core::Error {
    fn from(err: StorageError) -> Self {
        datahub_core::Error::Db(err.to_string())
    }
}
