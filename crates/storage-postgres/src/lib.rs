//! PostgreSQL warehouse for the salon data hub.
//!
//! One repository per mirrored entity, the watermark store and the stock
//! reconcile store. Version-gated upserts implement newest-wins semantics:
//! stale pages from wide cursor windows can never overwrite fresher data.

#[macro_use]
mod upsert;

pub mod appointments;
pub mod clients;
pub mod db;
pub mod errors;
pub mod products;
pub mod reviews;
pub mod schema;
pub mod staff;
pub mod stock;
pub mod timetable;
pub mod watermarks;
pub mod work_breaks;

pub use appointments::AppointmentRepository;
pub use clients::ClientRepository;
pub use db::{establish_pool, get_connection, health_check, run_migrations, PgPool};
pub use errors::StorageError;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use staff::StaffRepository;
pub use stock::StockReconcileRepository;
pub use timetable::TimetableRepository;
pub use watermarks::WatermarkRepository;
pub use work_breaks::WorkBreakRepository;
