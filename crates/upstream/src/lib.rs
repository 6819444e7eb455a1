//! Typed page-fetchers for the upstream salon-management API.
//!
//! One client per entity; each handles URL templating, HTTP Basic auth and
//! HAL response decoding, and implements the [`datahub_core::sync::Paginator`]
//! seam so the generic sync loops can drive it. The stock adjustment POST
//! client lives in [`stock`].

mod appointments;
mod breaks;
mod clients;
mod error;
mod http;
mod products;
mod reviews;
mod staff;
mod stock;
mod timetable;

pub use appointments::{AppointmentFetchFlags, AppointmentsClient};
pub use breaks::{BreakFilters, BreaksClient};
pub use clients::ClientsClient;
pub use error::UpstreamError;
pub use http::UpstreamConfig;
pub use products::ProductsClient;
pub use reviews::ReviewsClient;
pub use staff::StaffClient;
pub use stock::HttpStockAdjuster;
pub use timetable::TimetableClient;
