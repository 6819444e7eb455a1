//! One module per named job. Each binds an upstream fetcher and a
//! repository into the generic sync loops (or the reconcile engine) with
//! its per-entity tuning read from the environment.

pub mod appointments;
pub mod breaks;
pub mod clients;
pub mod products;
pub mod reviews;
pub mod staff;
pub mod stock;
pub mod timetable;
