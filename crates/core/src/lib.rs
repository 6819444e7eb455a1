//! Core domain for the salon data hub: entity models, the incremental sync
//! engine, and the stock reconciliation engine.
//!
//! This crate is I/O free. HTTP fetchers and warehouse repositories live in
//! sibling crates and plug into the trait seams defined under [`sync`] and
//! [`reconcile`].

pub mod errors;
pub mod models;
pub mod reconcile;
pub mod settings;
pub mod sync;

pub use errors::{Error, Result};
