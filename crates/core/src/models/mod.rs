//! Domain models for every mirrored upstream entity.
//!
//! These are plain data carriers: the HTTP crate decodes wire payloads into
//! them and the storage crate maps them onto warehouse rows. Identity is one
//! field for business-wide entities and `(branch_id, <entity>_id)` for
//! branch-scoped ones.

mod appointment;
mod client;
mod product;
mod review;
mod staff;
mod timetable;
mod work_break;

pub use appointment::Appointment;
pub use client::Client;
pub use product::Product;
pub use review::Review;
pub use staff::StaffMember;
pub use timetable::TimetableSlot;
pub use work_break::WorkBreak;
