//! Domain models for the registrar.
//!
//! # Core Concepts
//!
//! - [`Course`]: A catalog offering with a raw schedule string, a room and a
//!   seat capacity. Enrollment counts are derived from registrations.
//! - [`Student`]: Someone who registers for courses.
//! - [`Registration`]: Links a student to a course with a status. Only rows
//!   with status `registered` hold a seat.
//!
//! Conflict reports and week projections live in [`crate::engine`]; they are
//! computed on demand and never stored.

mod course;
mod registration;
mod stats;
mod student;

pub use course::*;
pub use registration::*;
pub use stats::*;
pub use student::*;
