//! Schedule-conflict detection and week-grid engine.
//!
//! Everything here is a pure function of its inputs: no I/O, no locks, no
//! cached state. Callers pass a snapshot of courses, and every call
//! recomputes from scratch.
//!
//! Data flows one way:
//!
//! ```text
//! Course.schedule ──parse_schedule──▶ [MeetingInterval]
//!                                       │
//!                ┌──────────────────────┴───────────────┐
//!                ▼                                      ▼
//!   classify / classify_all ──▶ [ConflictReport]   project_week ──▶ WeekProjection
//! ```

mod classifier;
mod grid;
mod overlap;
mod schedule;

pub use classifier::*;
pub use grid::*;
pub use overlap::*;
pub use schedule::*;
