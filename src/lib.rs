//! Course registration service with schedule-conflict detection.
//!
//! - [`engine`]: schedule parsing, overlap detection, conflict classification
//!   and the weekly grid projection
//! - [`db`]: SQLite persistence and the registration gate
//! - [`api`]: HTTP API
//! - [`client`] and [`render`]: used by the CLI

pub mod api;
pub mod client;
pub mod db;
pub mod engine;
pub mod models;
pub mod render;
