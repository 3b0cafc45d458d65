//! Shared domain model for the fieldline daemon and its client apps.
//!
//! Everything here is pure: the stage engine, checklist policy, and ETA
//! derivation operate on explicit state and return values. I/O (the timeline
//! gateway, countdown timers) lives in the consumer crates.

pub mod api;
pub mod backoff;
pub mod checklist;
pub mod engine;
pub mod eta;
pub mod flow;
pub mod model;
pub mod time;

pub use engine::*;
pub use flow::*;
pub use model::*;
pub use time::*;
