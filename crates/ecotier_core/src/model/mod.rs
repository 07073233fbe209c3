//! Domain model for the recommendation pipeline.
//!
//! # Responsibility
//! - Define the input event, the derived activity group and the output
//!   recommendation as explicit, typed records.
//!
//! # Invariants
//! - Input events are immutable once validated.
//! - Every activity group derives from at least one event.

pub mod event;
pub mod group;
pub mod recommendation;
