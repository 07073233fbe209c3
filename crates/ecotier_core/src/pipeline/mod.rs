//! Batch pipeline stages.
//!
//! # Responsibility
//! - Aggregate events, build and standardize features, cluster, and
//!   synthesize recommendations as independent pure functions.
//!
//! # Invariants
//! - No stage keeps state between calls.
//! - Stages never reorder groups; index `i` means the same group throughout.

pub mod aggregate;
pub mod cluster;
pub mod features;
pub mod normalize;
pub mod synthesize;
pub mod tiering;
