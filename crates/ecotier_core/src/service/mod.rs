//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate pipeline stages into batch-level entry points.
//! - Keep CLI and other adapters decoupled from stage details.

pub mod recommendation_service;
