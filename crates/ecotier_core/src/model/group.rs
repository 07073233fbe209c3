//! Per-(user, activity) aggregate model.
//!
//! # Responsibility
//! - Hold the summary statistics clustering and synthesis operate on.
//! - Translate cluster labels into emissions tiers.
//!
//! # Invariants
//! - `event_count >= 1` and `event_indices.len() == event_count`.
//! - `cluster` is `None` until the clustering stage assigns it.

use serde::{Deserialize, Serialize};

/// Label the synthesizer reads as the low tier; also used for underflow.
pub const LOW_TIER_LABEL: usize = 2;

/// Emissions tier carried by a cluster label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionsTier {
    High,
    Medium,
    Low,
}

impl EmissionsTier {
    /// Maps a cluster label with the fixed 0/1/other convention.
    pub fn from_cluster_label(label: usize) -> Self {
        match label {
            0 => Self::High,
            1 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn cluster_label(self) -> usize {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => LOW_TIER_LABEL,
        }
    }
}

/// Aggregated statistics for one user's activity type over a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityGroup {
    pub user_id: String,
    pub activity_type: String,
    pub total_amount: f64,
    pub mean_amount: f64,
    pub event_count: usize,
    pub distinct_months: usize,
    pub distinct_weekdays: usize,
    pub cluster: Option<usize>,
    /// Positions of the originating events in the input batch.
    pub event_indices: Vec<usize>,
}

impl ActivityGroup {
    /// Tier implied by the assigned cluster label, if any.
    pub fn tier(&self) -> Option<EmissionsTier> {
        self.cluster.map(EmissionsTier::from_cluster_label)
    }
}

#[cfg(test)]
mod tests {
    use super::EmissionsTier;

    #[test]
    fn labels_map_to_fixed_tiers() {
        assert_eq!(EmissionsTier::from_cluster_label(0), EmissionsTier::High);
        assert_eq!(EmissionsTier::from_cluster_label(1), EmissionsTier::Medium);
        assert_eq!(EmissionsTier::from_cluster_label(2), EmissionsTier::Low);
        assert_eq!(EmissionsTier::from_cluster_label(7), EmissionsTier::Low);
    }

    #[test]
    fn tier_label_round_trips() {
        for tier in [EmissionsTier::High, EmissionsTier::Medium, EmissionsTier::Low] {
            assert_eq!(EmissionsTier::from_cluster_label(tier.cluster_label()), tier);
        }
    }
}
