//! Cluster label to tier alignment.
//!
//! # Responsibility
//! - Decide whether raw k-means labels are trusted or re-ranked so that label
//!   0 is the highest-emission cluster.
//!
//! # Invariants
//! - Relabeling is a bijection on `[0, k)`; it never merges clusters.
//! - Ranking is by mean `total_amount` descending, ties by raw label.

use crate::model::group::ActivityGroup;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TierLabeling {
    /// Rank clusters by mean total emissions before reading tiers.
    #[default]
    RankedByTotal,
    /// Read the raw k-means label directly.
    RawLabel,
}

impl TierLabeling {
    /// Accepts `snake_case` or `camelCase` spellings.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "ranked_by_total" | "rankedByTotal" | "ranked" => Some(Self::RankedByTotal),
            "raw_label" | "rawLabel" | "raw" => Some(Self::RawLabel),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RankedByTotal => "ranked_by_total",
            Self::RawLabel => "raw_label",
        }
    }
}

/// Maps raw labels so the cluster with the largest mean `total_amount` gets 0.
///
/// Clusters with no members rank after every populated cluster.
pub fn rank_labels_by_total(groups: &[ActivityGroup], assignments: &[usize], k: usize) -> Vec<usize> {
    let mut sums = vec![0.0; k];
    let mut counts = vec![0usize; k];
    for (group, &label) in groups.iter().zip(assignments) {
        sums[label] += group.total_amount;
        counts[label] += 1;
    }

    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| {
        let mean = |label: usize| (counts[label] > 0).then(|| sums[label] / counts[label] as f64);
        let by_mean = match (mean(a), mean(b)) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_mean.then(a.cmp(&b))
    });

    let mut remap = vec![0; k];
    for (rank, raw) in order.into_iter().enumerate() {
        remap[raw] = rank;
    }
    assignments.iter().map(|&label| remap[label]).collect()
}
