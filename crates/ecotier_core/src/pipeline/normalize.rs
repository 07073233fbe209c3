//! Per-column standardization.
//!
//! # Invariants
//! - Statistics are population statistics over the current batch only.
//! - A zero-variance column standardizes to exactly `0.0` for every row.

use super::features::{FeatureMatrix, FeatureRow, FEATURE_COUNT};

/// Relative spread below which a column counts as constant.
const ZERO_VARIANCE_RELATIVE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl ColumnStats {
    /// Overflowed statistics never count as constant, so they surface as
    /// non-finite scaled values.
    pub fn is_constant(&self) -> bool {
        self.mean.is_finite()
            && self.std_dev.is_finite()
            && self.std_dev <= ZERO_VARIANCE_RELATIVE_TOLERANCE * self.mean.abs().max(1.0)
    }

    fn scale(&self, value: f64) -> f64 {
        if self.is_constant() {
            0.0
        } else {
            (value - self.mean) / self.std_dev
        }
    }
}

/// Column statistics fitted on one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardizer {
    stats: [ColumnStats; FEATURE_COUNT],
}

impl Standardizer {
    pub fn fit(matrix: &FeatureMatrix) -> Self {
        let n = matrix.len().max(1) as f64;
        let stats = std::array::from_fn(|col| {
            let mean = matrix.column(col).sum::<f64>() / n;
            let variance = matrix
                .column(col)
                .map(|value| (value - mean).powi(2))
                .sum::<f64>()
                / n;
            ColumnStats {
                mean,
                std_dev: variance.sqrt(),
            }
        });
        Self { stats }
    }

    pub fn column_stats(&self) -> &[ColumnStats; FEATURE_COUNT] {
        &self.stats
    }

    pub fn transform(&self, matrix: &FeatureMatrix) -> FeatureMatrix {
        let rows = matrix
            .rows()
            .iter()
            .map(|row| -> FeatureRow { std::array::from_fn(|col| self.stats[col].scale(row[col])) })
            .collect();
        FeatureMatrix::from_rows(rows)
    }
}

/// Fits and applies a standardizer in one step.
pub fn standardize(matrix: &FeatureMatrix) -> FeatureMatrix {
    Standardizer::fit(matrix).transform(matrix)
}
