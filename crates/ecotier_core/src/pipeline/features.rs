//! Feature construction stage.
//!
//! # Invariants
//! - Column order is `FEATURE_COLUMNS` for every row.
//! - Row `i` describes group `i` of the input slice.
//! - Every value in a built matrix is finite.

use crate::error::{PipelineError, PipelineResult};
use crate::model::group::ActivityGroup;
use std::collections::BTreeSet;

pub const FEATURE_COUNT: usize = 5;

pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "total_amount",
    "mean_amount",
    "event_count",
    "distinct_months",
    "distinct_weekdays",
];

pub type FeatureRow = [f64; FEATURE_COUNT];

/// Dense row-major feature matrix, one row per activity group.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<FeatureRow>,
}

impl FeatureMatrix {
    pub fn from_rows(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |row| row[index])
    }

    /// Number of bitwise-distinct rows.
    pub fn distinct_row_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| (*row).map(f64::to_bits))
            .collect::<BTreeSet<_>>()
            .len()
    }
}

pub fn feature_row(group: &ActivityGroup) -> FeatureRow {
    [
        group.total_amount,
        group.mean_amount,
        group.event_count as f64,
        group.distinct_months as f64,
        group.distinct_weekdays as f64,
    ]
}

/// Builds the feature matrix; zero groups is an error the caller must avoid.
///
/// # Errors
/// - `EmptyFeatureSet` for an empty group slice.
/// - `NonFiniteAggregate` when a group's sum overflowed.
pub fn build_features(groups: &[ActivityGroup]) -> PipelineResult<FeatureMatrix> {
    if groups.is_empty() {
        return Err(PipelineError::EmptyFeatureSet);
    }
    let mut rows = Vec::with_capacity(groups.len());
    for group in groups {
        let row = feature_row(group);
        if row.iter().any(|value| !value.is_finite()) {
            return Err(PipelineError::NonFiniteAggregate {
                user_id: group.user_id.clone(),
                activity_type: group.activity_type.clone(),
            });
        }
        rows.push(row);
    }
    Ok(FeatureMatrix::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::{build_features, FeatureMatrix};
    use crate::error::PipelineError;
    use crate::model::group::ActivityGroup;

    #[test]
    fn empty_group_set_is_rejected() {
        assert!(matches!(
            build_features(&[]),
            Err(PipelineError::EmptyFeatureSet)
        ));
    }

    #[test]
    fn overflowed_total_is_rejected() {
        let group = ActivityGroup {
            user_id: "a".to_string(),
            activity_type: "Energy".to_string(),
            total_amount: f64::INFINITY,
            mean_amount: f64::INFINITY,
            event_count: 2,
            distinct_months: 1,
            distinct_weekdays: 1,
            cluster: None,
            event_indices: vec![0, 1],
        };
        match build_features(&[group]) {
            Err(PipelineError::NonFiniteAggregate {
                user_id,
                activity_type,
            }) => {
                assert_eq!(user_id, "a");
                assert_eq!(activity_type, "Energy");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn distinct_row_count_collapses_duplicates() {
        let matrix = FeatureMatrix::from_rows(vec![
            [1.0, 1.0, 1.0, 1.0, 1.0],
            [1.0, 1.0, 1.0, 1.0, 1.0],
            [2.0, 1.0, 1.0, 1.0, 1.0],
        ]);
        assert_eq!(matrix.distinct_row_count(), 2);
        assert_eq!(matrix.column(0).collect::<Vec<_>>(), vec![1.0, 1.0, 2.0]);
    }
}
