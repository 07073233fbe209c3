//! Recommendation use-case service.
//!
//! # Responsibility
//! - Run the full pipeline for one batch under a validated config.
//! - Apply the underflow policy and tier labeling mode.
//!
//! # Invariants
//! - A batch with any invalid event fails as a whole.
//! - A batch whose aggregates or scaled features are not finite fails as a
//!   whole instead of being labelled.
//! - An empty batch returns an empty output, never an error.
//! - Fewer distinct feature rows than clusters puts every group in the low
//!   tier without running k-means.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::model::event::EmissionsEvent;
use crate::model::group::{ActivityGroup, EmissionsTier};
use crate::model::recommendation::Recommendation;
use crate::pipeline::aggregate::aggregate_events;
use crate::pipeline::cluster::{kmeans, ClusterError};
use crate::pipeline::features::build_features;
use crate::pipeline::normalize::standardize;
use crate::pipeline::synthesize::synthesize_all;
use crate::pipeline::tiering::{rank_labels_by_total, TierLabeling};
use log::{debug, info, warn};
use serde::Serialize;

/// How the clustering stage behaved for one batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteringSummary {
    /// Clusters k-means actually formed; 0 when clustering was skipped.
    pub effective_clusters: usize,
    pub iterations: usize,
    pub converged: bool,
    /// True when the low-tier fallback replaced clustering.
    pub underflow: bool,
    pub inertia: f64,
}

/// Labelled groups plus the recommendations derived from them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    pub groups: Vec<ActivityGroup>,
    pub recommendations: Vec<Recommendation>,
    pub clustering: ClusteringSummary,
}

/// Use-case service wrapping one pipeline configuration.
#[derive(Debug, Clone, Default)]
pub struct RecommendationService {
    config: PipelineConfig,
}

impl RecommendationService {
    /// Creates a service after validating `config`.
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Produces only the recommendation list.
    pub fn generate(&self, events: &[EmissionsEvent]) -> PipelineResult<Vec<Recommendation>> {
        self.run(events).map(|output| output.recommendations)
    }

    /// Runs every stage and returns the intermediate groups too.
    pub fn run(&self, events: &[EmissionsEvent]) -> PipelineResult<PipelineOutput> {
        for (index, event) in events.iter().enumerate() {
            event
                .validate()
                .map_err(|source| PipelineError::InvalidEvent { index, source })?;
        }
        debug!(
            "event=pipeline_start module=pipeline status=ok events={} clusters={} seed={} labeling={}",
            events.len(),
            self.config.cluster_count,
            self.config.seed,
            self.config.tier_labeling.as_str()
        );

        let mut groups = aggregate_events(events);
        if groups.is_empty() {
            info!("event=pipeline_run module=pipeline status=ok events=0 groups=0 recommendations=0");
            return Ok(PipelineOutput::default());
        }

        let (labels, clustering) = self.label_groups(&groups)?;
        for (group, label) in groups.iter_mut().zip(labels) {
            group.cluster = Some(label);
        }

        let recommendations = synthesize_all(&groups);
        info!(
            "event=pipeline_run module=pipeline status={} events={} groups={} recommendations={} iterations={}",
            if clustering.underflow { "degraded" } else { "ok" },
            events.len(),
            groups.len(),
            recommendations.len(),
            clustering.iterations
        );

        Ok(PipelineOutput {
            groups,
            recommendations,
            clustering,
        })
    }

    fn label_groups(&self, groups: &[ActivityGroup]) -> PipelineResult<(Vec<usize>, ClusteringSummary)> {
        let scaled = standardize(&build_features(groups)?);
        // Column sums of finite values can still overflow during scaling.
        if let Some(index) = scaled
            .rows()
            .iter()
            .position(|row| row.iter().any(|value| !value.is_finite()))
        {
            return Err(ClusterError::NonFinitePoint { index }.into());
        }
        let k = self.config.cluster_count;
        let distinct = scaled.distinct_row_count();
        if distinct < k {
            warn!(
                "event=cluster_underflow module=pipeline status=degraded groups={} distinct={} clusters={} fallback=low_tier",
                groups.len(),
                distinct,
                k
            );
            let summary = ClusteringSummary {
                underflow: true,
                ..ClusteringSummary::default()
            };
            return Ok((vec![EmissionsTier::Low.cluster_label(); groups.len()], summary));
        }

        let clustering = kmeans(scaled.rows(), &self.config.kmeans_params())?;
        let labels = match self.config.tier_labeling {
            TierLabeling::RawLabel => clustering.assignments.clone(),
            TierLabeling::RankedByTotal => {
                rank_labels_by_total(groups, &clustering.assignments, k)
            }
        };

        let summary = ClusteringSummary {
            effective_clusters: k,
            iterations: clustering.iterations,
            converged: clustering.converged,
            underflow: false,
            inertia: clustering.inertia,
        };
        Ok((labels, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::RecommendationService;
    use crate::config::PipelineConfig;
    use crate::error::PipelineError;
    use crate::model::group::EmissionsTier;

    #[test]
    fn new_rejects_invalid_config() {
        let config = PipelineConfig {
            restarts: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            RecommendationService::new(config),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn new_keeps_the_validated_config() {
        let config = PipelineConfig {
            seed: 9,
            ..PipelineConfig::default()
        };
        let service = RecommendationService::new(config.clone()).unwrap();
        assert_eq!(service.config(), &config);
    }

    #[test]
    fn underflow_labels_use_the_low_tier() {
        let events = vec![crate::model::event::EmissionsEvent::new(
            "u1",
            "Energy",
            4.0,
            crate::model::event::parse_timestamp("2024-01-01").unwrap(),
        )
        .unwrap()];
        let output = RecommendationService::default().run(&events).unwrap();
        assert!(output.clustering.underflow);
        assert_eq!(output.groups[0].cluster, Some(EmissionsTier::Low.cluster_label()));
    }

    #[test]
    fn empty_batch_short_circuits() {
        let output = RecommendationService::default().run(&[]).unwrap();
        assert!(output.groups.is_empty());
        assert!(output.recommendations.is_empty());
        assert!(!output.clustering.underflow);
    }
}
