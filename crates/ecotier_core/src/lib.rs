//! Core pipeline for ecotier.
//! Turns a batch of emissions events into tiered, rule-based recommendations.

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod service;

pub use config::{ConfigError, PipelineConfig};
pub use error::{PipelineError, PipelineResult};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogSink,
};
pub use model::event::{parse_timestamp, EmissionsEvent, EventValidationError};
pub use model::group::{ActivityGroup, EmissionsTier};
pub use model::recommendation::{Recommendation, RecommendationCategory};
pub use pipeline::cluster::{assign_clusters, kmeans, ClusterError, Clustering, KMeansParams};
pub use pipeline::tiering::TierLabeling;
pub use service::recommendation_service::{
    ClusteringSummary, PipelineOutput, RecommendationService,
};

/// Runs the pipeline with the default configuration.
pub fn generate_recommendations(events: &[EmissionsEvent]) -> PipelineResult<Vec<Recommendation>> {
    RecommendationService::default().generate(events)
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, generate_recommendations};

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn empty_input_yields_empty_list() {
        assert!(generate_recommendations(&[]).unwrap().is_empty());
    }
}
