//! Pipeline-level error contract.
//!
//! # Invariants
//! - Any error aborts the whole batch; no partial recommendation list is
//!   ever returned alongside an error.

use crate::config::ConfigError;
use crate::model::event::EventValidationError;
use crate::pipeline::cluster::ClusterError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug)]
pub enum PipelineError {
    /// Event at `index` of the input batch failed validation.
    InvalidEvent {
        index: usize,
        source: EventValidationError,
    },
    /// Feature construction was asked to run over zero groups.
    EmptyFeatureSet,
    /// A group's summed or mean amount overflowed to a non-finite value.
    NonFiniteAggregate {
        user_id: String,
        activity_type: String,
    },
    Config(ConfigError),
    Clustering(ClusterError),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEvent { index, source } => {
                write!(f, "invalid emissions event at index {index}: {source}")
            }
            Self::EmptyFeatureSet => {
                write!(f, "cannot build features from an empty activity group set")
            }
            Self::NonFiniteAggregate {
                user_id,
                activity_type,
            } => write!(
                f,
                "aggregate amount for user `{user_id}` activity `{activity_type}` is not finite"
            ),
            Self::Config(err) => write!(f, "{err}"),
            Self::Clustering(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEvent { source, .. } => Some(source),
            Self::EmptyFeatureSet | Self::NonFiniteAggregate { .. } => None,
            Self::Config(err) => Some(err),
            Self::Clustering(err) => Some(err),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ClusterError> for PipelineError {
    fn from(value: ClusterError) -> Self {
        Self::Clustering(value)
    }
}
