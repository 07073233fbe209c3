//! Recommendation output model.
//!
//! # Invariants
//! - Built once by the synthesizer; never merged across groups of one user.

use serde::{Deserialize, Serialize};

/// Category a recommendation is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationCategory {
    Transportation,
    Energy,
    #[serde(rename = "Daily Habits")]
    DailyHabits,
    General,
}

impl RecommendationCategory {
    /// External display name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transportation => "Transportation",
            Self::Energy => "Energy",
            Self::DailyHabits => "Daily Habits",
            Self::General => "General",
        }
    }
}

/// One textual recommendation for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub user_id: String,
    pub category: RecommendationCategory,
    pub recommendation_text: String,
    pub impact_estimate: String,
}
