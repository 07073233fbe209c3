//! Rule-based recommendation synthesis.
//!
//! # Responsibility
//! - Map `(tier, activity_type)` to a fixed recommendation template.
//!
//! # Invariants
//! - At most one recommendation per group.
//! - Output order follows input group order.
//! - Groups without an assigned cluster produce nothing.

use crate::model::group::{ActivityGroup, EmissionsTier};
use crate::model::recommendation::{Recommendation, RecommendationCategory};

pub const TRANSPORTATION_ACTIVITY: &str = "Transportation";
pub const ENERGY_ACTIVITY: &str = "Energy";
pub const DAILY_HABITS_ACTIVITY: &str = "Daily Habits";

pub const TRANSPORTATION_TEXT: &str =
    "Consider using public transportation or carpooling to reduce your transportation emissions.";
pub const ENERGY_TEXT: &str =
    "Switch to energy-efficient appliances and consider renewable energy sources.";
pub const DAILY_HABITS_TEXT: &str =
    "Reduce single-use plastics and practice recycling to lower your daily emissions.";
pub const GENERAL_TEXT: &str =
    "Great job on maintaining low emissions! Consider sharing your sustainable practices with others.";
pub const MAINTAIN_IMPACT: &str = "Maintain current levels";

const TRANSPORTATION_REDUCTION: f64 = 0.30;
const ENERGY_REDUCTION: f64 = 0.25;
const DAILY_HABITS_REDUCTION: f64 = 0.20;

/// One decision-table cell with a recommendation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rule {
    category: RecommendationCategory,
    text: &'static str,
    /// `None` means fixed text without a numeric estimate.
    reduction: Option<f64>,
}

fn rule_for(tier: EmissionsTier, activity_type: &str) -> Option<Rule> {
    match (tier, activity_type) {
        (EmissionsTier::High, TRANSPORTATION_ACTIVITY) => Some(Rule {
            category: RecommendationCategory::Transportation,
            text: TRANSPORTATION_TEXT,
            reduction: Some(TRANSPORTATION_REDUCTION),
        }),
        (EmissionsTier::High, ENERGY_ACTIVITY) => Some(Rule {
            category: RecommendationCategory::Energy,
            text: ENERGY_TEXT,
            reduction: Some(ENERGY_REDUCTION),
        }),
        (EmissionsTier::Medium, DAILY_HABITS_ACTIVITY) => Some(Rule {
            category: RecommendationCategory::DailyHabits,
            text: DAILY_HABITS_TEXT,
            reduction: Some(DAILY_HABITS_REDUCTION),
        }),
        (EmissionsTier::Low, _) => Some(Rule {
            category: RecommendationCategory::General,
            text: GENERAL_TEXT,
            reduction: None,
        }),
        _ => None,
    }
}

/// Formats a reduction amount as `Potential reduction: <x.xx> kg CO₂ per month`.
pub fn format_impact(reduction_kg: f64) -> String {
    format!("Potential reduction: {reduction_kg:.2} kg CO₂ per month")
}

/// Applies the decision table for an explicit tier.
pub fn recommend(
    user_id: &str,
    activity_type: &str,
    total_amount: f64,
    tier: EmissionsTier,
) -> Option<Recommendation> {
    let rule = rule_for(tier, activity_type)?;
    let impact_estimate = match rule.reduction {
        Some(fraction) => format_impact(total_amount * fraction),
        None => MAINTAIN_IMPACT.to_string(),
    };
    Some(Recommendation {
        user_id: user_id.to_string(),
        category: rule.category,
        recommendation_text: rule.text.to_string(),
        impact_estimate,
    })
}

/// Synthesizes the recommendation for one clustered group.
pub fn synthesize(group: &ActivityGroup) -> Option<Recommendation> {
    let tier = group.tier()?;
    recommend(&group.user_id, &group.activity_type, group.total_amount, tier)
}

pub fn synthesize_all(groups: &[ActivityGroup]) -> Vec<Recommendation> {
    groups.iter().filter_map(synthesize).collect()
}
