//! Event aggregation stage.
//!
//! # Responsibility
//! - Group events by exact `(user_id, activity_type)` and summarize each group.
//!
//! # Invariants
//! - Every input index lands in exactly one group.
//! - Output order is ascending by `(user_id, activity_type)`.
//! - Empty input yields an empty group list.

use crate::model::event::EmissionsEvent;
use crate::model::group::ActivityGroup;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Default)]
struct GroupAccumulator {
    total: f64,
    months: BTreeSet<u32>,
    weekdays: BTreeSet<u32>,
    indices: Vec<usize>,
}

impl GroupAccumulator {
    fn push(&mut self, index: usize, event: &EmissionsEvent) {
        self.total += event.amount;
        self.months.insert(event.month());
        self.weekdays.insert(event.weekday_index());
        self.indices.push(index);
    }

    fn finish(self, user_id: String, activity_type: String) -> ActivityGroup {
        let event_count = self.indices.len();
        ActivityGroup {
            user_id,
            activity_type,
            total_amount: self.total,
            mean_amount: self.total / event_count as f64,
            event_count,
            distinct_months: self.months.len(),
            distinct_weekdays: self.weekdays.len(),
            cluster: None,
            event_indices: self.indices,
        }
    }
}

/// Builds one `ActivityGroup` per distinct `(user_id, activity_type)` pair.
pub fn aggregate_events(events: &[EmissionsEvent]) -> Vec<ActivityGroup> {
    let mut groups: BTreeMap<(String, String), GroupAccumulator> = BTreeMap::new();
    for (index, event) in events.iter().enumerate() {
        groups
            .entry((event.user_id.clone(), event.activity_type.clone()))
            .or_default()
            .push(index, event);
    }

    groups
        .into_iter()
        .map(|((user_id, activity_type), acc)| acc.finish(user_id, activity_type))
        .collect()
}
