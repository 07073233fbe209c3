use ecotier_core::{
    generate_recommendations, parse_timestamp, ClusterError, EmissionsEvent, EmissionsTier,
    PipelineConfig, PipelineError, RecommendationCategory, RecommendationService, TierLabeling,
};

const DATES: [&str; 4] = [
    "2024-01-02T08:00:00Z",
    "2024-01-09T08:00:00Z",
    "2024-02-06T08:00:00Z",
    "2024-02-13T08:00:00Z",
];

fn event(user: &str, activity: &str, amount: f64, ts: &str) -> EmissionsEvent {
    EmissionsEvent::new(user, activity, amount, parse_timestamp(ts).unwrap()).unwrap()
}

/// Three users with clearly separated transportation, habit and energy totals.
fn tiered_batch() -> Vec<EmissionsEvent> {
    let mut events = Vec::new();
    for (user, scale) in [("alice", 1.0), ("bob", 1.02), ("carol", 0.98)] {
        for ts in DATES {
            events.push(event(user, "Transportation", 500.0 * scale, ts));
            events.push(event(user, "Daily Habits", 50.0 * scale, ts));
            events.push(event(user, "Energy", 5.0 * scale, ts));
        }
    }
    events
}

#[test]
fn empty_batch_returns_empty_list() {
    assert!(generate_recommendations(&[]).unwrap().is_empty());
}

#[test]
fn ranked_labels_put_highest_totals_in_high_tier() {
    let output = RecommendationService::default().run(&tiered_batch()).unwrap();
    assert!(!output.clustering.underflow);
    assert_eq!(output.clustering.effective_clusters, 3);
    assert_eq!(output.groups.len(), 9);

    for group in &output.groups {
        let expected = match group.activity_type.as_str() {
            "Transportation" => EmissionsTier::High,
            "Daily Habits" => EmissionsTier::Medium,
            _ => EmissionsTier::Low,
        };
        assert_eq!(group.tier(), Some(expected), "{group:?}");
    }

    let recs = &output.recommendations;
    assert_eq!(recs.len(), 9);
    let count = |category| recs.iter().filter(|r| r.category == category).count();
    assert_eq!(count(RecommendationCategory::Transportation), 3);
    assert_eq!(count(RecommendationCategory::DailyHabits), 3);
    assert_eq!(count(RecommendationCategory::General), 3);

    // Group order: alice/Daily Habits, alice/Energy, alice/Transportation, ...
    assert_eq!(recs[0].user_id, "alice");
    assert_eq!(recs[0].category, RecommendationCategory::DailyHabits);
    assert!(recs[0].impact_estimate.contains("40.00"));
    assert_eq!(recs[2].category, RecommendationCategory::Transportation);
    assert!(recs[2].impact_estimate.contains("600.00"));
}

#[test]
fn repeated_runs_are_byte_for_byte_identical() {
    let events = tiered_batch();
    let first = serde_json::to_string(&generate_recommendations(&events).unwrap()).unwrap();
    let second = serde_json::to_string(&generate_recommendations(&events).unwrap()).unwrap();
    assert_eq!(first, second);

    let service = RecommendationService::default();
    let labels = |run: ecotier_core::PipelineOutput| {
        run.groups.into_iter().map(|g| g.cluster).collect::<Vec<_>>()
    };
    assert_eq!(
        labels(service.run(&events).unwrap()),
        labels(service.run(&events).unwrap())
    );
}

#[test]
fn raw_labels_keep_the_same_partition() {
    let events = tiered_batch();
    let ranked = RecommendationService::default().run(&events).unwrap();
    let raw_service = RecommendationService::new(PipelineConfig {
        tier_labeling: TierLabeling::RawLabel,
        ..PipelineConfig::default()
    })
    .unwrap();
    let raw = raw_service.run(&events).unwrap();

    for i in 0..ranked.groups.len() {
        let raw_label = raw.groups[i].cluster.unwrap();
        assert!(raw_label < 3);
        for j in 0..ranked.groups.len() {
            assert_eq!(
                ranked.groups[i].cluster == ranked.groups[j].cluster,
                raw.groups[i].cluster == raw.groups[j].cluster
            );
        }
    }
}

#[test]
fn fewer_distinct_groups_than_clusters_fall_back_to_low_tier() {
    let events = vec![
        event("alice", "Transportation", 900.0, DATES[0]),
        event("bob", "Energy", 800.0, DATES[1]),
    ];
    let output = RecommendationService::default().run(&events).unwrap();
    assert!(output.clustering.underflow);
    assert_eq!(output.clustering.effective_clusters, 0);
    assert!(output
        .groups
        .iter()
        .all(|g| g.tier() == Some(EmissionsTier::Low)));
    assert!(output
        .recommendations
        .iter()
        .all(|r| r.category == RecommendationCategory::General));
    assert_eq!(output.recommendations.len(), 2);
}

#[test]
fn identical_groups_count_as_one_distinct_row() {
    let events: Vec<EmissionsEvent> = ["alice", "bob", "carol", "dave"]
        .into_iter()
        .map(|user| event(user, "Energy", 12.0, DATES[0]))
        .collect();
    let output = RecommendationService::default().run(&events).unwrap();
    assert!(output.clustering.underflow);
    assert_eq!(output.recommendations.len(), 4);
}

#[test]
fn invalid_event_rejects_the_whole_batch() {
    let mut events = tiered_batch();
    events[1].amount = -3.0;
    let err = generate_recommendations(&events).unwrap_err();
    match err {
        PipelineError::InvalidEvent { index, .. } => assert_eq!(index, 1),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn overflowing_group_total_rejects_the_batch() {
    let mut events = tiered_batch();
    events.push(event("zed", "Energy", 1e308, DATES[0]));
    events.push(event("zed", "Energy", 1e308, DATES[1]));

    let err = RecommendationService::default().run(&events).unwrap_err();
    match err {
        PipelineError::NonFiniteAggregate {
            user_id,
            activity_type,
        } => {
            assert_eq!(user_id, "zed");
            assert_eq!(activity_type, "Energy");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn overflowing_feature_column_rejects_the_batch() {
    let mut events = tiered_batch();
    events.push(event("yara", "Energy", 1e308, DATES[0]));
    events.push(event("zed", "Energy", 1e308, DATES[0]));

    let err = generate_recommendations(&events).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Clustering(ClusterError::NonFinitePoint { .. })
    ));
}

#[test]
fn two_cluster_config_splits_transportation_from_the_rest() {
    let service = RecommendationService::new(PipelineConfig {
        cluster_count: 2,
        ..PipelineConfig::default()
    })
    .unwrap();
    let output = service.run(&tiered_batch()).unwrap();
    for group in &output.groups {
        let expected = if group.activity_type == "Transportation" {
            EmissionsTier::High
        } else {
            EmissionsTier::Medium
        };
        assert_eq!(group.tier(), Some(expected));
    }
    // Medium tier only speaks to daily habits, so energy groups are omitted.
    assert_eq!(output.recommendations.len(), 6);
}

#[test]
fn decodes_json_batch_and_runs() {
    let raw = r#"[
        {"userId": "u1", "activityType": "Transportation", "amount": 10, "timestamp": "2024-05-01T10:00:00Z"},
        {"userId": "u1", "activityType": "Transportation", "amount": 20, "timestamp": "2024-05-02T10:00:00Z"},
        {"userId": "u2", "activityType": "Energy", "amount": 400, "timestamp": "2024-05-03"},
        {"userId": "u3", "activityType": "Daily Habits", "amount": 3.5, "timestamp": {"seconds": 1714723200, "nanoseconds": 0}}
    ]"#;
    let events: Vec<EmissionsEvent> = serde_json::from_str(raw).unwrap();
    assert_eq!(events.len(), 4);

    let output = RecommendationService::default().run(&events).unwrap();
    assert_eq!(output.groups.len(), 3);
    assert!(output.groups.iter().all(|g| g.cluster.is_some()));
    assert!(output.recommendations.len() <= output.groups.len());
}
