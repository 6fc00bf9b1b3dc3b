use chrono::{TimeZone, Utc};
use convoscope::cluster::Cluster;
use convoscope::extract::Pattern;
use convoscope::insight::{Insight, InsightKind, InsightStatus};
use convoscope::store::RawSession;
use convoscope::summary::{build_summary, data_quality_score};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

fn pattern(key: &str, frequency: usize) -> Pattern {
    Pattern {
        id: Uuid::new_v4().to_string(),
        pattern_key: key.to_string(),
        frequency,
        examples: Vec::new(),
        related_intents: BTreeSet::new(),
        user_types: BTreeSet::new(),
        common_entities: BTreeMap::new(),
        average_sentiment_score: None,
    }
}

fn cluster(name: &str, members: Vec<Pattern>, resolution_rate: f64) -> Cluster {
    Cluster {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        size: members.len(),
        central_pattern: String::new(),
        patterns: members,
        average_satisfaction_score: None,
        common_issue_types: Vec::new(),
        resolution_rate,
    }
}

fn insight(importance: u8) -> Insight {
    Insight {
        id: Uuid::new_v4().to_string(),
        kind: InsightKind::Pattern,
        description: format!("importance {importance}"),
        importance,
        related_pattern_ids: Vec::new(),
        detected_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        status: InsightStatus::New,
    }
}

fn session(id: &str, satisfaction: Option<u8>) -> RawSession {
    RawSession {
        id: id.to_string(),
        issue_type: "charging".to_string(),
        message_count: 4,
        duration_seconds: 240,
        issue_resolved: true,
        resolution_steps: 2,
        transferred_to_agent: false,
        user_satisfaction: satisfaction,
        device_model: None,
        start_time: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    }
}

#[test]
fn quality_score_bounds_and_formula() {
    assert_eq!(data_quality_score(0, 0, 0, 0.0, 0.0), 0);
    assert_eq!(data_quality_score(1000, 1000, 1000, 1.0, 1.0), 100);
    // sub-scores: floor(100/10)=10, floor(25/5)=5, 4*2=8, floor(0.75*20)=15,
    // floor(0.5*20)=10
    assert_eq!(data_quality_score(100, 25, 4, 0.75, 0.5), 48);
    // each component caps at 20
    assert_eq!(data_quality_score(10_000, 0, 0, 0.0, 0.0), 20);
    assert_eq!(data_quality_score(0, 10_000, 0, 0.0, 0.0), 20);
    assert_eq!(data_quality_score(0, 0, 10_000, 0.0, 0.0), 20);
}

#[test]
fn distribution_sums_member_frequency_per_cluster() {
    let shared = pattern("charger refund", 6);
    let clusters = vec![
        cluster(
            "charger_issue",
            vec![pattern("charger broken", 10), shared.clone()],
            0.8,
        ),
        cluster("refund_request", vec![shared], 0.4),
    ];
    let summary = build_summary(&[], 0, &[], &clusters, &[]);
    assert_eq!(summary.pattern_distribution["charger_issue"], 16);
    // the multi-cluster pattern contributes to both clusters
    assert_eq!(summary.pattern_distribution["refund_request"], 6);
}

#[test]
fn top_clusters_limited_to_five_by_size() {
    let clusters: Vec<Cluster> = (0..7)
        .map(|i| {
            let members = (0..=i).map(|j| pattern(&format!("k{i}-{j}"), 1)).collect();
            cluster(&format!("c{i}"), members, 0.5)
        })
        .collect();
    let summary = build_summary(&[], 0, &[], &clusters, &[]);
    assert_eq!(summary.top_clusters.len(), 5);
    assert_eq!(summary.top_clusters[0].name, "c6");
    assert_eq!(summary.top_clusters[4].name, "c2");
}

#[test]
fn recent_insights_limited_to_five_by_importance() {
    let insights: Vec<Insight> = [3, 9, 5, 10, 2, 8, 7].map(insight).to_vec();
    let summary = build_summary(&[], 0, &[], &[], &insights);
    let ranks: Vec<u8> = summary.recent_insights.iter().map(|i| i.importance).collect();
    assert_eq!(ranks, vec![10, 9, 8, 7, 5]);
}

#[test]
fn totals_and_coverage_from_full_store() {
    let sessions = vec![
        session("s1", Some(5)),
        session("s2", None),
        session("s3", Some(3)),
        session("s4", None),
    ];
    let patterns = vec![pattern("charger broken", 10)];
    let clusters = vec![cluster("charger_issue", patterns.clone(), 1.0)];
    let summary = build_summary(&sessions, 42, &patterns, &clusters, &[]);
    assert_eq!(summary.total_sessions, 4);
    assert_eq!(summary.total_messages, 42);
    assert_eq!(summary.unique_pattern_count, 1);
    // floor(4/10)=0 + floor(1/5)=0 + 1*2=2 + floor(1.0*20)=20 +
    // floor(0.5*20)=10
    assert_eq!(summary.data_quality_score, 32);
}

#[test]
fn degenerate_inputs_build_a_well_formed_summary() {
    let summary = build_summary(&[], 0, &[], &[], &[]);
    assert_eq!(summary.total_sessions, 0);
    assert_eq!(summary.total_messages, 0);
    assert_eq!(summary.unique_pattern_count, 0);
    assert!(summary.top_clusters.is_empty());
    assert!(summary.recent_insights.is_empty());
    assert!(summary.pattern_distribution.is_empty());
    assert_eq!(summary.data_quality_score, 0);
}

#[test]
fn summary_serializes_for_dashboard_consumers() {
    let sessions = vec![session("s1", Some(4))];
    let patterns = vec![pattern("charger broken", 10)];
    let clusters = vec![cluster("charger_issue", patterns.clone(), 1.0)];
    let summary = build_summary(&sessions, 3, &patterns, &clusters, &[insight(9)]);
    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["total_sessions"], 1);
    assert_eq!(value["pattern_distribution"]["charger_issue"], 10);
    assert_eq!(value["recent_insights"][0]["status"], "new");
    assert_eq!(value["recent_insights"][0]["kind"], "pattern");
}
