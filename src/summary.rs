use crate::cluster::Cluster;
use crate::extract::Pattern;
use crate::insight::Insight;
use crate::store::RawSession;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const TOP_CLUSTERS: usize = 5;
const RECENT_INSIGHTS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSummary {
    /// From the full, unfiltered store — not the extraction window.
    pub total_sessions: usize,
    pub total_messages: usize,
    pub unique_pattern_count: usize,
    /// Largest clusters by member count, at most 5.
    pub top_clusters: Vec<Cluster>,
    /// Highest-importance insights, at most 5.
    pub recent_insights: Vec<Insight>,
    /// Cluster name -> summed member frequency. A multi-cluster pattern
    /// contributes to each of its clusters.
    pub pattern_distribution: BTreeMap<String, usize>,
    /// Composite 0-100 quality score.
    pub data_quality_score: u8,
}

pub fn build_summary(
    sessions: &[RawSession],
    total_messages: usize,
    patterns: &[Pattern],
    clusters: &[Cluster],
    insights: &[Insight],
) -> DataSummary {
    let mut pattern_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for cluster in clusters {
        let volume: usize = cluster.patterns.iter().map(|p| p.frequency).sum();
        *pattern_distribution.entry(cluster.name.clone()).or_insert(0) += volume;
    }

    let mut top_clusters: Vec<Cluster> = clusters.to_vec();
    top_clusters.sort_by(|a, b| b.size.cmp(&a.size));
    top_clusters.truncate(TOP_CLUSTERS);

    let mut recent_insights: Vec<Insight> = insights.to_vec();
    recent_insights.sort_by(|a, b| b.importance.cmp(&a.importance));
    recent_insights.truncate(RECENT_INSIGHTS);

    let average_resolution_rate = if clusters.is_empty() {
        0.0
    } else {
        clusters.iter().map(|c| c.resolution_rate).sum::<f64>() / clusters.len() as f64
    };
    let satisfaction_coverage = if sessions.is_empty() {
        0.0
    } else {
        let rated = sessions.iter().filter(|s| s.user_satisfaction.is_some()).count();
        rated as f64 / sessions.len() as f64
    };

    DataSummary {
        total_sessions: sessions.len(),
        total_messages,
        unique_pattern_count: patterns.len(),
        top_clusters,
        recent_insights,
        pattern_distribution,
        data_quality_score: data_quality_score(
            sessions.len(),
            patterns.len(),
            clusters.len(),
            average_resolution_rate,
            satisfaction_coverage,
        ),
    }
}

/// Composite score: volume, pattern diversity, cluster count, resolution
/// outcomes, and satisfaction-data coverage, each capped at 20, the sum
/// clamped to 0-100.
pub fn data_quality_score(
    session_count: usize,
    pattern_count: usize,
    cluster_count: usize,
    average_resolution_rate: f64,
    satisfaction_coverage: f64,
) -> u8 {
    let session_score = (session_count / 10).min(20) as i64;
    let diversity_score = (pattern_count / 5).min(20) as i64;
    let cluster_score = (cluster_count * 2).min(20) as i64;
    let resolution_score = (average_resolution_rate * 20.0).floor() as i64;
    let satisfaction_score = (satisfaction_coverage * 20.0).floor() as i64;
    (session_score + diversity_score + cluster_score + resolution_score + satisfaction_score)
        .clamp(0, 100) as u8
}
