use crate::cluster::Cluster;
use crate::config::TrendTopic;
use crate::extract::Pattern;
use ahash::AHashSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const NEGATIVE_SENTIMENT_CUTOFF: f64 = -0.3;
const LOW_RESOLUTION_CUTOFF: f64 = 0.6;
const LOW_SATISFACTION_CUTOFF: f64 = 3.5;

/// Minimum relative change in topic volume before a trend is reported.
const TREND_DELTA_CUTOFF: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Pattern,
    Anomaly,
    Suggestion,
    Trend,
}

/// Only `New` is ever produced here; the review collaborator owns the rest of
/// the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightStatus {
    New,
    Reviewed,
    Dismissed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub kind: InsightKind,
    pub description: String,
    /// Higher is more urgent.
    pub importance: u8,
    pub related_pattern_ids: Vec<String>,
    pub detected_at: DateTime<Utc>,
    pub status: InsightStatus,
}

fn new_insight(
    kind: InsightKind,
    description: String,
    importance: u8,
    related_pattern_ids: Vec<String>,
) -> Insight {
    Insight {
        id: Uuid::new_v4().to_string(),
        kind,
        description,
        importance,
        related_pattern_ids,
        detected_at: Utc::now(),
        status: InsightStatus::New,
    }
}

fn sentiment(pattern: &Pattern) -> f64 {
    pattern.average_sentiment_score.unwrap_or(0.0)
}

/// Pattern-based pass: frequent patterns, strongly negative patterns, and
/// frequent patterns no cluster covers. Expects patterns in
/// frequency-descending order, as extraction produces them.
pub fn pattern_insights(patterns: &[Pattern], clusters: &[Cluster]) -> Vec<Insight> {
    let mut out = Vec::new();

    for pattern in patterns.iter().filter(|p| p.frequency > 10).take(5) {
        let importance = (5 + pattern.frequency / 20).min(8) as u8;
        out.push(new_insight(
            InsightKind::Pattern,
            format!(
                "High-frequency pattern \"{}\" appeared {} times",
                pattern.pattern_key, pattern.frequency
            ),
            importance,
            vec![pattern.id.clone()],
        ));
    }

    let mut negative: Vec<&Pattern> = patterns
        .iter()
        .filter(|p| {
            p.average_sentiment_score
                .is_some_and(|s| s < NEGATIVE_SENTIMENT_CUTOFF)
        })
        .collect();
    negative.sort_by(|a, b| sentiment(a).total_cmp(&sentiment(b)));
    for pattern in negative.into_iter().take(3) {
        out.push(new_insight(
            InsightKind::Anomaly,
            format!(
                "Pattern \"{}\" carries strongly negative sentiment (avg {:.2})",
                pattern.pattern_key,
                sentiment(pattern)
            ),
            9,
            vec![pattern.id.clone()],
        ));
    }

    let clustered: AHashSet<&str> = clusters
        .iter()
        .flat_map(|c| c.patterns.iter())
        .map(|p| p.id.as_str())
        .collect();
    let outliers = patterns
        .iter()
        .filter(|p| p.frequency > 5 && !clustered.contains(p.id.as_str()))
        .take(3);
    for pattern in outliers {
        out.push(new_insight(
            InsightKind::Anomaly,
            format!(
                "Pattern \"{}\" recurs {} times but belongs to no intent cluster",
                pattern.pattern_key, pattern.frequency
            ),
            7,
            vec![pattern.id.clone()],
        ));
    }

    out
}

/// Cluster-based pass: poorly resolved clusters, low-satisfaction clusters,
/// and the largest clusters.
pub fn cluster_insights(clusters: &[Cluster]) -> Vec<Insight> {
    let mut out = Vec::new();

    let mut poorly_resolved: Vec<&Cluster> = clusters
        .iter()
        .filter(|c| c.resolution_rate < LOW_RESOLUTION_CUTOFF && c.patterns.len() > 3)
        .collect();
    poorly_resolved.sort_by(|a, b| a.resolution_rate.total_cmp(&b.resolution_rate));
    for cluster in poorly_resolved.into_iter().take(3) {
        out.push(new_insight(
            InsightKind::Suggestion,
            format!(
                "Cluster \"{}\" resolves only {:.0}% of its sessions; review its troubleshooting flow",
                cluster.name,
                cluster.resolution_rate * 100.0
            ),
            10,
            member_ids(cluster),
        ));
    }

    let mut low_satisfaction: Vec<&Cluster> = clusters
        .iter()
        .filter(|c| {
            c.average_satisfaction_score
                .is_some_and(|s| s < LOW_SATISFACTION_CUTOFF)
        })
        .collect();
    low_satisfaction.sort_by(|a, b| {
        a.average_satisfaction_score
            .unwrap_or(0.0)
            .total_cmp(&b.average_satisfaction_score.unwrap_or(0.0))
    });
    for cluster in low_satisfaction.into_iter().take(3) {
        out.push(new_insight(
            InsightKind::Anomaly,
            format!(
                "Cluster \"{}\" averages {:.1}/5 user satisfaction",
                cluster.name,
                cluster.average_satisfaction_score.unwrap_or(0.0)
            ),
            9,
            member_ids(cluster),
        ));
    }

    let mut largest: Vec<&Cluster> = clusters.iter().filter(|c| c.patterns.len() > 5).collect();
    largest.sort_by(|a, b| b.size.cmp(&a.size));
    for cluster in largest.into_iter().take(3) {
        out.push(new_insight(
            InsightKind::Pattern,
            format!(
                "Cluster \"{}\" groups {} recurring patterns",
                cluster.name, cluster.size
            ),
            6,
            member_ids(cluster),
        ));
    }

    out
}

fn member_ids(cluster: &Cluster) -> Vec<String> {
    cluster.patterns.iter().map(|p| p.id.clone()).collect()
}

/// Trend pass over two time-windowed extractions: per-topic summed pattern
/// volume, compared as a relative delta. A topic only reports when the
/// previous window saw it at all (no unguarded division) and the change is
/// at least 10%. Related ids come from the caller's patterns, not the
/// throwaway window extractions.
pub fn trend_insights(
    topics: &[TrendTopic],
    previous: &[Pattern],
    current: &[Pattern],
    reference: &[Pattern],
) -> Vec<Insight> {
    let mut out = Vec::new();
    for topic in topics {
        let previous_volume = topic_volume(topic, previous);
        let current_volume = topic_volume(topic, current);
        if previous_volume == 0 {
            continue;
        }
        let delta =
            (current_volume as f64 - previous_volume as f64) / previous_volume as f64;
        if delta.abs() < TREND_DELTA_CUTOFF {
            continue;
        }
        let direction = if delta > 0.0 { "up" } else { "down" };
        let related: Vec<String> = reference
            .iter()
            .filter(|p| topic_matches(topic, &p.pattern_key))
            .map(|p| p.id.clone())
            .collect();
        out.push(new_insight(
            InsightKind::Trend,
            format!(
                "Mentions of {} issues are {} {:.0}% versus the previous period ({} -> {})",
                topic.name,
                direction,
                delta.abs() * 100.0,
                previous_volume,
                current_volume
            ),
            topic.importance,
            related,
        ));
    }
    out
}

fn topic_volume(topic: &TrendTopic, patterns: &[Pattern]) -> usize {
    patterns
        .iter()
        .filter(|p| topic_matches(topic, &p.pattern_key))
        .map(|p| p.frequency)
        .sum()
}

/// Token-level containment so inflected forms still match their stem
/// (e.g. "느려요" matches the term "느려").
fn topic_matches(topic: &TrendTopic, pattern_key: &str) -> bool {
    pattern_key
        .split_whitespace()
        .any(|token| topic.terms.iter().any(|term| token.contains(term.as_str())))
}

/// Stable sort descending by importance; ties keep generation order
/// (pattern-based, then cluster-based, then trend-based).
pub fn rank(mut insights: Vec<Insight>) -> Vec<Insight> {
    insights.sort_by(|a, b| b.importance.cmp(&a.importance));
    insights
}
