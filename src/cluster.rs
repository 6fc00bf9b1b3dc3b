use crate::correlate::{find_related_sessions, NormalizedMessage};
use crate::extract::Pattern;
use crate::store::RawSession;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_ISSUE_TYPES: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    /// An intent string, or "unknown" for intent-less patterns.
    pub name: String,
    /// Number of member patterns.
    pub size: usize,
    /// Key of the highest-frequency member (first member wins ties).
    pub central_pattern: String,
    pub patterns: Vec<Pattern>,
    /// Mean user satisfaction over related sessions that rated; None when
    /// none did.
    pub average_satisfaction_score: Option<f64>,
    /// Top 3 issue types among related sessions, by frequency.
    pub common_issue_types: Vec<String>,
    /// resolved / related sessions, 0.0 when no session relates.
    pub resolution_rate: f64,
}

/// Group patterns by related intent, in first-encounter order. A pattern with
/// no intents lands in "unknown"; a pattern with N intents joins N groups, so
/// clusters are not a partition.
pub fn group_by_intent(patterns: &[Pattern]) -> Vec<(String, Vec<&Pattern>)> {
    let mut groups: Vec<(String, Vec<&Pattern>)> = Vec::new();
    let mut index: AHashMap<String, usize> = AHashMap::new();
    for pattern in patterns {
        if pattern.related_intents.is_empty() {
            insert_into_group(&mut groups, &mut index, "unknown", pattern);
        } else {
            for intent in &pattern.related_intents {
                insert_into_group(&mut groups, &mut index, intent, pattern);
            }
        }
    }
    groups
}

fn insert_into_group<'a>(
    groups: &mut Vec<(String, Vec<&'a Pattern>)>,
    index: &mut AHashMap<String, usize>,
    name: &str,
    pattern: &'a Pattern,
) {
    let slot = *index.entry(name.to_string()).or_insert_with(|| {
        groups.push((name.to_string(), Vec::new()));
        groups.len() - 1
    });
    groups[slot].1.push(pattern);
}

/// Build one cluster per intent group with its outcome statistics. Groups are
/// independent, so the per-group work (which re-runs session correlation for
/// every member pattern) fans out across threads; collect preserves group
/// order, so the output is deterministic regardless of thread count.
pub fn build_clusters(
    patterns: &[Pattern],
    messages: &[NormalizedMessage],
    sessions: &[RawSession],
) -> Vec<Cluster> {
    group_by_intent(patterns)
        .into_par_iter()
        .map(|(name, members)| build_cluster(name, &members, messages, sessions))
        .collect()
}

fn build_cluster(
    name: String,
    members: &[&Pattern],
    messages: &[NormalizedMessage],
    sessions: &[RawSession],
) -> Cluster {
    let mut central = members[0];
    for member in &members[1..] {
        if member.frequency > central.frequency {
            central = member;
        }
    }

    // Deduplicated union of related sessions across every member pattern.
    let mut seen: AHashSet<&str> = AHashSet::new();
    let mut related: Vec<&RawSession> = Vec::new();
    for member in members {
        for session in find_related_sessions(&member.pattern_key, messages, sessions) {
            if seen.insert(session.id.as_str()) {
                related.push(session);
            }
        }
    }

    let resolution_rate = if related.is_empty() {
        0.0
    } else {
        let resolved = related.iter().filter(|s| s.issue_resolved).count();
        resolved as f64 / related.len() as f64
    };

    let ratings: Vec<f64> = related
        .iter()
        .filter_map(|s| s.user_satisfaction)
        .map(f64::from)
        .collect();
    let average_satisfaction_score = if ratings.is_empty() {
        None
    } else {
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    };

    Cluster {
        id: Uuid::new_v4().to_string(),
        name,
        size: members.len(),
        central_pattern: central.pattern_key.clone(),
        patterns: members.iter().map(|p| (*p).clone()).collect(),
        average_satisfaction_score,
        common_issue_types: top_issue_types(&related),
        resolution_rate,
    }
}

/// Top issue types by frequency among related sessions; ties keep
/// first-encounter order.
fn top_issue_types(sessions: &[&RawSession]) -> Vec<String> {
    let counts = sessions.iter().map(|s| s.issue_type.as_str()).counts();
    let mut distinct: Vec<&str> = Vec::new();
    let mut seen: AHashSet<&str> = AHashSet::new();
    for session in sessions {
        if seen.insert(session.issue_type.as_str()) {
            distinct.push(session.issue_type.as_str());
        }
    }
    distinct.sort_by(|a, b| counts[b].cmp(&counts[a]));
    distinct
        .into_iter()
        .take(MAX_ISSUE_TYPES)
        .map(str::to_string)
        .collect()
}
