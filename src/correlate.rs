use crate::normalize::normalize;
use crate::store::{RawMessage, RawSession};
use ahash::{AHashMap, AHashSet};

/// A message's normalized content paired with its session id. Computed once
/// per snapshot so the per-pattern scans below do not re-run the normalizer.
#[derive(Debug, Clone)]
pub struct NormalizedMessage {
    pub session_id: String,
    pub normalized: String,
}

pub fn normalize_messages(messages: &[RawMessage]) -> Vec<NormalizedMessage> {
    messages
        .iter()
        .map(|m| NormalizedMessage {
            session_id: m.session_id.clone(),
            normalized: normalize(&m.content),
        })
        .collect()
}

/// Sessions whose messages contain the pattern key as a substring of their
/// normalized content. Deliberately looser than the token-based key
/// derivation. Distinct sessions, in first-match order. An empty key matches
/// every message.
pub fn find_related_sessions<'a>(
    pattern_key: &str,
    messages: &[NormalizedMessage],
    sessions: &'a [RawSession],
) -> Vec<&'a RawSession> {
    let by_id: AHashMap<&str, &'a RawSession> =
        sessions.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut seen: AHashSet<&str> = AHashSet::new();
    let mut related: Vec<&'a RawSession> = Vec::new();
    for message in messages {
        if !message.normalized.contains(pattern_key) {
            continue;
        }
        if !seen.insert(message.session_id.as_str()) {
            continue;
        }
        if let Some(session) = by_id.get(message.session_id.as_str()) {
            related.push(session);
        }
    }
    related
}
