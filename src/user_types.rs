use crate::store::RawSession;
use std::collections::BTreeSet;

/// Behavioral labels for one session: exactly one size bucket, plus zero or
/// both of the independent `efficient` / `needs_assistance` markers.
pub fn classify_session(session: &RawSession) -> Vec<&'static str> {
    let mut labels = Vec::with_capacity(3);
    labels.push(if session.message_count <= 3 {
        "beginner"
    } else if session.message_count <= 7 {
        "intermediate"
    } else {
        "expert"
    });
    if session.issue_resolved && session.resolution_steps <= 2 {
        labels.push("efficient");
    }
    if session.transferred_to_agent {
        labels.push("needs_assistance");
    }
    labels
}

/// Union of labels across a pattern's correlated sessions (1-4 distinct
/// labels possible).
pub fn user_types_for_sessions(sessions: &[&RawSession]) -> BTreeSet<String> {
    sessions
        .iter()
        .flat_map(|s| classify_session(s))
        .map(str::to_string)
        .collect()
}
