use ahash::AHashMap;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
    Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub session_id: String,
    pub sender: Sender,
    pub content: String,
    pub intent: Option<String>,
    /// Entity name -> value, as produced by the upstream intent/entity detector.
    pub entities: Option<BTreeMap<String, Value>>,
    /// -1.0 (negative) .. 1.0 (positive), when the upstream detector scored the message.
    pub sentiment_score: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSession {
    pub id: String,
    pub issue_type: String,
    pub message_count: usize,
    pub duration_seconds: i64,
    pub issue_resolved: bool,
    pub resolution_steps: u32,
    pub transferred_to_agent: bool,
    /// 1..=5 when the user rated the session.
    pub user_satisfaction: Option<u8>,
    pub device_model: Option<String>,
    pub start_time: DateTime<Utc>,
}

/// All predicates are conjunctive; a default filter matches every session.
/// The date range is half-open: start <= start_time < end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub issue_type: Option<String>,
    pub resolved: Option<bool>,
    pub device_model: Option<String>,
    pub min_satisfaction: Option<u8>,
    pub transferred_to_agent: Option<bool>,
}

impl SessionFilter {
    pub fn matches(&self, session: &RawSession) -> bool {
        if let Some(start) = self.start {
            if session.start_time < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if session.start_time >= end {
                return false;
            }
        }
        if let Some(issue_type) = &self.issue_type {
            if &session.issue_type != issue_type {
                return false;
            }
        }
        if let Some(resolved) = self.resolved {
            if session.issue_resolved != resolved {
                return false;
            }
        }
        if let Some(device) = &self.device_model {
            if session.device_model.as_deref() != Some(device.as_str()) {
                return false;
            }
        }
        if let Some(min) = self.min_satisfaction {
            match session.user_satisfaction {
                Some(score) if score >= min => {}
                _ => return false,
            }
        }
        if let Some(transferred) = self.transferred_to_agent {
            if session.transferred_to_agent != transferred {
                return false;
            }
        }
        true
    }
}

/// Read side of the session/message store collaborator. Implementations may
/// fail with any backend error; the engine wraps it with stage context.
pub trait SessionStore {
    fn get_sessions(&self, filter: &SessionFilter) -> Result<Vec<RawSession>>;

    /// Messages for one session, time-ordered.
    fn get_messages_by_session_id(&self, session_id: &str) -> Result<Vec<RawMessage>>;
}

/// Reference store over owned snapshots. Messages are grouped per session and
/// sorted by timestamp at construction.
pub struct InMemoryStore {
    sessions: Vec<RawSession>,
    messages_by_session: AHashMap<String, Vec<RawMessage>>,
}

impl InMemoryStore {
    pub fn new(sessions: Vec<RawSession>, messages: Vec<RawMessage>) -> Self {
        let mut messages_by_session: AHashMap<String, Vec<RawMessage>> = AHashMap::new();
        for message in messages {
            messages_by_session
                .entry(message.session_id.clone())
                .or_default()
                .push(message);
        }
        for grouped in messages_by_session.values_mut() {
            grouped.sort_by_key(|m| m.timestamp);
        }
        Self { sessions, messages_by_session }
    }
}

impl SessionStore for InMemoryStore {
    fn get_sessions(&self, filter: &SessionFilter) -> Result<Vec<RawSession>> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    fn get_messages_by_session_id(&self, session_id: &str) -> Result<Vec<RawMessage>> {
        Ok(self
            .messages_by_session
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}
