use crate::config::KeywordTable;
use crate::normalize::normalize;
use crate::store::{RawMessage, Sender};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

pub const MAX_EXAMPLES: usize = 5;

/// A pattern key keeps at most this many tokens.
const KEY_TOKEN_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub pattern_key: String,
    pub frequency: usize,
    /// Up to 5 original (non-normalized) texts, deduplicated, first-seen order.
    pub examples: Vec<String>,
    pub related_intents: BTreeSet<String>,
    pub user_types: BTreeSet<String>,
    /// Entity name -> occurrence count across contributing messages.
    pub common_entities: BTreeMap<String, usize>,
    /// Mean sentiment over contributing messages that carried a score;
    /// None when none did.
    pub average_sentiment_score: Option<f64>,
}

/// Accumulator for one distinct pattern key, prior to materialization.
#[derive(Debug, Clone)]
pub struct PatternBucket {
    pub key: String,
    pub count: usize,
    pub examples: Vec<String>,
    pub intents: BTreeSet<String>,
    pub entities: BTreeMap<String, usize>,
    pub sentiment_sum: f64,
    pub sentiment_count: usize,
}

impl PatternBucket {
    fn new(key: String) -> Self {
        Self {
            key,
            count: 0,
            examples: Vec::new(),
            intents: BTreeSet::new(),
            entities: BTreeMap::new(),
            sentiment_sum: 0.0,
            sentiment_count: 0,
        }
    }
}

/// Reduce a message to its pattern key: normalize, drop stop-words (domain
/// keywords are exempt), stably move domain keywords to the front, keep the
/// first 5 tokens. A message with no surviving tokens yields the empty key
/// and still buckets normally.
pub fn derive_pattern_key(content: &str, table: &KeywordTable) -> String {
    let normalized = normalize(content);
    let mut keyword_tokens: Vec<&str> = Vec::new();
    let mut plain_tokens: Vec<&str> = Vec::new();
    for token in normalized.split_whitespace() {
        if table.is_domain_keyword(token) {
            keyword_tokens.push(token);
        } else if !table.is_stop_word(token) {
            plain_tokens.push(token);
        }
    }
    keyword_tokens.extend(plain_tokens);
    keyword_tokens
        .into_iter()
        .take(KEY_TOKEN_LIMIT)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Accumulate user messages into per-key buckets, preserving first-seen
/// bucket order. Non-user messages are ignored.
pub fn collect_buckets(
    messages: &[RawMessage],
    table: &KeywordTable,
    include_entities: bool,
) -> Vec<PatternBucket> {
    let mut buckets: Vec<PatternBucket> = Vec::new();
    let mut index: AHashMap<String, usize> = AHashMap::new();
    for message in messages.iter().filter(|m| m.sender == Sender::User) {
        let key = derive_pattern_key(&message.content, table);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            buckets.push(PatternBucket::new(key));
            buckets.len() - 1
        });
        let bucket = &mut buckets[slot];
        bucket.count += 1;
        if bucket.examples.len() < MAX_EXAMPLES && !bucket.examples.contains(&message.content) {
            bucket.examples.push(message.content.clone());
        }
        if let Some(intent) = &message.intent {
            bucket.intents.insert(intent.clone());
        }
        if include_entities {
            if let Some(entities) = &message.entities {
                for name in entities.keys() {
                    *bucket.entities.entry(name.clone()).or_insert(0) += 1;
                }
            }
        }
        if let Some(score) = message.sentiment_score {
            bucket.sentiment_sum += score;
            bucket.sentiment_count += 1;
        }
    }
    buckets
}

/// Apply the frequency floor, sort descending by count (stable, so ties keep
/// first-seen order), and cap at max_patterns.
pub fn select_buckets(
    mut buckets: Vec<PatternBucket>,
    min_frequency: usize,
    max_patterns: usize,
) -> Vec<PatternBucket> {
    buckets.retain(|b| b.count >= min_frequency);
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets.truncate(max_patterns);
    buckets
}

/// Turn a surviving bucket into a Pattern with a fresh id. The caller supplies
/// the user-type labels derived from the bucket's correlated sessions.
pub fn materialize(bucket: PatternBucket, user_types: BTreeSet<String>) -> Pattern {
    let average_sentiment_score = if bucket.sentiment_count > 0 {
        Some(bucket.sentiment_sum / bucket.sentiment_count as f64)
    } else {
        None
    };
    Pattern {
        id: Uuid::new_v4().to_string(),
        pattern_key: bucket.key,
        frequency: bucket.count,
        examples: bucket.examples,
        related_intents: bucket.intents,
        user_types,
        common_entities: bucket.entities,
        average_sentiment_score,
    }
}
