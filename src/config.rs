use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Half-open window: start <= t < end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternExtractionConfig {
    pub time_range: TimeRange,
    /// Buckets below this count are dropped. Must be >= 1.
    pub min_frequency: usize,
    /// At most this many patterns survive selection. Must be >= 1.
    pub max_patterns: usize,
    /// Jaccard threshold in [0, 1] at or above which two keys merge.
    pub similarity_threshold: f64,
    pub include_entities: bool,
}

/// A named group of terms whose combined pattern volume is tracked across
/// time windows, with the importance its trend insights carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendTopic {
    pub name: String,
    pub terms: Vec<String>,
    pub importance: u8,
}

/// Stop-words, domain keywords, and trend topics are data, not logic: swap
/// the table to retarget the engine at another domain or locale. The default
/// table targets EV-charging support conversations (Korean + English).
///
/// All lookups expect normalized (lowercased) tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordTable {
    stop_words: BTreeSet<String>,
    domain_keywords: BTreeSet<String>,
    pub trend_topics: Vec<TrendTopic>,
}

impl KeywordTable {
    pub fn new(
        stop_words: impl IntoIterator<Item = impl Into<String>>,
        domain_keywords: impl IntoIterator<Item = impl Into<String>>,
        trend_topics: Vec<TrendTopic>,
    ) -> Self {
        Self {
            stop_words: stop_words.into_iter().map(Into::into).collect(),
            domain_keywords: domain_keywords.into_iter().map(Into::into).collect(),
            trend_topics,
        }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    pub fn is_domain_keyword(&self, token: &str) -> bool {
        self.domain_keywords.contains(token)
    }
}

const DEFAULT_STOP_WORDS: &[&str] = &[
    // English
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "i",
    "my", "me", "we", "our", "you", "your", "it", "its", "this", "that",
    "these", "those", "to", "of", "in", "on", "at", "for", "from", "with",
    "and", "or", "but", "not", "no", "do", "does", "did", "can", "could",
    "will", "would", "should", "have", "has", "had", "please", "hello", "hi",
    "what", "when", "where", "how", "why", "who", "am", "just", "so", "too",
    "very", "really", "also", "there", "here", "now", "then",
    // Korean particles and fillers that survive tokenization on their own
    "이", "가", "은", "는", "을", "를", "에", "에서", "에게", "으로", "로",
    "와", "과", "도", "만", "의", "요", "좀", "혹시", "저", "제", "그",
    "그리고", "그런데", "근데", "지금", "오늘", "어제", "계속", "다시",
    "해주세요", "합니다", "있어요", "했는데",
];

const DEFAULT_DOMAIN_KEYWORDS: &[&str] = &[
    "충전", "충전기", "충전소", "배터리", "급속", "완속", "커넥터", "케이블",
    "결제", "카드", "환불", "앱", "어플", "회원", "포인트", "전기차",
    "charging", "charger", "battery", "ev", "plug", "connector", "cable",
    "payment", "card", "refund", "app", "station", "kwh",
];

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_STOP_WORDS.iter().copied(),
            DEFAULT_DOMAIN_KEYWORDS.iter().copied(),
            vec![
                TrendTopic {
                    name: "charging-speed".to_string(),
                    terms: ["급속", "완속", "속도", "느려", "느림", "slow", "speed", "fast"]
                        .map(String::from)
                        .to_vec(),
                    importance: 8,
                },
                TrendTopic {
                    name: "connectivity".to_string(),
                    terms: [
                        "연결", "접속", "통신", "와이파이", "블루투스", "connect",
                        "connection", "network", "wifi", "bluetooth",
                    ]
                    .map(String::from)
                    .to_vec(),
                    importance: 6,
                },
            ],
        )
    }
}
