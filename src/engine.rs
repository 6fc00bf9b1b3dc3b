use crate::cluster::{self, Cluster};
use crate::config::{KeywordTable, PatternExtractionConfig, TimeRange};
use crate::correlate::{self, NormalizedMessage};
use crate::extract::{self, Pattern};
use crate::insight::{self, Insight};
use crate::similarity;
use crate::store::{RawMessage, RawSession, Sender, SessionFilter, SessionStore};
use crate::summary::{self, DataSummary};
use crate::user_types;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load sessions from store: {0}")]
    SessionLoad(#[source] anyhow::Error),
    #[error("failed to load messages for session {session_id}: {source}")]
    MessageLoad {
        session_id: String,
        #[source]
        source: anyhow::Error,
    },
}

/// One atomic read of the windowed store, shared by the passes of a single
/// operation. User messages only; contents are normalized once.
struct Snapshot {
    sessions: Vec<RawSession>,
    user_messages: Vec<RawMessage>,
    normalized: Vec<NormalizedMessage>,
}

/// Stateless pattern-mining engine over an injected store. Every method is a
/// pure function of its explicit inputs plus that store; concurrent callers
/// each get their own snapshot read, so there is no shared-mutation hazard.
///
/// There is no partial-result mode: callers sequence
/// extract -> cluster -> insights -> summary and stop at the first error.
pub struct InsightEngine<S: SessionStore> {
    store: S,
    keywords: KeywordTable,
}

impl<S: SessionStore> InsightEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store, keywords: KeywordTable::default() }
    }

    pub fn with_keywords(store: S, keywords: KeywordTable) -> Self {
        Self { store, keywords }
    }

    /// Extract deduplicated recurring patterns from the configured window:
    /// bucket accumulation, frequency floor, cap, then greedy similarity
    /// merging.
    pub fn extract_patterns(
        &self,
        config: &PatternExtractionConfig,
    ) -> Result<Vec<Pattern>, EngineError> {
        let snapshot = self.load_window(&config.time_range)?;
        let patterns = self.extract_from_snapshot(&snapshot, config);
        debug!(
            sessions = snapshot.sessions.len(),
            messages = snapshot.user_messages.len(),
            patterns = patterns.len(),
            "extracted patterns"
        );
        Ok(patterns)
    }

    /// Group patterns into intent-named clusters with per-cluster outcome
    /// statistics, re-correlating sessions from a fresh snapshot.
    pub fn cluster_patterns(
        &self,
        config: &PatternExtractionConfig,
        patterns: &[Pattern],
    ) -> Result<Vec<Cluster>, EngineError> {
        let snapshot = self.load_window(&config.time_range)?;
        let clusters = cluster::build_clusters(patterns, &snapshot.normalized, &snapshot.sessions);
        debug!(clusters = clusters.len(), "built clusters");
        Ok(clusters)
    }

    /// Ranked observations from patterns, clusters, and period-over-period
    /// topic trends.
    pub fn generate_insights(
        &self,
        config: &PatternExtractionConfig,
        patterns: &[Pattern],
        clusters: &[Cluster],
    ) -> Result<Vec<Insight>, EngineError> {
        let mut insights = insight::pattern_insights(patterns, clusters);
        insights.extend(insight::cluster_insights(clusters));
        insights.extend(self.trend_insights(config, patterns)?);
        let ranked = insight::rank(insights);
        debug!(insights = ranked.len(), "generated insights");
        Ok(ranked)
    }

    /// Aggregate totals, distribution, and the composite quality score.
    /// Totals come from the full unfiltered store, not the window.
    pub fn generate_data_summary(
        &self,
        patterns: &[Pattern],
        clusters: &[Cluster],
        insights: &[Insight],
    ) -> Result<DataSummary, EngineError> {
        let sessions = self
            .store
            .get_sessions(&SessionFilter::default())
            .map_err(EngineError::SessionLoad)?;
        let mut total_messages = 0usize;
        for session in &sessions {
            let messages = self
                .store
                .get_messages_by_session_id(&session.id)
                .map_err(|source| EngineError::MessageLoad {
                    session_id: session.id.clone(),
                    source,
                })?;
            total_messages += messages.len();
        }
        Ok(summary::build_summary(
            &sessions,
            total_messages,
            patterns,
            clusters,
            insights,
        ))
    }

    fn load_window(&self, range: &TimeRange) -> Result<Snapshot, EngineError> {
        let filter = SessionFilter {
            start: Some(range.start),
            end: Some(range.end),
            ..SessionFilter::default()
        };
        let sessions = self
            .store
            .get_sessions(&filter)
            .map_err(EngineError::SessionLoad)?;
        let mut user_messages = Vec::new();
        for session in &sessions {
            let messages = self
                .store
                .get_messages_by_session_id(&session.id)
                .map_err(|source| EngineError::MessageLoad {
                    session_id: session.id.clone(),
                    source,
                })?;
            user_messages.extend(messages.into_iter().filter(|m| m.sender == Sender::User));
        }
        let normalized = correlate::normalize_messages(&user_messages);
        Ok(Snapshot { sessions, user_messages, normalized })
    }

    fn extract_from_snapshot(
        &self,
        snapshot: &Snapshot,
        config: &PatternExtractionConfig,
    ) -> Vec<Pattern> {
        let buckets = extract::collect_buckets(
            &snapshot.user_messages,
            &self.keywords,
            config.include_entities,
        );
        let selected =
            extract::select_buckets(buckets, config.min_frequency, config.max_patterns);
        let patterns: Vec<Pattern> = selected
            .into_iter()
            .map(|bucket| {
                let related = correlate::find_related_sessions(
                    &bucket.key,
                    &snapshot.normalized,
                    &snapshot.sessions,
                );
                let types = user_types::user_types_for_sessions(&related);
                extract::materialize(bucket, types)
            })
            .collect();
        similarity::merge_similar(patterns, config.similarity_threshold)
    }

    /// Real period-over-period deltas: the window is split at its midpoint
    /// and both halves re-extracted with the frequency floor relaxed to 1,
    /// so low-volume halves still register.
    fn trend_insights(
        &self,
        config: &PatternExtractionConfig,
        patterns: &[Pattern],
    ) -> Result<Vec<Insight>, EngineError> {
        let TimeRange { start, end } = config.time_range;
        if end <= start {
            return Ok(Vec::new());
        }
        let midpoint = start + (end - start) / 2;
        let window_config = PatternExtractionConfig {
            min_frequency: 1,
            ..config.clone()
        };
        let previous = {
            let snapshot = self.load_window(&TimeRange { start, end: midpoint })?;
            self.extract_from_snapshot(&snapshot, &window_config)
        };
        let current = {
            let snapshot = self.load_window(&TimeRange { start: midpoint, end })?;
            self.extract_from_snapshot(&snapshot, &window_config)
        };
        Ok(insight::trend_insights(
            &self.keywords.trend_topics,
            &previous,
            &current,
            patterns,
        ))
    }
}
