use crate::extract::{Pattern, MAX_EXAMPLES};
use std::collections::HashSet;

/// Jaccard similarity over whitespace-split token sets. Symmetric, 1.0 for
/// identical keys, defined as 0.0 when the union is empty (two empty keys).
pub fn jaccard(key_a: &str, key_b: &str) -> f64 {
    let tokens_a: HashSet<&str> = key_a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = key_b.split_whitespace().collect();
    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();
    intersection as f64 / union as f64
}

/// Greedy single-pass merge of near-duplicate patterns. Iterates patterns in
/// their given (frequency-descending) order; each unprocessed pattern absorbs
/// every later unprocessed pattern whose key is at or above the threshold.
/// Merge decisions are frozen at the pre-merge order — absorbed statistics do
/// not re-open earlier decisions — which is deterministic but not a globally
/// optimal clustering. The result is re-sorted by merged frequency.
pub fn merge_similar(patterns: Vec<Pattern>, threshold: f64) -> Vec<Pattern> {
    let n = patterns.len();
    let mut processed = vec![false; n];
    let mut merged: Vec<Pattern> = Vec::with_capacity(n);
    for i in 0..n {
        if processed[i] {
            continue;
        }
        processed[i] = true;
        let mut similars: Vec<&Pattern> = Vec::new();
        for j in (i + 1)..n {
            if processed[j] {
                continue;
            }
            if jaccard(&patterns[i].pattern_key, &patterns[j].pattern_key) >= threshold {
                processed[j] = true;
                similars.push(&patterns[j]);
            }
        }
        merged.push(merge_group(&patterns[i], &similars));
    }
    merged.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    merged
}

/// Combine statistics into the main pattern, which keeps its id and key.
/// The sentiment mean is frequency-weighted over exactly the members that
/// carry a score.
fn merge_group(main: &Pattern, similars: &[&Pattern]) -> Pattern {
    let mut merged = main.clone();
    if similars.is_empty() {
        return merged;
    }
    let mut weighted_sum = 0.0;
    let mut weight = 0usize;
    if let Some(score) = main.average_sentiment_score {
        weighted_sum += score * main.frequency as f64;
        weight += main.frequency;
    }
    for similar in similars {
        merged.frequency += similar.frequency;
        for example in &similar.examples {
            if merged.examples.len() >= MAX_EXAMPLES {
                break;
            }
            if !merged.examples.contains(example) {
                merged.examples.push(example.clone());
            }
        }
        merged
            .related_intents
            .extend(similar.related_intents.iter().cloned());
        merged.user_types.extend(similar.user_types.iter().cloned());
        for (name, count) in &similar.common_entities {
            *merged.common_entities.entry(name.clone()).or_insert(0) += count;
        }
        if let Some(score) = similar.average_sentiment_score {
            weighted_sum += score * similar.frequency as f64;
            weight += similar.frequency;
        }
    }
    merged.average_sentiment_score = if weight > 0 {
        Some(weighted_sum / weight as f64)
    } else {
        None
    };
    merged
}
