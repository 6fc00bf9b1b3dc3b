use convoscope::extract::Pattern;
use convoscope::similarity::{jaccard, merge_similar};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

fn pattern(key: &str, frequency: usize) -> Pattern {
    Pattern {
        id: Uuid::new_v4().to_string(),
        pattern_key: key.to_string(),
        frequency,
        examples: Vec::new(),
        related_intents: BTreeSet::new(),
        user_types: BTreeSet::new(),
        common_entities: BTreeMap::new(),
        average_sentiment_score: None,
    }
}

#[test]
fn jaccard_properties() {
    assert_eq!(jaccard("charger broken red", "charger broken red"), 1.0);
    let ab = jaccard("charger broken", "charger blinking");
    let ba = jaccard("charger blinking", "charger broken");
    assert_eq!(ab, ba);
    assert!((0.0..=1.0).contains(&ab));
    assert_eq!(jaccard("charger", "refund"), 0.0);
}

#[test]
fn jaccard_empty_union_is_zero() {
    assert_eq!(jaccard("", ""), 0.0);
}

#[test]
fn jaccard_ignores_token_multiplicity() {
    // token sets, not bags
    assert_eq!(jaccard("a a b", "a b"), 1.0);
}

#[test]
fn merges_above_threshold_keeping_dominant_key() {
    // 3 shared tokens of 4 distinct => Jaccard 0.75
    let a = pattern("charger charge failed station", 8);
    let b = pattern("charger charge failed", 3);
    let a_id = a.id.clone();
    let merged = merge_similar(vec![a, b], 0.7);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].frequency, 11);
    assert_eq!(merged[0].pattern_key, "charger charge failed station");
    assert_eq!(merged[0].id, a_id);
}

#[test]
fn below_threshold_stays_separate() {
    let merged = merge_similar(
        vec![pattern("charger charge failed station", 8), pattern("refund please", 3)],
        0.7,
    );
    assert_eq!(merged.len(), 2);
}

#[test]
fn merge_conserves_total_frequency() {
    let inputs = vec![
        pattern("charge fails at station", 10),
        pattern("charge fails at home", 7),
        pattern("charge fails at", 4),
        pattern("refund for broken session", 3),
    ];
    let before: usize = inputs.iter().map(|p| p.frequency).sum();
    let merged = merge_similar(inputs, 0.6);
    let after: usize = merged.iter().map(|p| p.frequency).sum();
    assert_eq!(before, after);
}

#[test]
fn merge_decisions_use_pre_merge_order() {
    // B merges into A on the first scan; C is only similar to the combined
    // bag, never to A's original key, so it must survive on its own.
    let a = pattern("a b c d", 9);
    let b = pattern("a b c e", 5);
    let c = pattern("d e f g", 4);
    let merged = merge_similar(vec![a, b, c], 0.6);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].pattern_key, "a b c d");
    assert_eq!(merged[0].frequency, 14);
    assert_eq!(merged[1].pattern_key, "d e f g");
}

#[test]
fn merge_unions_sets_and_sums_entities() {
    let mut a = pattern("charge fails at station", 8);
    a.related_intents.insert("charger_issue".to_string());
    a.user_types.insert("beginner".to_string());
    a.common_entities.insert("station_id".to_string(), 4);
    let mut b = pattern("charge fails at home", 5);
    b.related_intents.insert("home_charging".to_string());
    b.user_types.insert("expert".to_string());
    b.common_entities.insert("station_id".to_string(), 2);
    b.common_entities.insert("connector".to_string(), 1);

    let merged = merge_similar(vec![a, b], 0.6);
    assert_eq!(merged.len(), 1);
    let m = &merged[0];
    assert!(m.related_intents.contains("charger_issue"));
    assert!(m.related_intents.contains("home_charging"));
    assert!(m.user_types.contains("beginner"));
    assert!(m.user_types.contains("expert"));
    assert_eq!(m.common_entities.get("station_id"), Some(&6));
    assert_eq!(m.common_entities.get("connector"), Some(&1));
}

#[test]
fn merged_sentiment_is_frequency_weighted_over_scored_members() {
    let mut a = pattern("charge fails at station", 8);
    a.average_sentiment_score = Some(-0.5);
    let mut b = pattern("charge fails at home", 3);
    b.average_sentiment_score = Some(0.2);
    let mut c = pattern("charge fails at work", 6);
    c.average_sentiment_score = None; // unscored members carry no weight

    let merged = merge_similar(vec![a, b, c], 0.6);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].frequency, 17);
    let expected = (-0.5 * 8.0 + 0.2 * 3.0) / 11.0;
    let actual = merged[0].average_sentiment_score.unwrap();
    assert!((actual - expected).abs() < 1e-12);
}

#[test]
fn merged_sentiment_is_none_when_no_member_scored() {
    let merged = merge_similar(
        vec![pattern("charge fails at station", 8), pattern("charge fails at home", 3)],
        0.6,
    );
    assert_eq!(merged.len(), 1);
    assert!(merged[0].average_sentiment_score.is_none());
}

#[test]
fn merged_examples_dedupe_and_cap_at_five() {
    let mut a = pattern("charge fails at station", 8);
    a.examples = vec!["one".into(), "two".into(), "three".into()];
    let mut b = pattern("charge fails at home", 3);
    b.examples = vec!["two".into(), "four".into(), "five".into(), "six".into()];
    let merged = merge_similar(vec![a, b], 0.6);
    assert_eq!(
        merged[0].examples,
        vec!["one", "two", "three", "four", "five"]
    );
}

#[test]
fn result_resorted_by_merged_frequency() {
    // After merging, the second group overtakes the first.
    let a = pattern("a b c d", 6);
    let x = pattern("x y z w", 5);
    let y = pattern("x y z v", 4);
    let merged = merge_similar(vec![a, x, y], 0.6);
    assert_eq!(merged[0].pattern_key, "x y z w");
    assert_eq!(merged[0].frequency, 9);
    assert_eq!(merged[1].pattern_key, "a b c d");
}
