//! Gold set comparison metrics

use crate::flatten::{flatten, Entry};
use ldo_domain::GoldMetrics;
use serde_json::Value;
use std::collections::BTreeSet;
use strsim::levenshtein;

/// Integer similarity percentage `100 * (maxLen - dist) / maxLen`
///
/// Kept in integer arithmetic so the threshold comparison never sees a
/// rounding error.
pub fn similarity_percent(a: &str, b: &str) -> u32 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100;
    }
    let distance = levenshtein(a, b);
    (100 * (max_len - distance) / max_len) as u32
}

fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

/// Whether a candidate entry counts as a match for a gold entry.
///
/// Exact matches always count. Otherwise both entries must share a path,
/// neither value may contain a digit, and the rendered entries must reach
/// `threshold` percent similarity.
pub fn is_similar(candidate: &Entry, gold: &Entry, threshold: u32) -> bool {
    if candidate == gold {
        return true;
    }
    if candidate.path != gold.path || has_digit(&candidate.value) || has_digit(&gold.value) {
        return false;
    }
    similarity_percent(&candidate.render(), &gold.render()) >= threshold
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Strict `|A ∩ B| / |A ∪ B|`, 0 when both sets are empty
pub fn jaccard(a: &BTreeSet<Entry>, b: &BTreeSet<Entry>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    ratio(intersection, union)
}

/// Compare a parsed payload against its gold value
pub fn gold_metrics(candidate: &Value, gold: &Value, threshold: u32) -> GoldMetrics {
    let candidates = flatten(candidate);
    let expected = flatten(gold);

    let mut true_positives = 0;
    let mut unmatched_gold = expected.clone();

    for entry in &candidates {
        // First similar gold entry, matched or not
        if let Some(found) = expected.iter().find(|g| is_similar(entry, g, threshold)) {
            true_positives += 1;
            unmatched_gold.remove(found);
        }
    }

    let false_positives = candidates.len() - true_positives;
    let false_negatives = unmatched_gold.len();

    let precision = ratio(true_positives, true_positives + false_positives);
    let recall = ratio(true_positives, true_positives + false_negatives);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    GoldMetrics {
        true_positives,
        false_positives,
        false_negatives,
        precision,
        recall,
        f1,
        jaccard_similarity: jaccard(&candidates, &expected),
    }
}
