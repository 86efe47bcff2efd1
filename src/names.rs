//! GNIS stream-name normalization and comparison.

use crate::barrier::NameMatch;
use std::collections::BTreeSet;

/// Normalize a name for comparison: case-fold, strip punctuation, collapse
/// whitespace.
pub fn normalize(name: &str) -> String {
    let stripped: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Jaccard similarity of the normalized token sets of two names, in `[0, 1]`.
pub fn token_set_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    intersection as f64 / union as f64
}

/// Classify the agreement between a barrier name and a flowline name.
///
/// Absent names on either side yield [`NameMatch::None`].
pub fn classify(
    barrier_name: Option<&str>,
    flowline_name: Option<&str>,
    fuzzy_threshold: f64,
) -> NameMatch {
    let (Some(b), Some(f)) = (barrier_name, flowline_name) else {
        return NameMatch::None;
    };
    let b = normalize(b);
    let f = normalize(f);
    if b.is_empty() || f.is_empty() {
        return NameMatch::None;
    }
    if b == f {
        return NameMatch::Exact;
    }
    if token_set_similarity(&b, &f) >= fuzzy_threshold {
        return NameMatch::Fuzzy;
    }
    NameMatch::None
}
