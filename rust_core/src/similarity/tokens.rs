//! Token-set scorers: Jaccard over whitespace token sets and cosine over
//! stop-word-filtered term-frequency vectors.

use std::collections::{HashMap, HashSet};

/// Functional words dropped before cosine vectorization. Titles originate
/// from a Spanish-language marketplace.
const STOP_WORDS: &[&str] = &[
    "de", "la", "el", "en", "y", "con", "para", "por", "del", "los", "las", "un", "una", "al", "o",
];

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// `|intersection| / |union|` of the whitespace token sets.
pub(super) fn jaccard(t1: &str, t2: &str) -> f64 {
    let s1: HashSet<&str> = t1.split_whitespace().collect();
    let s2: HashSet<&str> = t2.split_whitespace().collect();
    let union = s1.union(&s2).count();
    if union == 0 {
        return 1.0;
    }
    let intersection = s1.intersection(&s2).count();
    intersection as f64 / union as f64
}

/// Cosine similarity of term-frequency vectors after stop-word removal;
/// 0.0 when either vector has zero norm.
pub(super) fn cosine(t1: &str, t2: &str) -> f64 {
    let v1 = term_frequencies(t1);
    let v2 = term_frequencies(t2);
    if v1.is_empty() || v2.is_empty() {
        return 0.0;
    }

    let dot: f64 = v1
        .iter()
        .filter_map(|(term, count)| v2.get(term).map(|other| count * other))
        .sum();
    let norm1 = v1.values().map(|c| c * c).sum::<f64>().sqrt();
    let norm2 = v2.values().map(|c| c * c).sum::<f64>().sqrt();
    dot / (norm1 * norm2)
}

fn term_frequencies(text: &str) -> HashMap<&str, f64> {
    let mut freq = HashMap::new();
    for token in text.split_whitespace().filter(|t| !is_stop_word(t)) {
        *freq.entry(token).or_insert(0.0) += 1.0;
    }
    freq
}
