//! Textual similarity scoring between item titles.
//!
//! Four interchangeable algorithms behind a by-name selector:
//! - normalized edit distance (strsim Levenshtein)
//! - Gestalt contiguous-block matching ratio
//! - Jaccard over whitespace token sets
//! - cosine over stop-word-filtered term-frequency vectors
//!
//! All scoring is pure and side-effect-free: inputs are normalized
//! (lower-cased, surrounding whitespace trimmed), results land in [0, 1]
//! and are rounded to 5 decimal digits. Safe to call from any thread.

mod gestalt;
mod tokens;

use serde::{Deserialize, Serialize};
use strsim::normalized_levenshtein;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityAlgorithm {
    Levenshtein,
    Gestalt,
    Jaccard,
    Cosine,
}

impl SimilarityAlgorithm {
    /// Select an algorithm by name (case-insensitive). Unknown names fall
    /// back to the edit-distance algorithm.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "gestalt" => SimilarityAlgorithm::Gestalt,
            "jaccard" => SimilarityAlgorithm::Jaccard,
            "cosine" => SimilarityAlgorithm::Cosine,
            "levenshtein" => SimilarityAlgorithm::Levenshtein,
            _ => SimilarityAlgorithm::Levenshtein,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityAlgorithm::Levenshtein => "levenshtein",
            SimilarityAlgorithm::Gestalt => "gestalt",
            SimilarityAlgorithm::Jaccard => "jaccard",
            SimilarityAlgorithm::Cosine => "cosine",
        }
    }
}

/// Normalize a title for comparison: lower-case, trim surrounding whitespace.
fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Score the similarity of two texts under the given algorithm.
///
/// Empty-input rule, applied before dispatch: two empty (post-normalization)
/// inputs are identical and score 1.0, which also covers edit distance's
/// max-length-0 case; a single empty side scores 0.0.
pub fn score(text_1: &str, text_2: &str, algorithm: SimilarityAlgorithm) -> f64 {
    let t1 = normalize(text_1);
    let t2 = normalize(text_2);

    if t1.is_empty() && t2.is_empty() {
        return 1.0;
    }
    if t1.is_empty() || t2.is_empty() {
        return 0.0;
    }

    let raw = match algorithm {
        SimilarityAlgorithm::Levenshtein => normalized_levenshtein(&t1, &t2),
        SimilarityAlgorithm::Gestalt => gestalt::ratio(&t1, &t2),
        SimilarityAlgorithm::Jaccard => tokens::jaccard(&t1, &t2),
        SimilarityAlgorithm::Cosine => tokens::cosine(&t1, &t2),
    };

    round5(raw.clamp(0.0, 1.0))
}

/// Round to 5 decimal digits; keeps scores stable across recomputation.
fn round5(x: f64) -> f64 {
    (x * 100_000.0).round() / 100_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SimilarityAlgorithm; 4] = [
        SimilarityAlgorithm::Levenshtein,
        SimilarityAlgorithm::Gestalt,
        SimilarityAlgorithm::Jaccard,
        SimilarityAlgorithm::Cosine,
    ];

    // -------------------------------------------------------------------------
    // Selector tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_selector_known_names() {
        assert_eq!(
            SimilarityAlgorithm::from_name("levenshtein"),
            SimilarityAlgorithm::Levenshtein
        );
        assert_eq!(
            SimilarityAlgorithm::from_name("gestalt"),
            SimilarityAlgorithm::Gestalt
        );
        assert_eq!(
            SimilarityAlgorithm::from_name("jaccard"),
            SimilarityAlgorithm::Jaccard
        );
        assert_eq!(
            SimilarityAlgorithm::from_name("cosine"),
            SimilarityAlgorithm::Cosine
        );
    }

    #[test]
    fn test_selector_is_case_insensitive() {
        assert_eq!(
            SimilarityAlgorithm::from_name(" Cosine "),
            SimilarityAlgorithm::Cosine
        );
    }

    #[test]
    fn test_selector_unknown_falls_back_to_edit_distance() {
        assert_eq!(
            SimilarityAlgorithm::from_name("soundex"),
            SimilarityAlgorithm::Levenshtein
        );
        assert_eq!(
            SimilarityAlgorithm::from_name(""),
            SimilarityAlgorithm::Levenshtein
        );
    }

    #[test]
    fn test_selector_name_round_trip() {
        for algo in ALL {
            assert_eq!(SimilarityAlgorithm::from_name(algo.as_str()), algo);
        }
    }

    // -------------------------------------------------------------------------
    // Empty-input rule
    // -------------------------------------------------------------------------

    #[test]
    fn test_both_empty_scores_one_for_every_algorithm() {
        for algo in ALL {
            assert_eq!(score("", "", algo), 1.0, "{:?}", algo);
            // Whitespace-only normalizes to empty.
            assert_eq!(score("   ", "\t", algo), 1.0, "{:?}", algo);
        }
    }

    #[test]
    fn test_one_sided_empty_scores_zero_for_every_algorithm() {
        for algo in ALL {
            assert_eq!(score("a", "", algo), 0.0, "{:?}", algo);
            assert_eq!(score("", "samsung", algo), 0.0, "{:?}", algo);
        }
    }

    // -------------------------------------------------------------------------
    // Normalization
    // -------------------------------------------------------------------------

    #[test]
    fn test_case_and_surrounding_whitespace_ignored() {
        for algo in ALL {
            assert_eq!(
                score("  Celular Samsung  ", "celular samsung", algo),
                1.0,
                "{:?}",
                algo
            );
        }
    }

    // -------------------------------------------------------------------------
    // Edit distance
    // -------------------------------------------------------------------------

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(
            score("samsung galaxy s23", "samsung galaxy s23", SimilarityAlgorithm::Levenshtein),
            1.0
        );
    }

    #[test]
    fn test_levenshtein_single_substitution() {
        // distance 1 over max length 4
        assert_eq!(score("kase", "case", SimilarityAlgorithm::Levenshtein), 0.75);
    }

    #[test]
    fn test_levenshtein_similar_titles_score_midrange() {
        let s = score(
            "Samsung Galaxy S23",
            "Samsung S23 128GB",
            SimilarityAlgorithm::Levenshtein,
        );
        assert!(s > 0.0 && s < 1.0, "got {}", s);
    }

    // -------------------------------------------------------------------------
    // Gestalt ratio
    // -------------------------------------------------------------------------

    #[test]
    fn test_gestalt_identical() {
        assert_eq!(score("iphone 14 pro", "iphone 14 pro", SimilarityAlgorithm::Gestalt), 1.0);
    }

    #[test]
    fn test_gestalt_known_ratio() {
        // longest block "bcd" (3 chars) out of 4 + 4 total: 2*3/8
        assert_eq!(score("abcd", "bcde", SimilarityAlgorithm::Gestalt), 0.75);
    }

    #[test]
    fn test_gestalt_disjoint() {
        assert_eq!(score("abc", "xyz", SimilarityAlgorithm::Gestalt), 0.0);
    }

    // -------------------------------------------------------------------------
    // Jaccard
    // -------------------------------------------------------------------------

    #[test]
    fn test_jaccard_token_order_does_not_matter() {
        assert_eq!(
            score("samsung galaxy s23", "s23 galaxy samsung", SimilarityAlgorithm::Jaccard),
            1.0
        );
    }

    #[test]
    fn test_jaccard_partial_overlap() {
        // intersection {b}, union {a, b, c}
        assert_eq!(score("a b", "b c", SimilarityAlgorithm::Jaccard), 0.33333);
    }

    #[test]
    fn test_jaccard_disjoint() {
        assert_eq!(score("galaxy", "iphone", SimilarityAlgorithm::Jaccard), 0.0);
    }

    // -------------------------------------------------------------------------
    // Cosine
    // -------------------------------------------------------------------------

    #[test]
    fn test_cosine_identical_up_to_order() {
        assert_eq!(
            score("samsung galaxy", "galaxy samsung", SimilarityAlgorithm::Cosine),
            1.0
        );
    }

    #[test]
    fn test_cosine_stop_words_do_not_count() {
        assert_eq!(
            score("celular de samsung", "celular samsung", SimilarityAlgorithm::Cosine),
            1.0
        );
    }

    #[test]
    fn test_cosine_zero_norm_after_stop_word_removal() {
        // "de la" is all stop words: zero vector on one side.
        assert_eq!(score("de la", "samsung galaxy", SimilarityAlgorithm::Cosine), 0.0);
    }

    #[test]
    fn test_cosine_disjoint() {
        assert_eq!(score("galaxy s23", "iphone pro", SimilarityAlgorithm::Cosine), 0.0);
    }

    // -------------------------------------------------------------------------
    // Bounds and rounding
    // -------------------------------------------------------------------------

    #[test]
    fn test_scores_pinned_to_unit_interval() {
        let pairs = [
            ("Celular Samsung Galaxy S23", "Samsung S23 128GB"),
            ("iPhone 14 Pro", "Samsung S23 128GB"),
            ("a", "aaaaaaaaaaaaaaaa"),
            ("x y z", "z"),
            ("one", "one"),
        ];
        for (t1, t2) in pairs {
            for algo in ALL {
                let s = score(t1, t2, algo);
                assert!((0.0..=1.0).contains(&s), "{:?} {} {} -> {}", algo, t1, t2, s);
            }
        }
    }

    #[test]
    fn test_rounding_is_stable_to_five_decimals() {
        let s = score("a b", "b c", SimilarityAlgorithm::Jaccard);
        // Re-rounding changes nothing, and the value sits on a 1e-5 grid point.
        assert_eq!(s, round5(s));
        assert!((s * 100_000.0 - (s * 100_000.0).round()).abs() < 1e-6);
    }
}
