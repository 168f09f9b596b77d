//! Multi-algorithm string similarity
//!
//! Four independent scores in [0, 1] plus a weighted fusion. Phonetic
//! similarity carries the most weight because recognizer mistakes are
//! acoustic rather than lexical.

use std::collections::HashSet;

/// Score returned when one string contains the other
const CONTAINMENT_SCORE: f64 = 0.95;

const EDIT_WEIGHT: f64 = 0.3;
const PHONETIC_WEIGHT: f64 = 0.4;
const TOKEN_WEIGHT: f64 = 0.2;
const BIGRAM_WEIGHT: f64 = 0.1;

/// Digraph-to-phoneme substitutions, applied in order
const PHONEME_MAP: &[(&str, &str)] = &[
    ("ph", "f"),
    ("gh", "f"),
    ("ck", "k"),
    ("ch", "k"),
    ("sh", "s"),
    ("th", "t"),
    ("wh", "w"),
    ("qu", "k"),
    ("x", "ks"),
    ("z", "s"),
];

/// Normalized Levenshtein similarity
///
/// `1 - distance / max(len)`, measured in chars. Two empty strings score 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }

    let distance = strsim::levenshtein(a, b);
    (1.0 - distance as f64 / longest as f64).clamp(0.0, 1.0)
}

/// Reduce a string to a rough consonant skeleton
///
/// Applies the digraph table, strips vowels, then collapses adjacent
/// repeated characters.
#[must_use]
pub fn phonetic_key(text: &str) -> String {
    let mut reduced = text.to_lowercase();
    for (from, to) in PHONEME_MAP {
        reduced = reduced.replace(from, to);
    }

    let mut key = String::with_capacity(reduced.len());
    let mut prev: Option<char> = None;
    for c in reduced.chars().filter(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')) {
        if prev != Some(c) {
            key.push(c);
        }
        prev = Some(c);
    }

    key
}

/// Edit similarity of the phonetic keys of both strings
#[must_use]
pub fn phonetic_similarity(a: &str, b: &str) -> f64 {
    edit_similarity(&phonetic_key(a), &phonetic_key(b))
}

/// Jaccard similarity of whitespace-separated token sets
///
/// Two empty inputs score 0 so that silence never looks like a match.
#[must_use]
pub fn token_jaccard(a: &str, b: &str) -> f64 {
    let left: HashSet<&str> = a.split_whitespace().collect();
    let right: HashSet<&str> = b.split_whitespace().collect();
    jaccard(&left, &right)
}

/// Jaccard similarity of character bigram sets
#[must_use]
pub fn bigram_similarity(a: &str, b: &str) -> f64 {
    jaccard(&bigrams(a), &bigrams(b))
}

/// Weighted fusion of all similarity measures
///
/// Equal strings score 1 and an empty side scores 0. When one string
/// contains the other the score short-circuits to 0.95.
#[must_use]
pub fn fused_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a.contains(b) || b.contains(a) {
        return CONTAINMENT_SCORE;
    }

    weighted_similarity(a, b)
}

/// Like [`fused_similarity`], but containment only counts on word
/// boundaries
///
/// "hey vision camera" contains "hey vision", while "television" does not
/// contain "vision". Anything short of a whole-word containment falls
/// through to the weighted score.
#[must_use]
pub fn word_bounded_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if contains_words(a, b) || contains_words(b, a) {
        return CONTAINMENT_SCORE;
    }

    weighted_similarity(a, b)
}

/// Whether `needle` occurs in `haystack` as a run of whole words
#[must_use]
pub fn contains_words(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && format!(" {haystack} ").contains(&format!(" {needle} "))
}

fn weighted_similarity(a: &str, b: &str) -> f64 {
    let score = EDIT_WEIGHT * edit_similarity(a, b)
        + PHONETIC_WEIGHT * phonetic_similarity(a, b)
        + TOKEN_WEIGHT * token_jaccard(a, b)
        + BIGRAM_WEIGHT * bigram_similarity(a, b);

    score.clamp(0.0, 1.0)
}

fn bigrams(text: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

#[allow(clippy::cast_precision_loss)]
fn jaccard<T: Eq + std::hash::Hash>(left: &HashSet<T>, right: &HashSet<T>) -> f64 {
    let union = left.union(right).count();
    if union == 0 {
        return 0.0;
    }

    left.intersection(right).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "a",
        "camera",
        "kamera",
        "hey vision",
        "hay vishun",
        "navigation to the store",
        "what nice day",
        "emergency",
        "x",
        "ß",
    ];

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn edit_similarity_basics() {
        assert!(approx(edit_similarity("", ""), 1.0));
        assert!(approx(edit_similarity("abc", ""), 0.0));
        assert!(approx(edit_similarity("kitten", "sitting"), 1.0 - 3.0 / 7.0));
    }

    #[test]
    fn phonetic_key_applies_digraphs_and_strips_vowels() {
        assert_eq!(phonetic_key("phone"), "fn");
        assert_eq!(phonetic_key("camera"), "cmr");
        assert_eq!(phonetic_key("kamera"), "kmr");
        assert_eq!(phonetic_key("vishun"), "vsn");
        assert_eq!(phonetic_key("vision"), "vsn");
        assert_eq!(phonetic_key("box"), "bks");
        assert_eq!(phonetic_key("settings"), "stngs");
    }

    #[test]
    fn phonetic_similarity_catches_misspellings() {
        assert!(approx(phonetic_similarity("vision", "vishun"), 1.0));
        assert!(phonetic_similarity("camera", "kamera") > 0.6);
    }

    #[test]
    fn token_jaccard_empty_is_zero() {
        assert!(approx(token_jaccard("", ""), 0.0));
        assert!(approx(token_jaccard("open camera", "camera open"), 1.0));
        assert!(approx(token_jaccard("open camera", "open door"), 1.0 / 3.0));
    }

    #[test]
    fn bigram_similarity_basics() {
        assert!(approx(bigram_similarity("", ""), 0.0));
        assert!(approx(bigram_similarity("ab", "ab"), 1.0));
        assert!(bigram_similarity("camera", "kamera") > 0.5);
    }

    #[test]
    fn fused_self_similarity_is_one() {
        for s in SAMPLES {
            assert!(approx(fused_similarity(s, s), 1.0), "self similarity for {s:?}");
        }
    }

    #[test]
    fn fused_is_symmetric_and_bounded() {
        for a in SAMPLES {
            for b in SAMPLES {
                let ab = fused_similarity(a, b);
                let ba = fused_similarity(b, a);
                assert!(approx(ab, ba), "asymmetric for {a:?} / {b:?}");
                assert!((0.0..=1.0).contains(&ab));
            }
        }
    }

    #[test]
    fn fused_containment_short_circuits() {
        assert!(approx(fused_similarity("hey vision camera", "hey vision"), 0.95));
        assert!(approx(fused_similarity("vision", "hey vision"), 0.95));
    }

    #[test]
    fn word_bounded_containment_needs_whole_words() {
        assert!(approx(word_bounded_similarity("hey vision camera", "hey vision"), 0.95));
        assert!(approx(word_bounded_similarity("vision", "hey vision"), 0.95));
        assert!(word_bounded_similarity("television on", "vision") < 0.5);
        assert!(word_bounded_similarity("envision", "vision") < 0.8);
        assert!(approx(word_bounded_similarity("", "vision"), 0.0));
    }

    #[test]
    fn contains_words_respects_boundaries() {
        assert!(contains_words("call help", "help"));
        assert!(contains_words("open camera now", "open camera"));
        assert!(!contains_words("television", "vision"));
        assert!(!contains_words("helpful", "help"));
        assert!(!contains_words("camera", ""));
    }

    #[test]
    fn fused_empty_side_is_neutral() {
        assert!(approx(fused_similarity("", "camera"), 0.0));
        assert!(approx(fused_similarity("camera", ""), 0.0));
    }

    #[test]
    fn fused_unrelated_is_low() {
        assert!(fused_similarity("what nice day", "hey vision") < 0.4);
    }
}
