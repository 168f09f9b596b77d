//! Wake phrase detection
//!
//! Decides whether a transcript contains the activation phrase. Matching is
//! fuzzy: a short phrase is often misheard, so literal, phonetic and alias
//! variants are all scored with [`word_bounded_similarity`] and the best one
//! wins. Containment only counts on word boundaries, so "television" never
//! wakes the assistant. False activations are filtered downstream by the
//! command threshold.

use crate::config::WakeWordConfig;
use crate::matching::{contains_words, normalize, word_bounded_similarity};

/// Word-level scan hits must exceed this similarity
const WORD_MATCH_THRESHOLD: f64 = 0.8;

/// Weight applied to word-level hits
const WORD_MATCH_WEIGHT: f64 = 0.9;

/// Shortest word considered by the word-level scan
const MIN_SCAN_WORD_CHARS: usize = 4;

/// Trailing characters a scanned word may carry past a wake token ("visionn")
const MAX_SUFFIX_CHARS: usize = 2;

/// Score of a scanned word that extends a wake token by a short suffix
const SUFFIXED_WORD_SCORE: f64 = 0.95;

/// Boost when recent history already addressed the assistant
const CONTEXT_BOOST: f64 = 1.15;

/// Number of history entries consulted for the context boost
const CONTEXT_WINDOW: usize = 3;

/// Result of wake phrase detection
#[derive(Debug, Clone, PartialEq)]
pub struct WakeDetection {
    /// Whether the confidence exceeded the activation threshold
    pub activated: bool,

    /// Wake phrase confidence in [0, 1]
    pub confidence: f64,

    /// Normalized transcript with the wake phrase removed
    pub residual: String,
}

/// Detects the wake phrase in transcribed text
#[derive(Debug, Clone)]
pub struct WakeWordDetector {
    phrase: String,
    variants: Vec<String>,
    scan_tokens: Vec<String>,
    greeting_tokens: Vec<String>,
    threshold: f64,
}

impl WakeWordDetector {
    /// Create a detector from wake phrase configuration
    ///
    /// Every variant is normalized the same way transcripts are.
    #[must_use]
    pub fn new(config: &WakeWordConfig, threshold: f64) -> Self {
        let mut variants: Vec<String> = std::iter::once(&config.phrase)
            .chain(&config.variants)
            .chain(&config.phonetic_variants)
            .chain(&config.aliases)
            .map(|v| normalize(v))
            .filter(|v| !v.is_empty())
            .collect();

        // Longest first so removal strips "hey vision" before "vision"
        variants.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        variants.dedup();

        let mut scan_tokens: Vec<String> = variants
            .iter()
            .filter_map(|v| v.split_whitespace().max_by_key(|w| w.chars().count()))
            .map(ToString::to_string)
            .collect();
        scan_tokens.sort();
        scan_tokens.dedup();

        // Leading words such as "hey" or "okay" that only count next to a hit
        let mut greeting_tokens: Vec<String> = variants
            .iter()
            .flat_map(|v| v.split_whitespace())
            .filter(|w| !scan_tokens.iter().any(|t| t == *w))
            .map(ToString::to_string)
            .collect();
        greeting_tokens.sort();
        greeting_tokens.dedup();

        tracing::debug!(
            phrase = %config.phrase,
            variants = variants.len(),
            threshold,
            "wake word detector initialized"
        );

        Self {
            phrase: normalize(&config.phrase),
            variants,
            scan_tokens,
            greeting_tokens,
            threshold,
        }
    }

    /// Detect the wake phrase in a raw transcript
    ///
    /// `recent` holds the raw transcripts that preceded this one, oldest
    /// first; the last few are used for the follow-up context boost.
    #[must_use]
    pub fn detect(&self, raw: &str, recent: &[String]) -> WakeDetection {
        let text = normalize(raw);
        if text.is_empty() {
            return WakeDetection {
                activated: false,
                confidence: 0.0,
                residual: String::new(),
            };
        }

        let mut confidence = self
            .variants
            .iter()
            .map(|v| word_bounded_similarity(&text, v))
            .fold(0.0, f64::max);

        let word_hits = self.word_hits(&text);
        if let Some(best) = word_hits.iter().map(|(_, score)| *score).reduce(f64::max) {
            confidence = confidence.max(best * WORD_MATCH_WEIGHT);
        }

        if self.recently_addressed(recent) {
            confidence = (confidence * CONTEXT_BOOST).min(1.0);
        }

        let activated = confidence > self.threshold;
        let residual = if activated {
            self.strip(&text, &word_hits)
        } else {
            text
        };

        tracing::trace!(raw, confidence, activated, residual = %residual, "wake word check");

        WakeDetection {
            activated,
            confidence,
            residual,
        }
    }

    /// Whether `text` contains any wake variant as whole words
    #[must_use]
    pub fn mentions_wake_phrase(&self, text: &str) -> bool {
        let text = normalize(text);
        self.variants.iter().any(|v| contains_words(&text, v))
    }

    /// The normalized primary phrase
    #[must_use]
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// All normalized variants, longest first
    #[must_use]
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Activation threshold
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Words whose similarity to a distinctive wake token exceeds the scan threshold
    fn word_hits(&self, text: &str) -> Vec<(String, f64)> {
        text.split_whitespace()
            .filter(|w| w.chars().count() >= MIN_SCAN_WORD_CHARS)
            .filter_map(|word| {
                let score = self
                    .scan_tokens
                    .iter()
                    .map(|t| scan_score(word, t))
                    .fold(0.0, f64::max);
                (score > WORD_MATCH_THRESHOLD).then(|| (word.to_string(), score))
            })
            .collect()
    }

    fn recently_addressed(&self, recent: &[String]) -> bool {
        recent
            .iter()
            .rev()
            .take(CONTEXT_WINDOW)
            .any(|entry| self.mentions_wake_phrase(entry))
    }

    /// Remove every wake variant occurrence and word-scan hit from `text`
    ///
    /// A greeting word directly before a word-scan hit goes with it.
    fn strip(&self, text: &str, word_hits: &[(String, f64)]) -> String {
        let mut padded = format!(" {text} ");
        for variant in &self.variants {
            let needle = format!(" {variant} ");
            while padded.contains(&needle) {
                padded = padded.replacen(&needle, " ", 1);
            }
        }

        let words: Vec<&str> = padded.split_whitespace().collect();
        let is_hit = |w: &str| word_hits.iter().any(|(hit, _)| hit == w);

        words
            .iter()
            .enumerate()
            .filter(|&(i, &w)| {
                if is_hit(w) {
                    return false;
                }
                let before_hit = words.get(i + 1).is_some_and(|&next| is_hit(next));
                !(before_hit && self.greeting_tokens.iter().any(|g| g == w))
            })
            .map(|(_, w)| *w)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Similarity of one transcript word to one wake token
///
/// A word may extend the token by a short suffix; any other partial
/// overlap goes through the weighted score.
fn scan_score(word: &str, token: &str) -> f64 {
    let extra = word.chars().count().saturating_sub(token.chars().count());
    if word != token && word.starts_with(token) && extra <= MAX_SUFFIX_CHARS {
        return SUFFIXED_WORD_SCORE;
    }
    word_bounded_similarity(word, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> WakeWordDetector {
        WakeWordDetector::new(&WakeWordConfig::default(), 0.65)
    }

    #[test]
    fn accepts_wake_phrase_with_command() {
        let detection = detector().detect("Hey Vision, camera", &[]);
        assert!(detection.activated);
        assert!(detection.confidence > 0.9);
        assert_eq!(detection.residual, "camera");
    }

    #[test]
    fn rejects_unrelated_speech() {
        let detection = detector().detect("what a nice day", &[]);
        assert!(!detection.activated);
        assert!(detection.confidence < 0.65);
    }

    #[test]
    fn accepts_misheard_phrase() {
        let detection = detector().detect("hay vishun navigation", &[]);
        assert!(detection.activated);
        assert_eq!(detection.residual, "navigation");
    }

    #[test]
    fn word_scan_catches_split_phrase() {
        // "visionn" survives normalization and only matches at word level
        let detection = detector().detect("okay visionn settings", &[]);
        assert!(detection.activated);
        assert!(!detection.residual.contains("vision"));
        assert!(detection.residual.contains("settings"));
    }

    #[test]
    fn embedded_alias_does_not_activate() {
        let d = detector();
        for text in [
            "the television is on",
            "I watched television yesterday",
            "provision the server",
        ] {
            let detection = d.detect(text, &[]);
            assert!(!detection.activated, "{text:?} scored {}", detection.confidence);
        }
    }

    #[test]
    fn scan_score_allows_short_suffix_only() {
        assert!((scan_score("visionn", "vision") - 0.95).abs() < f64::EPSILON);
        assert!((scan_score("vision", "vision") - 1.0).abs() < f64::EPSILON);
        assert!(scan_score("visionary", "vision") < 0.8);
        assert!(scan_score("television", "vision") < 0.8);
    }

    #[test]
    fn short_words_do_not_trigger_word_scan() {
        let detection = detector().detect("turn on lights", &[]);
        assert!(!detection.activated);
    }

    #[test]
    fn empty_input_is_inactive() {
        let detection = detector().detect("   ", &[]);
        assert!(!detection.activated);
        assert!(detection.confidence.abs() < f64::EPSILON);
        assert!(detection.residual.is_empty());
    }

    #[test]
    fn context_boost_is_capped() {
        let recent = vec!["hey vision camera".to_string()];
        let detection = detector().detect("hey vision status", &recent);
        assert!(detection.confidence <= 1.0);
        assert!(detection.activated);
    }

    #[test]
    fn context_boost_raises_borderline_score() {
        let d = detector();
        let plain = d.detect("hey vishan", &[]);
        let boosted = d.detect("hey vishan", &["hey vision help".to_string()]);
        assert!(boosted.confidence > plain.confidence || boosted.confidence >= 1.0);
    }

    #[test]
    fn variants_are_longest_first() {
        let d = detector();
        let lengths: Vec<usize> = d.variants().iter().map(|v| v.chars().count()).collect();
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(d.phrase(), "hey vision");
    }
}
