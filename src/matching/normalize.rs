//! Transcript cleanup ahead of matching

/// Filler words dropped from transcripts
const FILLER_WORDS: &[&str] = &["um", "uh", "er", "like", "well", "so", "actually"];

/// Stop words that carry no command meaning
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "please", "can", "could", "would", "you", "i", "me", "my", "to", "for",
    "of", "and", "is", "it", "are",
];

/// Normalize a transcript for matching
///
/// Lower-cases, replaces punctuation with spaces, collapses runs of three or
/// more identical characters to two, drops filler and stop words, and joins
/// the remaining words with single spaces. Idempotent.
#[must_use]
pub fn normalize(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let collapsed = collapse_runs(&lowered);
    let words: Vec<&str> = collapsed.split_whitespace().collect();

    let mut kept = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        let word = words[i];

        // "you know" is a filler phrase; "you" alone is a stop word
        if word == "you" && words.get(i + 1) == Some(&"know") {
            i += 2;
            continue;
        }

        if !FILLER_WORDS.contains(&word) && !STOP_WORDS.contains(&word) {
            kept.push(word);
        }
        i += 1;
    }

    kept.join(" ")
}

/// Collapse runs of 3+ identical characters down to 2
fn collapse_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    let mut run = 0usize;

    for c in text.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }

        if run <= 2 {
            out.push(c);
        }
    }

    out
}
