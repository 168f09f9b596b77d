//! Text normalization and fuzzy string similarity
//!
//! Everything in here is pure and total: malformed or empty input yields an
//! empty string or a neutral score, never an error.

mod normalize;
mod similarity;

pub use normalize::normalize;
pub use similarity::{
    bigram_similarity, contains_words, edit_similarity, fused_similarity, phonetic_key,
    phonetic_similarity, token_jaccard, word_bounded_similarity,
};
