// Chord tokens and n-grams extracted from raw chord strings.
//
// Corpus chord strings interleave chord symbols with structural markers such
// as `<verse_1>` or `<chorus_2>`. A token is dropped if it starts with `<` or
// ends with `>`, even when only one delimiter is present on it. Chord tokens
// are otherwise opaque: no case folding, no enharmonic normalization.
//
// An `Ngram` is the state type of every Markov model in this crate. Order 1
// models use single-token n-grams, so one vocabulary type serves all orders
// and `Ngram` ordering reduces to plain string ordering at order 1.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered run of `n` consecutive chord tokens.
///
/// Ordering is lexicographic over the tokens, which gives the deterministic
/// vocabulary order used by `matrix.rs`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ngram(Vec<String>);

impl Ngram {
    /// Build an n-gram from its tokens. Empty n-grams are not meaningful but
    /// are not rejected here; callers only build them from non-empty windows.
    pub fn new(tokens: Vec<String>) -> Self {
        Ngram(tokens)
    }

    /// A single-chord n-gram (order 1).
    pub fn unigram(chord: impl Into<String>) -> Self {
        Ngram(vec![chord.into()])
    }

    pub fn from_slice<S: AsRef<str>>(tokens: &[S]) -> Self {
        Ngram(tokens.iter().map(|t| t.as_ref().to_string()).collect())
    }

    pub fn order(&self) -> usize {
        self.0.len()
    }

    /// The most recent chord of the window. For order 1 this is the chord itself.
    pub fn last_token(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl fmt::Display for Ngram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.0.as_slice() {
            return f.write_str(single);
        }
        write!(f, "({})", self.0.join(", "))
    }
}

/// True if the token is a bracketed structural marker rather than a chord.
pub fn is_marker(token: &str) -> bool {
    token.starts_with('<') || token.ends_with('>')
}

/// Split a raw chord string on whitespace and drop structural markers.
pub fn extract_chords(raw: &str) -> Vec<String> {
    raw.split_whitespace()
        .filter(|t| !is_marker(t))
        .map(str::to_string)
        .collect()
}

/// Clean a raw chord string and slide a window of size `n` over it.
///
/// Returns `len - n + 1` n-grams, or nothing if fewer than `n` chords remain
/// (or `n` is zero).
pub fn extract_ngrams(raw: &str, n: usize) -> Vec<Ngram> {
    ngrams_from_tokens(&extract_chords(raw), n)
}

/// Windows of size `n` over an already-cleaned chord sequence.
pub fn ngrams_from_tokens<S: AsRef<str>>(chords: &[S], n: usize) -> Vec<Ngram> {
    if n == 0 || chords.len() < n {
        return Vec::new();
    }
    chords.windows(n).map(Ngram::from_slice).collect()
}
