// Validation of user-supplied chord symbols against the corpus vocabulary.

use crate::corpus::ChordCorpus;
use std::collections::BTreeSet;

/// Why a chord symbol was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChordRejection {
    Empty,
    Unknown(String),
}

impl std::fmt::Display for ChordRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChordRejection::Empty => write!(f, "empty chord symbol"),
            ChordRejection::Unknown(chord) => write!(f, "chord '{chord}' not found in dataset"),
        }
    }
}

pub struct ChordValidator {
    available: BTreeSet<String>,
}

impl ChordValidator {
    pub fn new(corpus: &ChordCorpus) -> Self {
        ChordValidator {
            available: corpus.available_chords().into_iter().collect(),
        }
    }

    pub fn from_chords(chords: impl IntoIterator<Item = String>) -> Self {
        ChordValidator {
            available: chords.into_iter().collect(),
        }
    }

    /// Exact, case-sensitive membership after trimming.
    pub fn validate_chord(&self, chord: &str) -> Result<(), ChordRejection> {
        let chord = chord.trim();
        if chord.is_empty() {
            Err(ChordRejection::Empty)
        } else if self.available.contains(chord) {
            Ok(())
        } else {
            Err(ChordRejection::Unknown(chord.to_string()))
        }
    }

    /// Split free text on whitespace and commas into `(valid, invalid)`,
    /// each in input order.
    pub fn parse_chord_input(&self, input: &str) -> (Vec<String>, Vec<String>) {
        input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .partition(|chord| self.validate_chord(chord).is_ok())
    }

    /// Known chords containing `chord` or starting with it, ignoring case.
    /// Returned in sorted order, at most `max`.
    pub fn suggest_similar_chords(&self, chord: &str, max: usize) -> Vec<String> {
        let needle = chord.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.available
            .iter()
            .filter(|c| c.to_lowercase().contains(&needle))
            .take(max)
            .cloned()
            .collect()
    }

    pub fn available_chords(&self) -> impl Iterator<Item = &str> {
        self.available.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> ChordValidator {
        ChordValidator::from_chords(["C", "Cmaj7", "Am", "Am7", "F", "G7"].map(String::from))
    }

    #[test]
    fn validation_is_exact() {
        let v = validator();
        assert_eq!(v.validate_chord(" Am "), Ok(()));
        assert_eq!(v.validate_chord("am"), Err(ChordRejection::Unknown("am".into())));
        assert_eq!(v.validate_chord("   "), Err(ChordRejection::Empty));
    }

    #[test]
    fn parse_splits_on_commas_and_whitespace() {
        let v = validator();
        let (valid, invalid) = v.parse_chord_input("C, Am  Xm,F,,G7 H");
        assert_eq!(valid, vec!["C", "Am", "F", "G7"]);
        assert_eq!(invalid, vec!["Xm", "H"]);
    }

    #[test]
    fn suggestions_are_sorted_and_limited() {
        let v = validator();
        assert_eq!(v.suggest_similar_chords("am", 5), vec!["Am", "Am7"]);
        assert_eq!(v.suggest_similar_chords("7", 1), vec!["Am7"]);
        assert!(v.suggest_similar_chords("", 5).is_empty());
    }
}
