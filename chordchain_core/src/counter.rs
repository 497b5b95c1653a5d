// Transition counting over the corpus.
//
// One pass over the records produces, per genre, a two-level ordered map
// source n-gram -> destination n-gram -> count. Tables are built fresh on
// every call and never updated incrementally: retraining replaces them.
//
// Malformed records are skipped, never fatal. The corpus is large and
// noisy, and losing one song is preferable to aborting a multi-minute scan.

use crate::corpus::SongRecord;
use crate::error::{ChordChainError, Result};
use crate::ngram::{Ngram, ngrams_from_tokens};
use std::collections::BTreeMap;
use tracing::debug;

/// Source n-gram -> destination n-gram -> occurrence count, for one genre
/// and one order. Every source present has at least one destination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionCounts {
    table: BTreeMap<Ngram, BTreeMap<Ngram, u64>>,
}

impl TransitionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observed `from -> to` transition.
    pub fn increment(&mut self, from: Ngram, to: Ngram) {
        *self.table.entry(from).or_default().entry(to).or_insert(0) += 1;
    }

    /// Record `count` observations at once. A zero count is ignored so the
    /// "at least one destination" invariant holds.
    pub fn add(&mut self, from: Ngram, to: Ngram, count: u64) {
        if count == 0 {
            return;
        }
        *self.table.entry(from).or_default().entry(to).or_insert(0) += count;
    }

    pub fn get(&self, from: &Ngram) -> Option<&BTreeMap<Ngram, u64>> {
        self.table.get(from)
    }

    pub fn count(&self, from: &Ngram, to: &Ngram) -> u64 {
        self.table
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of distinct source n-grams.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ngram, &BTreeMap<Ngram, u64>)> {
        self.table.iter()
    }
}

/// Per-genre transition tables, keyed by the requested genre label.
pub type GenreTransitions = BTreeMap<String, TransitionCounts>;

/// Count order-`n` transitions for every requested genre.
///
/// Record genres match requested labels case-insensitively, the same rule
/// `ChordCorpus::from_records` applies. Chords are cleaned with
/// `ChordField::chords`, so comma-separated text counts like spaced text.
///
/// Records are skipped when the genre is missing or not requested, when the
/// chord field is missing or empty, or when the song yields fewer than two
/// n-grams. Genres that produced no transitions are absent from the result.
pub fn count_transitions(
    records: &[SongRecord],
    genres: &[&str],
    n: usize,
) -> Result<GenreTransitions> {
    if genres.is_empty() {
        return Err(ChordChainError::InvalidArgument(
            "genres must be a non-empty collection".into(),
        ));
    }
    if n < 1 {
        return Err(ChordChainError::InvalidArgument(
            "n must be at least 1".into(),
        ));
    }

    let mut result = GenreTransitions::new();
    let mut skipped = 0usize;

    for record in records {
        let (Some(genre), Some(chords)) = (&record.main_genre, &record.chords) else {
            skipped += 1;
            continue;
        };
        let genre = genre.to_lowercase();
        let Some(label) = genres.iter().find(|g| g.to_lowercase() == genre) else {
            skipped += 1;
            continue;
        };
        if chords.is_empty() {
            skipped += 1;
            continue;
        }

        let ngrams = ngrams_from_tokens(&chords.chords(), n);
        if ngrams.len() < 2 {
            skipped += 1;
            continue;
        }

        let table = result.entry(label.to_string()).or_default();
        for pair in ngrams.windows(2) {
            table.increment(pair[0].clone(), pair[1].clone());
        }
    }

    debug!(
        "counted {}-gram transitions for {} genres ({} records skipped)",
        n,
        result.len(),
        skipped
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::ChordField;

    fn uni(s: &str) -> Ngram {
        Ngram::unigram(s)
    }

    #[test]
    fn counts_consecutive_chords_per_genre() {
        let records = vec![
            SongRecord::new("jazz", "C Am C Am"),
            SongRecord::new("rock", "E A"),
            SongRecord::new("metal", "E F"),
        ];
        let counts = count_transitions(&records, &["jazz", "rock"], 1).unwrap();
        assert_eq!(counts.len(), 2);
        let jazz = &counts["jazz"];
        assert_eq!(jazz.count(&uni("C"), &uni("Am")), 2);
        assert_eq!(jazz.count(&uni("Am"), &uni("C")), 1);
        assert!(!counts.contains_key("metal"));
    }

    #[test]
    fn bigram_transitions_use_overlapping_windows() {
        let records = vec![SongRecord::new("pop", "<verse_1> C G Am F")];
        let counts = count_transitions(&records, &["pop"], 2).unwrap();
        let pop = &counts["pop"];
        let cg = Ngram::from_slice(&["C", "G"]);
        let gam = Ngram::from_slice(&["G", "Am"]);
        let amf = Ngram::from_slice(&["Am", "F"]);
        assert_eq!(pop.count(&cg, &gam), 1);
        assert_eq!(pop.count(&gam, &amf), 1);
        assert_eq!(pop.len(), 2);
    }

    #[test]
    fn malformed_and_short_records_are_skipped() {
        let records = vec![
            SongRecord::default(),
            SongRecord {
                main_genre: Some("pop".into()),
                chords: None,
            },
            SongRecord::new("pop", ""),
            SongRecord::new("pop", "C"),
            SongRecord::new("", "C G"),
            SongRecord::new("pop", "C G"),
        ];
        let counts = count_transitions(&records, &["pop"], 1).unwrap();
        assert_eq!(counts["pop"].len(), 1);
        assert_eq!(counts["pop"].count(&uni("C"), &uni("G")), 1);
    }

    #[test]
    fn token_lists_are_counted() {
        let records = vec![SongRecord {
            main_genre: Some("soul".into()),
            chords: Some(ChordField::Tokens(vec!["Dm".into(), "<x>".into(), "G".into()])),
        }];
        let counts = count_transitions(&records, &["soul"], 1).unwrap();
        assert_eq!(counts["soul"].count(&uni("Dm"), &uni("G")), 1);
    }

    #[test]
    fn comma_separated_text_is_split_like_the_corpus_view() {
        let records = vec![
            SongRecord::new("pop", "C, G, Am, F"),
            SongRecord::new("rock", "C,G,Am,F"),
        ];
        let counts = count_transitions(&records, &["pop", "rock"], 1).unwrap();
        for genre in ["pop", "rock"] {
            let table = &counts[genre];
            assert_eq!(table.count(&uni("C"), &uni("G")), 1);
            assert_eq!(table.count(&uni("Am"), &uni("F")), 1);
            assert!(table.iter().all(|(from, _)| !from.to_string().contains(',')));
        }
    }

    #[test]
    fn genre_labels_match_case_insensitively() {
        let records = vec![
            SongRecord::new("Jazz", "Dm7 G7"),
            SongRecord::new("JAZZ", "G7 Cmaj7"),
        ];
        let counts = count_transitions(&records, &["jazz"], 1).unwrap();
        assert_eq!(counts.keys().collect::<Vec<_>>(), vec!["jazz"]);
        assert_eq!(counts["jazz"].count(&uni("Dm7"), &uni("G7")), 1);
        assert_eq!(counts["jazz"].count(&uni("G7"), &uni("Cmaj7")), 1);
    }

    #[test]
    fn genre_with_no_qualifying_songs_is_absent() {
        let records = vec![SongRecord::new("rap", "C")];
        let counts = count_transitions(&records, &["rap"], 1).unwrap();
        assert!(counts.is_empty());
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        assert!(matches!(
            count_transitions(&[], &[], 1),
            Err(ChordChainError::InvalidArgument(_))
        ));
        assert!(matches!(
            count_transitions(&[], &["pop"], 0),
            Err(ChordChainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn zero_counts_are_not_stored() {
        let mut t = TransitionCounts::new();
        t.add(uni("C"), uni("G"), 0);
        assert!(t.is_empty());
        t.add(uni("C"), uni("G"), 3);
        assert_eq!(t.count(&uni("C"), &uni("G")), 3);
    }
}
