// First-order sequence completion.
//
// Extends a partial sequence chord by chord. The successor of the last chord
// is drawn uniformly from the distinct chords that ever followed it in the
// corpus; counts are ignored, unlike the weighted sampling of `markov.rs`.
// A chord with no recorded successor is followed by a uniform pick from the
// whole vocabulary.

use crate::corpus::ChordCorpus;
use crate::error::{ChordChainError, Result};
use crate::random::RandomSequenceGenerator;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

pub struct MixedSequenceCompleter<'a> {
    corpus: &'a ChordCorpus,
    successors: BTreeMap<String, Vec<String>>,
    vocabulary: Vec<String>,
}

impl<'a> MixedSequenceCompleter<'a> {
    pub fn new(corpus: &'a ChordCorpus) -> Self {
        let mut sets: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for seq in corpus.sequences() {
            for pair in seq.windows(2) {
                sets.entry(&pair[0]).or_default().insert(&pair[1]);
            }
        }
        let successors = sets
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.into_iter().map(str::to_string).collect()))
            .collect();

        MixedSequenceCompleter {
            corpus,
            successors,
            vocabulary: corpus.available_chords(),
        }
    }

    /// Recorded successors of `chord`, sorted and deduplicated.
    pub fn successors(&self, chord: &str) -> &[String] {
        self.successors.get(chord).map(Vec::as_slice).unwrap_or_default()
    }

    /// Extend `start` to exactly `target_length` chords. An empty start is
    /// handed to the random generator; a start longer than the target is
    /// truncated.
    pub fn complete_sequence(
        &self,
        start: &[String],
        target_length: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<String>> {
        if start.is_empty() {
            return RandomSequenceGenerator::new(self.corpus).get_random_sequence(target_length, rng);
        }

        let mut result = start.to_vec();
        while result.len() < target_length {
            let last = &result[result.len() - 1];
            let next = match self.successors(last) {
                [] => self.random_chord(rng)?,
                options => options[rng.random_range(0..options.len())].clone(),
            };
            result.push(next);
        }
        result.truncate(target_length);
        Ok(result)
    }

    fn random_chord(&self, rng: &mut impl Rng) -> Result<String> {
        if self.vocabulary.is_empty() {
            return Err(ChordChainError::NoDataAvailable);
        }
        Ok(self.vocabulary[rng.random_range(0..self.vocabulary.len())].clone())
    }
}
