// Corpus-backed random sequence generation.
//
// Sequences are cut directly from real songs rather than sampled from a
// model: a uniformly chosen song that is long enough supplies a uniformly
// placed window of the requested length. If no song is long enough, whole
// songs (chosen uniformly, with repetition) are concatenated and the result
// is truncated.

use crate::corpus::ChordCorpus;
use crate::error::{ChordChainError, Result};
use rand::Rng;
use tracing::debug;

pub struct RandomSequenceGenerator<'a> {
    corpus: &'a ChordCorpus,
}

impl<'a> RandomSequenceGenerator<'a> {
    pub fn new(corpus: &'a ChordCorpus) -> Self {
        RandomSequenceGenerator { corpus }
    }

    /// A sequence of exactly `length` chords taken from the corpus.
    pub fn get_random_sequence(&self, length: usize, rng: &mut impl Rng) -> Result<Vec<String>> {
        let sequences = self.corpus.sequences();
        if sequences.is_empty() {
            return Err(ChordChainError::NoDataAvailable);
        }
        if length == 0 {
            return Err(ChordChainError::InvalidLength(length));
        }

        let suitable: Vec<&Vec<String>> = sequences.iter().filter(|s| s.len() >= length).collect();
        if suitable.is_empty() {
            debug!("no corpus sequence has {length} chords, concatenating");
            return Ok(self.concatenate_random_sequences(length, rng));
        }

        let chosen = suitable[rng.random_range(0..suitable.len())];
        let start = rng.random_range(0..=chosen.len() - length);
        Ok(chosen[start..start + length].to_vec())
    }

    fn concatenate_random_sequences(&self, length: usize, rng: &mut impl Rng) -> Vec<String> {
        let sequences = self.corpus.sequences();
        let mut result = Vec::with_capacity(length);
        while result.len() < length {
            let seq = &sequences[rng.random_range(0..sequences.len())];
            result.extend(seq.iter().cloned());
        }
        result.truncate(length);
        result
    }

    /// One chord: a uniform song, then a uniform position within it.
    pub fn get_random_chord(&self, rng: &mut impl Rng) -> Result<String> {
        let sequences = self.corpus.sequences();
        if sequences.is_empty() {
            return Err(ChordChainError::NoDataAvailable);
        }
        let seq = &sequences[rng.random_range(0..sequences.len())];
        Ok(seq[rng.random_range(0..seq.len())].clone())
    }

    pub fn get_multiple_random_sequences(
        &self,
        count: usize,
        length: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<Vec<String>>> {
        (0..count)
            .map(|_| self.get_random_sequence(length, rng))
            .collect()
    }
}
