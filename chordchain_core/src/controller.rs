// Preparation of the input context handed to the Markov generator.

use crate::completion::MixedSequenceCompleter;
use crate::corpus::ChordCorpus;
use crate::error::{ChordChainError, Result};
use crate::input::ChordValidator;
use crate::random::RandomSequenceGenerator;
use rand::Rng;
use tracing::debug;

pub struct ChordSequenceController<'a> {
    corpus: &'a ChordCorpus,
    validator: ChordValidator,
}

impl<'a> ChordSequenceController<'a> {
    pub fn new(corpus: &'a ChordCorpus) -> Self {
        ChordSequenceController {
            corpus,
            validator: ChordValidator::new(corpus),
        }
    }

    pub fn validator(&self) -> &ChordValidator {
        &self.validator
    }

    /// Turn a user seed into a context of `input_length` chords.
    ///
    /// An empty seed is replaced by a random corpus excerpt. Otherwise every
    /// chord must be known to the corpus; a long seed keeps its first
    /// `input_length` chords and a short one is completed first-order.
    pub fn prepare(&self, seed: &[String], input_length: usize, rng: &mut impl Rng) -> Result<Vec<String>> {
        if seed.is_empty() && input_length > 0 {
            debug!("no seed chords, drawing {input_length} from the corpus");
            return RandomSequenceGenerator::new(self.corpus).get_random_sequence(input_length, rng);
        }

        let (mut valid, invalid) = self.validator.parse_chord_input(&seed.join(" "));
        if !invalid.is_empty() {
            return Err(ChordChainError::InvalidChords(invalid));
        }

        if valid.len() >= input_length {
            valid.truncate(input_length);
            return Ok(valid);
        }
        MixedSequenceCompleter::new(self.corpus).complete_sequence(&valid, input_length, rng)
    }
}
