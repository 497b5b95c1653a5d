// Variable-order Markov chord generation with back-off.
//
// The generator extends a working sequence one chord at a time. Each step
// looks at the most recent (up to) four chords and tries, strictly in order,
// the 4-gram, 3-gram, 2-gram and 1-gram models:
//
// - skip an order if the context is shorter than n, the model for that order
//   is not loaded, the n-gram formed by the last n chords is not in its
//   vocabulary, or its row sums to zero;
// - otherwise sample a destination n-gram from the row (weighted by
//   probability) and emit its last chord.
//
// If every order declines, a chord is drawn uniformly from the 1-gram
// vocabulary. That only happens when the unigram model itself has no usable
// row for the current chord, e.g. a chord seen only at the end of songs.
//
// Randomness is always injected by the caller (`rng: &mut impl Rng`), so
// tests and `--seed` runs are reproducible.

use crate::error::{ChordChainError, Result};
use crate::matrix::{NgramModel, RowView};
use crate::ngram::Ngram;
use crate::store::{GenreModels, MAX_ORDER};
use rand::Rng;
use tracing::{debug, trace};

/// Where a generated chord came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredictionSource {
    /// Sampled from the model of this order.
    Order(usize),
    /// Drawn uniformly from the unigram vocabulary.
    UniformFallback,
}

/// One generated chord and the strategy that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prediction {
    pub chord: String,
    pub source: PredictionSource,
}

/// Samples chord sequences from one genre's models. Holds the models by
/// reference for the duration of a generation call.
pub struct MarkovSequenceGenerator<'a> {
    models: &'a GenreModels,
}

impl<'a> MarkovSequenceGenerator<'a> {
    pub fn new(models: &'a GenreModels) -> Self {
        MarkovSequenceGenerator { models }
    }

    /// Extend `seed` until it has `target_length` chords and return exactly
    /// the last `target_length` chords of the result.
    ///
    /// A seed longer than the target is trimmed from the front. Fails with
    /// `NoDataAvailable` only if a chord is needed and neither any order nor
    /// the unigram vocabulary can supply one.
    pub fn generate_sequence(
        &self,
        seed: &[String],
        target_length: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<String>> {
        Ok(self
            .generate_traced(seed, target_length, rng)?
            .into_iter()
            .map(|p| p.chord)
            .collect())
    }

    /// Like `generate_sequence`, but reports the source of every chord.
    /// Seed chords that survive trimming are reported as `Order(0)`.
    pub fn generate_traced(
        &self,
        seed: &[String],
        target_length: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<Prediction>> {
        let mut sequence: Vec<Prediction> = seed
            .iter()
            .map(|chord| Prediction {
                chord: chord.clone(),
                source: PredictionSource::Order(0),
            })
            .collect();
        let mut fallbacks = 0usize;

        while sequence.len() < target_length {
            let start = sequence.len().saturating_sub(MAX_ORDER);
            let window: Vec<&str> = sequence[start..].iter().map(|p| p.chord.as_str()).collect();

            let prediction = match self.predict_next(&window, rng) {
                Some(p) => p,
                None => {
                    fallbacks += 1;
                    Prediction {
                        chord: self.uniform_chord(rng)?,
                        source: PredictionSource::UniformFallback,
                    }
                }
            };
            trace!("next chord {} via {:?}", prediction.chord, prediction.source);
            sequence.push(prediction);
        }

        if fallbacks > 0 {
            debug!("{fallbacks} chords drawn from the uniform fallback");
        }
        let excess = sequence.len() - target_length;
        Ok(sequence.split_off(excess))
    }

    /// Try orders MAX_ORDER..=1 against the tail of `window`; first success wins.
    pub fn predict_next(&self, window: &[&str], rng: &mut impl Rng) -> Option<Prediction> {
        (1..=MAX_ORDER).rev().find_map(|n| {
            let chord = self.predict_with_order(window, n, rng)?;
            Some(Prediction {
                chord,
                source: PredictionSource::Order(n),
            })
        })
    }

    fn predict_with_order(&self, window: &[&str], n: usize, rng: &mut impl Rng) -> Option<String> {
        if window.len() < n {
            return None;
        }
        let model = self.models.get(n)?;
        let context = Ngram::from_slice(&window[window.len() - n..]);
        let row = model.row_for(&context)?;
        let next_idx = sample_row(&row, rng)?;
        model
            .index()
            .ngram(next_idx)
            .and_then(Ngram::last_token)
            .map(str::to_string)
    }

    /// A chord drawn uniformly from the unigram vocabulary.
    fn uniform_chord(&self, rng: &mut impl Rng) -> Result<String> {
        let vocabulary = self
            .models
            .get(1)
            .map(|m: &NgramModel| m.index().idx_to_ngram.as_slice())
            .unwrap_or_default();
        if vocabulary.is_empty() {
            return Err(ChordChainError::NoDataAvailable);
        }
        let pick = &vocabulary[rng.random_range(0..vocabulary.len())];
        pick.last_token()
            .map(str::to_string)
            .ok_or(ChordChainError::NoDataAvailable)
    }
}

/// Sample a column from a row, weighting by its values. The row is
/// re-normalized by its own sum, so slightly-off rows still sample correctly.
/// `None` for empty or zero-sum rows.
fn sample_row(row: &RowView<'_>, rng: &mut impl Rng) -> Option<usize> {
    let entries = row.entries();
    let total: f64 = entries.iter().map(|&(_, p)| p).sum();
    if entries.is_empty() || total <= 0.0 {
        return None;
    }

    let target = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for &(j, p) in &entries {
        cumulative += p;
        if cumulative > target {
            return Some(j);
        }
    }
    // Rounding can leave `target` just past the last boundary.
    entries.last().map(|&(j, _)| j)
}
