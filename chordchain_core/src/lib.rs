// Chordchain Core
//
// Learns per-genre chord transition statistics from a labeled song corpus
// and samples new progressions from them with a variable-order Markov chain
// that backs off from 4-grams to single chords.
//
// Architecture:
// - ngram.rs: Chord token cleaning and overlapping n-gram windows
// - corpus.rs: Song records (tolerant JSON parsing) and cleaned per-genre sequences
// - genre.rs: The fixed genre registry with case-insensitive resolution
// - counter.rs: Per-genre source -> destination transition counts
// - matrix.rs: Min-count filtering, sorted indexing, row-stochastic dense/CSR matrices
// - store.rs: Per-(genre, order) bincode persistence; missing files are cache misses
// - markov.rs: Back-off generator (4 -> 3 -> 2 -> 1 -> uniform)
// - random.rs: Random excerpts cut from corpus songs, with concatenation fallback
// - completion.rs: First-order completion over distinct recorded successors
// - input.rs: Chord symbol validation and suggestions against the vocabulary
// - controller.rs: Builds the generator's input context from a user seed
// - training.rs: Batched corpus -> counts -> matrices -> store pipeline
// - analysis.rs: Sparsity statistics and order-to-order comparisons
// - error.rs: Error taxonomy
//
// Every stochastic operation takes the random source as a parameter, so a
// seeded `StdRng` reproduces output exactly.

pub mod analysis;
pub mod completion;
pub mod controller;
pub mod corpus;
pub mod counter;
pub mod error;
pub mod genre;
pub mod input;
pub mod markov;
pub mod matrix;
pub mod ngram;
pub mod random;
pub mod store;
pub mod training;

pub use error::{ChordChainError, Result};
