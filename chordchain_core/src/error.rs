// Error taxonomy for the chord transition engine.
//
// Only conditions the caller must act on are errors. Two situations are
// deliberately *not* represented here:
// - missing matrix/mapping files, which are cache misses and surface as
//   `None` from `store.rs` so the generator can back off to a lower order;
// - malformed corpus records, which `counter.rs` and `corpus.rs` skip.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChordChainError {
    /// Non-positive orders, empty genre collections and similar caller mistakes.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No transitions survived min-count filtering.
    #[error("no valid n-gram transitions found after filtering")]
    EmptyVocabulary,

    /// No corpus sequences (or no vocabulary) to draw from.
    #[error("no chord sequences available")]
    NoDataAvailable,

    #[error("genre '{genre}' not found; available genres: {available}")]
    UnknownGenre { genre: String, available: String },

    #[error("length must be positive, got {0}")]
    InvalidLength(usize),

    #[error("invalid chords: {}", .0.join(", "))]
    InvalidChords(Vec<String>),

    /// A model file exists but cannot be used (size mismatch, bad encoding).
    #[error("corrupt model at {}: {reason}", path.display())]
    CorruptModel { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, ChordChainError>;
