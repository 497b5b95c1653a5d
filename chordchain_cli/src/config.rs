// Application configuration.
//
// `AppConfig` is loaded from an optional JSON file; every field has a
// default, so `{}` is a complete config. Paths left unset are derived from
// `data_dir`:
//
//   <data_dir>/chordonomicon.jsonl      corpus (JSON Lines)
//   <data_dir>/Matrices/                trained models, see `MatrixStore`
//   <data_dir>/Chord_Sequences/         generated sequences
//
// Command-line flags are applied on top by `main.rs`.

use anyhow::Context;
use chordchain_core::matrix::BuildOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub corpus_path: Option<PathBuf>,
    pub matrices_dir: Option<PathBuf>,
    pub sequences_dir: Option<PathBuf>,
    /// Minimum transition count for orders 2 and up. Unigram models always
    /// keep every transition.
    pub min_count: u64,
    pub sparse_threshold: usize,
    pub ngram_orders: Vec<usize>,
    /// Genres counted per corpus scan during training.
    pub batch_size: usize,
    /// Input-context length used when `generate` is given no `--input-length`.
    pub input_length: usize,
    /// Output length used when `generate` is given no `--length`.
    pub output_length: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: PathBuf::from("Data"),
            corpus_path: None,
            matrices_dir: None,
            sequences_dir: None,
            min_count: 2,
            sparse_threshold: 10_000,
            ngram_orders: vec![1, 2, 3, 4],
            batch_size: 5,
            input_length: 4,
            output_length: 16,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("parsing config JSON")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn corpus_path(&self) -> PathBuf {
        self.corpus_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("chordonomicon.jsonl"))
    }

    pub fn matrices_dir(&self) -> PathBuf {
        self.matrices_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("Matrices"))
    }

    pub fn sequences_dir(&self) -> PathBuf {
        self.sequences_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("Chord_Sequences"))
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            min_count: self.min_count,
            sparse_threshold: self.sparse_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_the_default() {
        assert_eq!(AppConfig::from_json("{}").unwrap(), AppConfig::default());
    }

    #[test]
    fn paths_derive_from_data_dir() {
        let config = AppConfig::from_json(r#"{"data_dir": "/tmp/cc"}"#).unwrap();
        assert_eq!(config.matrices_dir(), PathBuf::from("/tmp/cc/Matrices"));
        assert_eq!(config.sequences_dir(), PathBuf::from("/tmp/cc/Chord_Sequences"));
        assert_eq!(config.corpus_path(), PathBuf::from("/tmp/cc/chordonomicon.jsonl"));
    }

    #[test]
    fn explicit_paths_win() {
        let config = AppConfig::from_json(
            r#"{"corpus_path": "songs.jsonl", "matrices_dir": "m", "min_count": 3, "ngram_orders": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(config.corpus_path(), PathBuf::from("songs.jsonl"));
        assert_eq!(config.matrices_dir(), PathBuf::from("m"));
        assert_eq!(config.sequences_dir(), PathBuf::from("Data/Chord_Sequences"));
        assert_eq!(config.build_options().min_count, 3);
        assert_eq!(config.ngram_orders, vec![1, 2]);
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(AppConfig::from_json(r#"{"min_count": "lots"}"#).is_err());
    }

    #[test]
    fn load_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"batch_size": 2}"#).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap().batch_size, 2);
        assert!(AppConfig::load(&dir.path().join("missing.json")).is_err());
    }
}
