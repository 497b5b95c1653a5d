// Orchestration of the three user-facing workflows: train models from the
// corpus, generate a progression, and analyze what has been trained.
//
// Generation order matters: the genre is resolved before anything is read
// from disk, so a typo fails without scanning the corpus.

use crate::config::AppConfig;
use crate::output::{SavedSequence, save_sequence_to_json};
use anyhow::Context;
use chordchain_core::analysis::{
    MatrixStats, OrderComparison, OrderSummary, analyze_store, compare_adjacent_orders,
    summarize_by_order,
};
use chordchain_core::ChordChainError;
use chordchain_core::controller::ChordSequenceController;
use chordchain_core::corpus::{ChordCorpus, SongRecord, load_jsonl};
use chordchain_core::genre::Genre;
use chordchain_core::input::ChordValidator;
use chordchain_core::markov::MarkovSequenceGenerator;
use chordchain_core::store::MatrixStore;
use chordchain_core::training::{TrainingSummary, train_and_store};
use rand::Rng;
use std::path::PathBuf;
use tracing::{info, warn};

const MAX_SUGGESTIONS: usize = 5;

#[derive(Clone, Debug, Default)]
pub struct GenerateRequest {
    pub genre: String,
    /// User seed chords; may be empty.
    pub seed_chords: Vec<String>,
    pub input_length: usize,
    pub output_length: usize,
}

#[derive(Clone, Debug)]
pub struct GenerationOutcome {
    pub genre: Genre,
    pub input_sequence: Vec<String>,
    pub generated_sequence: Vec<String>,
    pub path: PathBuf,
}

fn load_records(config: &AppConfig) -> anyhow::Result<Vec<SongRecord>> {
    let path = config.corpus_path();
    load_jsonl(&path).with_context(|| format!("loading corpus {}", path.display()))
}

/// Close matches for each rejected chord, e.g. `; did you mean Am, Am7 for 'am'`.
/// Empty when nothing in the vocabulary is similar.
fn suggestion_hint(validator: &ChordValidator, rejected: &[String]) -> String {
    let mut hint = String::new();
    for chord in rejected {
        let similar = validator.suggest_similar_chords(chord, MAX_SUGGESTIONS);
        if !similar.is_empty() {
            hint.push_str(&format!("; did you mean {} for '{chord}'", similar.join(", ")));
        }
    }
    hint
}

/// Prepare the input context, run the back-off generator on the genre's
/// stored models, and save both sequences as JSON.
pub fn generate_music_sequence(
    config: &AppConfig,
    request: &GenerateRequest,
    rng: &mut impl Rng,
) -> anyhow::Result<GenerationOutcome> {
    let genre = Genre::resolve(&request.genre)?;

    let records = load_records(config)?;
    let corpus = ChordCorpus::from_records(&records, Some(genre.name()));
    info!("{} {genre} sequences in corpus", corpus.sequences().len());

    let controller = ChordSequenceController::new(&corpus);
    let input_sequence = controller
        .prepare(&request.seed_chords, request.input_length, rng)
        .map_err(|e| {
            let hint = match &e {
                ChordChainError::InvalidChords(bad) => suggestion_hint(controller.validator(), bad),
                _ => String::new(),
            };
            anyhow::Error::new(e).context(format!("preparing the input sequence{hint}"))
        })?;
    info!("input sequence: {input_sequence:?}");

    let store = MatrixStore::new(config.matrices_dir());
    let models = store.load(genre)?;
    if models.is_empty() {
        warn!("no trained {genre} models in {}; run `build` first", store.root().display());
    }

    let generator = MarkovSequenceGenerator::new(&models);
    let generated_sequence = generator
        .generate_sequence(&input_sequence, request.output_length, rng)
        .context("generating the sequence")?;

    let record = SavedSequence {
        genre: genre.name().to_string(),
        input_sequence,
        generated_sequence,
    };
    let path = save_sequence_to_json(&config.sequences_dir(), &record)?;
    info!("saved sequence to {}", path.display());

    Ok(GenerationOutcome {
        genre,
        input_sequence: record.input_sequence,
        generated_sequence: record.generated_sequence,
        path,
    })
}

/// Train every configured order for `genres` and write the models.
pub fn build_models(config: &AppConfig, genres: &[Genre]) -> anyhow::Result<TrainingSummary> {
    let records = load_records(config)?;
    let store = MatrixStore::new(config.matrices_dir());
    let summary = train_and_store(
        &records,
        genres,
        &config.ngram_orders,
        &config.build_options(),
        &store,
        config.batch_size,
    )?;
    info!(
        "trained {} models, skipped {}",
        summary.trained.len(),
        summary.skipped.len()
    );
    Ok(summary)
}

#[derive(Clone, Debug, Default)]
pub struct AnalysisReport {
    pub stats: Vec<MatrixStats>,
    pub summaries: Vec<OrderSummary>,
    pub comparisons: Vec<OrderComparison>,
}

pub fn analyze_models(config: &AppConfig, genres: &[Genre]) -> anyhow::Result<AnalysisReport> {
    let store = MatrixStore::new(config.matrices_dir());
    let stats = analyze_store(&store, genres, &config.ngram_orders)?;
    let summaries = summarize_by_order(&stats);

    let mut comparisons = Vec::new();
    for &genre in genres {
        comparisons.extend(compare_adjacent_orders(&store.load(genre)?));
    }
    Ok(AnalysisReport {
        stats,
        summaries,
        comparisons,
    })
}
