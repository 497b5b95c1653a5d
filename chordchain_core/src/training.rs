// Model training: corpus -> counts -> matrices -> store.
//
// Each order is trained independently. Within an order, genres are handled
// in batches of `batch_size`: one corpus scan per batch counts every genre in
// it, then each genre's matrix is built and saved before the next batch is
// counted, bounding how many count tables are alive at once.

use crate::corpus::SongRecord;
use crate::counter::count_transitions;
use crate::error::{ChordChainError, Result};
use crate::genre::Genre;
use crate::matrix::{BuildOptions, NgramModel, TransitionRows, build_matrix};
use crate::store::MatrixStore;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Count and build an order-`n` model for each genre.
///
/// Genres without enough data (no qualifying songs, or nothing surviving the
/// min-count filter) are logged and left out of the result.
pub fn build_genre_models(
    records: &[SongRecord],
    genres: &[Genre],
    n: usize,
    options: &BuildOptions,
) -> Result<BTreeMap<Genre, NgramModel>> {
    let labels: Vec<&str> = genres.iter().map(|g| g.name()).collect();
    let mut counts = count_transitions(records, &labels, n)?;

    let mut models = BTreeMap::new();
    for &genre in genres {
        let Some(table) = counts.remove(genre.name()) else {
            warn!("no {n}-gram transitions for {genre}, skipping");
            continue;
        };
        match build_matrix(&table, options) {
            Ok(model) => {
                models.insert(genre, model);
            }
            Err(ChordChainError::EmptyVocabulary) => {
                warn!("{genre} {n}-gram vocabulary is empty after filtering, skipping");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(models)
}

/// Options for order `n`: unigram models keep every transition, higher
/// orders apply the configured minimum count.
pub fn options_for_order(n: usize, base: &BuildOptions) -> BuildOptions {
    if n == 1 {
        BuildOptions {
            min_count: 1,
            ..base.clone()
        }
    } else {
        base.clone()
    }
}

/// One model written by `train_and_store`.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainedModel {
    pub genre: Genre,
    pub n: usize,
    pub vocabulary_size: usize,
    pub non_zero: usize,
    pub sparse: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingSummary {
    pub trained: Vec<TrainedModel>,
    /// (genre, n) pairs that had no usable data.
    pub skipped: Vec<(Genre, usize)>,
}

/// Train every requested order for every requested genre and save the
/// results to `store`.
pub fn train_and_store(
    records: &[SongRecord],
    genres: &[Genre],
    orders: &[usize],
    options: &BuildOptions,
    store: &MatrixStore,
    batch_size: usize,
) -> Result<TrainingSummary> {
    if genres.is_empty() {
        return Err(ChordChainError::InvalidArgument("no genres to train".into()));
    }
    if batch_size == 0 {
        return Err(ChordChainError::InvalidArgument(
            "batch size must be at least 1".into(),
        ));
    }

    let mut summary = TrainingSummary::default();
    for &n in orders {
        let order_options = options_for_order(n, options);
        info!(
            "training {n}-gram models (min_count {})",
            order_options.min_count
        );
        for (batch_no, batch) in genres.chunks(batch_size).enumerate() {
            info!("batch {}: {:?}", batch_no + 1, batch);
            let mut models = build_genre_models(records, batch, n, &order_options)?;
            for &genre in batch {
                let Some(model) = models.remove(&genre) else {
                    // A retrain replaces the old model, even with nothing.
                    store.remove(genre, n)?;
                    summary.skipped.push((genre, n));
                    continue;
                };
                store.save(genre, n, &model)?;
                summary.trained.push(TrainedModel {
                    genre,
                    n,
                    vocabulary_size: model.vocabulary_size(),
                    non_zero: model.matrix().non_zero(),
                    sparse: model.matrix().is_sparse(),
                });
            }
        }
    }
    Ok(summary)
}
