// Structural statistics over trained models: sparsity per (genre, order),
// averages per order, and how size and density change between orders.

use crate::error::Result;
use crate::genre::Genre;
use crate::matrix::{NgramModel, TransitionRows};
use crate::store::{GenreModels, MatrixStore};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatrixStats {
    pub genre: Genre,
    pub n: usize,
    pub rows: usize,
    pub cols: usize,
    pub non_zero: usize,
    pub total_elements: usize,
    /// `non_zero / total_elements`, 0 for an empty matrix.
    pub density: f64,
    /// N-grams with at least one outgoing transition.
    pub active_ngrams: usize,
    pub total_ngrams: usize,
}

impl MatrixStats {
    pub fn from_model(genre: Genre, model: &NgramModel) -> Self {
        let matrix = model.matrix();
        let dim = matrix.dim();
        let total_elements = dim * dim;
        let non_zero = matrix.non_zero();
        MatrixStats {
            genre,
            n: model.order(),
            rows: dim,
            cols: dim,
            non_zero,
            total_elements,
            density: ratio(non_zero as f64, total_elements as f64),
            active_ngrams: matrix.active_rows(),
            total_ngrams: model.vocabulary_size(),
        }
    }
}

/// Stats for every (genre, order) pair present in `store`. Absent pairs are
/// skipped; corrupt files are errors.
pub fn analyze_store(store: &MatrixStore, genres: &[Genre], orders: &[usize]) -> Result<Vec<MatrixStats>> {
    let mut stats = Vec::new();
    for &genre in genres {
        for &n in orders {
            if let Some(model) = store.load_order(genre, n)? {
                stats.push(MatrixStats::from_model(genre, &model));
            }
        }
    }
    Ok(stats)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderSummary {
    pub n: usize,
    pub matrices: usize,
    pub average_density: f64,
    pub average_size: f64,
}

/// Average density and dimension per order, in ascending order.
pub fn summarize_by_order(stats: &[MatrixStats]) -> Vec<OrderSummary> {
    let mut by_order: BTreeMap<usize, Vec<&MatrixStats>> = BTreeMap::new();
    for s in stats {
        by_order.entry(s.n).or_default().push(s);
    }
    by_order
        .into_iter()
        .map(|(n, group)| {
            let count = group.len() as f64;
            OrderSummary {
                n,
                matrices: group.len(),
                average_density: group.iter().map(|s| s.density).sum::<f64>() / count,
                average_size: group.iter().map(|s| s.rows as f64).sum::<f64>() / count,
            }
        })
        .collect()
}

/// Relative change from a lower-order model to a higher-order one.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderComparison {
    pub genre: Genre,
    pub n1: usize,
    pub n2: usize,
    pub size1: usize,
    pub size2: usize,
    /// `(size2 - size1) / size1`.
    pub size_change: f64,
    pub density1: f64,
    pub density2: f64,
    /// `(density2 - density1) / density1`, 0 if `density1` is 0.
    pub density_change: f64,
    pub elements1: usize,
    pub elements2: usize,
}

pub fn compare_orders(genre: Genre, a: &NgramModel, b: &NgramModel) -> OrderComparison {
    let sa = MatrixStats::from_model(genre, a);
    let sb = MatrixStats::from_model(genre, b);
    OrderComparison {
        genre,
        n1: sa.n,
        n2: sb.n,
        size1: sa.total_elements,
        size2: sb.total_elements,
        size_change: ratio(sb.total_elements as f64 - sa.total_elements as f64, sa.total_elements as f64),
        density1: sa.density,
        density2: sb.density,
        density_change: ratio(sb.density - sa.density, sa.density),
        elements1: sa.total_ngrams,
        elements2: sb.total_ngrams,
    }
}

/// Compare each pair of consecutive available orders (1 vs 2, 2 vs 3, ...).
/// Fewer than two loaded orders yield nothing.
pub fn compare_adjacent_orders(models: &GenreModels) -> Vec<OrderComparison> {
    let orders = models.available_orders();
    orders
        .windows(2)
        .filter_map(|pair| {
            let a = models.get(pair[0])?;
            let b = models.get(pair[1])?;
            Some(compare_orders(models.genre(), a, b))
        })
        .collect()
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}
