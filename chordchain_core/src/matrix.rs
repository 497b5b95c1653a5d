// Row-stochastic transition matrices and their vocabulary index.
//
// `build_matrix` turns a `TransitionCounts` table into an `NgramModel`:
//
// 1. Filter: destinations with count < `min_count` are dropped, then sources
//    left with no destinations.
// 2. Vocabulary: union of surviving sources and destinations. Empty means
//    `EmptyVocabulary`.
// 3. Index: the vocabulary is sorted (`Ngram`'s lexicographic order) and
//    numbered 0..V, so identical counts always give identical indices.
// 4. Normalize: each surviving row is divided by its own total. No
//    smoothing; unseen transitions are exactly 0.
// 5. Representation: dense V*V storage up to `sparse_threshold` rows,
//    compressed sparse rows (CSR) above it.
//
// Downstream code programs against `TransitionRows` only and never cares
// which representation it got. Matrices are immutable once built; the store
// always persists the CSR form.

use crate::counter::TransitionCounts;
use crate::error::{ChordChainError, Result};
use crate::ngram::Ngram;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Tolerance used when checking that rows are probability distributions.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// A borrowed view of one matrix row.
#[derive(Clone, Copy, Debug)]
pub enum RowView<'a> {
    Dense(&'a [f64]),
    Sparse {
        indices: &'a [usize],
        values: &'a [f64],
        dim: usize,
    },
}

impl RowView<'_> {
    /// Non-zero `(column, probability)` pairs in column order.
    pub fn entries(&self) -> Vec<(usize, f64)> {
        match *self {
            RowView::Dense(values) => values
                .iter()
                .enumerate()
                .filter(|&(_, &p)| p != 0.0)
                .map(|(j, &p)| (j, p))
                .collect(),
            RowView::Sparse {
                indices, values, ..
            } => indices.iter().copied().zip(values.iter().copied()).collect(),
        }
    }

    pub fn sum(&self) -> f64 {
        match *self {
            RowView::Dense(values) => values.iter().sum(),
            RowView::Sparse { values, .. } => values.iter().sum(),
        }
    }

    pub fn to_dense(&self) -> Vec<f64> {
        match *self {
            RowView::Dense(values) => values.to_vec(),
            RowView::Sparse {
                indices,
                values,
                dim,
            } => {
                let mut out = vec![0.0; dim];
                for (&j, &p) in indices.iter().zip(values) {
                    out[j] = p;
                }
                out
            }
        }
    }
}

/// The capability every matrix representation offers.
pub trait TransitionRows {
    /// Number of rows (and columns).
    fn dim(&self) -> usize;

    /// Row `i`, or `None` if out of range.
    fn row(&self, i: usize) -> Option<RowView<'_>>;

    /// Count of stored non-zero cells.
    fn non_zero(&self) -> usize;

    fn row_sum(&self, i: usize) -> f64 {
        self.row(i).map(|r| r.sum()).unwrap_or(0.0)
    }

    fn row_dense(&self, i: usize) -> Vec<f64> {
        self.row(i)
            .map(|r| r.to_dense())
            .unwrap_or_else(|| vec![0.0; self.dim()])
    }

    /// Probability of moving from `i` to `j`.
    fn get(&self, i: usize, j: usize) -> f64 {
        self.row(i)
            .and_then(|r| r.entries().into_iter().find(|&(col, _)| col == j))
            .map(|(_, p)| p)
            .unwrap_or(0.0)
    }

    /// Rows with at least one outgoing transition.
    fn active_rows(&self) -> usize {
        (0..self.dim()).filter(|&i| self.row_sum(i) > 0.0).count()
    }
}

/// Row-major V*V storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    dim: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    pub fn zeros(dim: usize) -> Self {
        DenseMatrix {
            dim,
            data: vec![0.0; dim * dim],
        }
    }

    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.dim + j] = value;
    }
}

impl TransitionRows for DenseMatrix {
    fn dim(&self) -> usize {
        self.dim
    }

    fn row(&self, i: usize) -> Option<RowView<'_>> {
        if i >= self.dim {
            return None;
        }
        Some(RowView::Dense(&self.data[i * self.dim..(i + 1) * self.dim]))
    }

    fn non_zero(&self) -> usize {
        self.data.iter().filter(|&&p| p != 0.0).count()
    }
}

/// Compressed sparse row storage: row `i` occupies
/// `indices[indptr[i]..indptr[i + 1]]` and the matching `values`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    dim: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Build from per-row `(column, value)` lists. Columns within a row must
    /// be strictly increasing.
    pub fn from_rows(dim: usize, rows: &[Vec<(usize, f64)>]) -> Self {
        let mut indptr = Vec::with_capacity(dim + 1);
        let mut indices = Vec::new();
        let mut values = Vec::new();
        indptr.push(0);
        for i in 0..dim {
            if let Some(row) = rows.get(i) {
                for &(j, p) in row {
                    indices.push(j);
                    values.push(p);
                }
            }
            indptr.push(indices.len());
        }
        CsrMatrix {
            dim,
            indptr,
            indices,
            values,
        }
    }

    /// Check structural consistency of a decoded matrix.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.indptr.len() != self.dim + 1 {
            return Err(format!(
                "indptr has {} entries, expected {}",
                self.indptr.len(),
                self.dim + 1
            ));
        }
        if self.indices.len() != self.values.len() {
            return Err("indices and values differ in length".into());
        }
        if self.indptr.first() != Some(&0) || self.indptr.last() != Some(&self.indices.len()) {
            return Err("indptr does not span the stored values".into());
        }
        if self.indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err("indptr is not monotonic".into());
        }
        if let Some(&bad) = self.indices.iter().find(|&&j| j >= self.dim) {
            return Err(format!("column index {bad} out of range for dimension {}", self.dim));
        }
        Ok(())
    }
}

impl TransitionRows for CsrMatrix {
    fn dim(&self) -> usize {
        self.dim
    }

    fn row(&self, i: usize) -> Option<RowView<'_>> {
        if i >= self.dim {
            return None;
        }
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        Some(RowView::Sparse {
            indices: &self.indices[start..end],
            values: &self.values[start..end],
            dim: self.dim,
        })
    }

    fn non_zero(&self) -> usize {
        self.values.iter().filter(|&&p| p != 0.0).count()
    }
}

/// A transition matrix in whichever representation the builder chose.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TransitionMatrix {
    Dense(DenseMatrix),
    Sparse(CsrMatrix),
}

impl TransitionMatrix {
    pub fn is_sparse(&self) -> bool {
        matches!(self, TransitionMatrix::Sparse(_))
    }

    /// The compressed form, used for persistence.
    pub fn to_csr(&self) -> CsrMatrix {
        match self {
            TransitionMatrix::Sparse(csr) => csr.clone(),
            TransitionMatrix::Dense(dense) => {
                let rows: Vec<Vec<(usize, f64)>> = (0..dense.dim)
                    .map(|i| dense.row(i).map(|r| r.entries()).unwrap_or_default())
                    .collect();
                CsrMatrix::from_rows(dense.dim, &rows)
            }
        }
    }

    fn inner(&self) -> &dyn TransitionRows {
        match self {
            TransitionMatrix::Dense(m) => m,
            TransitionMatrix::Sparse(m) => m,
        }
    }
}

impl TransitionRows for TransitionMatrix {
    fn dim(&self) -> usize {
        self.inner().dim()
    }

    fn row(&self, i: usize) -> Option<RowView<'_>> {
        self.inner().row(i)
    }

    fn non_zero(&self) -> usize {
        self.inner().non_zero()
    }
}

/// Bidirectional n-gram <-> row index mapping for one model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NgramIndex {
    /// The n-gram order all entries share.
    pub n: usize,
    pub ngram_to_idx: BTreeMap<Ngram, usize>,
    pub idx_to_ngram: Vec<Ngram>,
}

impl NgramIndex {
    /// Number a vocabulary in sorted order.
    pub fn from_vocabulary(vocabulary: BTreeSet<Ngram>) -> Self {
        let idx_to_ngram: Vec<Ngram> = vocabulary.into_iter().collect();
        let ngram_to_idx = idx_to_ngram
            .iter()
            .enumerate()
            .map(|(i, g)| (g.clone(), i))
            .collect();
        let n = idx_to_ngram.first().map(Ngram::order).unwrap_or(0);
        NgramIndex {
            n,
            ngram_to_idx,
            idx_to_ngram,
        }
    }

    pub fn len(&self) -> usize {
        self.idx_to_ngram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idx_to_ngram.is_empty()
    }

    pub fn index_of(&self, ngram: &Ngram) -> Option<usize> {
        self.ngram_to_idx.get(ngram).copied()
    }

    pub fn ngram(&self, idx: usize) -> Option<&Ngram> {
        self.idx_to_ngram.get(idx)
    }

    /// Both directions agree and cover the same indices.
    pub fn is_consistent(&self) -> bool {
        self.ngram_to_idx.len() == self.idx_to_ngram.len()
            && self
                .idx_to_ngram
                .iter()
                .enumerate()
                .all(|(i, g)| self.ngram_to_idx.get(g) == Some(&i))
    }
}

/// A matrix together with its index: the model for one genre and one order.
/// One without the other is never valid, so they only travel together.
#[derive(Clone, Debug, PartialEq)]
pub struct NgramModel {
    matrix: TransitionMatrix,
    index: NgramIndex,
}

impl NgramModel {
    pub fn new(matrix: TransitionMatrix, index: NgramIndex) -> Result<Self> {
        if matrix.dim() != index.len() {
            return Err(ChordChainError::InvalidArgument(format!(
                "matrix dimension {} does not match vocabulary size {}",
                matrix.dim(),
                index.len()
            )));
        }
        Ok(NgramModel { matrix, index })
    }

    pub fn matrix(&self) -> &TransitionMatrix {
        &self.matrix
    }

    pub fn index(&self) -> &NgramIndex {
        &self.index
    }

    pub fn order(&self) -> usize {
        self.index.n
    }

    pub fn vocabulary_size(&self) -> usize {
        self.index.len()
    }

    /// The outgoing distribution of `ngram`, if it is in the vocabulary.
    pub fn row_for(&self, ngram: &Ngram) -> Option<RowView<'_>> {
        self.index.index_of(ngram).and_then(|i| self.matrix.row(i))
    }

    /// P(to | from); 0 if either is unknown.
    pub fn probability(&self, from: &Ngram, to: &Ngram) -> f64 {
        match (self.index.index_of(from), self.index.index_of(to)) {
            (Some(i), Some(j)) => self.matrix.get(i, j),
            _ => 0.0,
        }
    }
}

/// Matrix construction parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Transitions seen fewer times than this are treated as noise.
    pub min_count: u64,
    /// Vocabularies larger than this use CSR storage.
    pub sparse_threshold: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            min_count: 1,
            sparse_threshold: 10_000,
        }
    }
}

/// Build a row-stochastic model from raw counts.
pub fn build_matrix(counts: &TransitionCounts, options: &BuildOptions) -> Result<NgramModel> {
    // Step 1: filter.
    let filtered: BTreeMap<&Ngram, Vec<(&Ngram, u64)>> = counts
        .iter()
        .filter_map(|(src, dests)| {
            let kept: Vec<(&Ngram, u64)> = dests
                .iter()
                .filter(|&(_, &c)| c >= options.min_count)
                .map(|(d, &c)| (d, c))
                .collect();
            (!kept.is_empty()).then_some((src, kept))
        })
        .collect();

    // Step 2: vocabulary.
    let mut vocabulary: BTreeSet<Ngram> = BTreeSet::new();
    for (src, dests) in &filtered {
        vocabulary.insert((*src).clone());
        vocabulary.extend(dests.iter().map(|(d, _)| (*d).clone()));
    }
    if vocabulary.is_empty() {
        return Err(ChordChainError::EmptyVocabulary);
    }

    // Step 3: deterministic index.
    let index = NgramIndex::from_vocabulary(vocabulary);
    let dim = index.len();

    // Step 4: normalized rows, columns ascending.
    let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); dim];
    for (src, dests) in &filtered {
        let total: u64 = dests.iter().map(|&(_, c)| c).sum();
        if total == 0 {
            continue;
        }
        let i = index.ngram_to_idx[*src];
        let mut row: Vec<(usize, f64)> = dests
            .iter()
            .map(|&(d, c)| (index.ngram_to_idx[d], c as f64 / total as f64))
            .collect();
        row.sort_by_key(|&(j, _)| j);
        rows[i] = row;
    }

    // Step 5: representation.
    let sparse = dim > options.sparse_threshold;
    debug!(
        "creating {}x{} {} matrix",
        dim,
        dim,
        if sparse { "sparse" } else { "dense" }
    );
    let matrix = if sparse {
        TransitionMatrix::Sparse(CsrMatrix::from_rows(dim, &rows))
    } else {
        let mut dense = DenseMatrix::zeros(dim);
        for (i, row) in rows.iter().enumerate() {
            for &(j, p) in row {
                dense.set(i, j, p);
            }
        }
        TransitionMatrix::Dense(dense)
    };

    NgramModel::new(matrix, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uni(s: &str) -> Ngram {
        Ngram::unigram(s)
    }

    fn counts(entries: &[(&str, &str, u64)]) -> TransitionCounts {
        let mut t = TransitionCounts::new();
        for &(a, b, c) in entries {
            t.add(uni(a), uni(b), c);
        }
        t
    }

    fn assert_row_stochastic(m: &impl TransitionRows) {
        for i in 0..m.dim() {
            let s = m.row_sum(i);
            assert!(
                s == 0.0 || (s - 1.0).abs() < ROW_SUM_TOLERANCE,
                "row {i} sums to {s}"
            );
        }
    }

    #[test]
    fn min_count_filters_rare_transitions() {
        let t = counts(&[("C", "Am", 3), ("C", "F", 1)]);
        let options = BuildOptions {
            min_count: 2,
            ..Default::default()
        };
        let model = build_matrix(&t, &options).unwrap();

        assert_eq!(model.index().idx_to_ngram, vec![uni("Am"), uni("C")]);
        assert_eq!(model.index().index_of(&uni("F")), None);
        assert!((model.probability(&uni("C"), &uni("Am")) - 1.0).abs() < ROW_SUM_TOLERANCE);
    }

    #[test]
    fn rows_are_normalized() {
        let t = counts(&[("C", "G", 1), ("C", "Am", 3), ("G", "C", 2), ("Am", "F", 5)]);
        let model = build_matrix(&t, &BuildOptions::default()).unwrap();
        assert_row_stochastic(model.matrix());
        assert!((model.probability(&uni("C"), &uni("Am")) - 0.75).abs() < 1e-12);
        assert!((model.probability(&uni("C"), &uni("G")) - 0.25).abs() < 1e-12);
        assert_eq!(model.probability(&uni("C"), &uni("F")), 0.0);
        // F is only a destination, so its row is empty.
        assert_eq!(model.matrix().row_sum(model.index().index_of(&uni("F")).unwrap()), 0.0);
    }

    #[test]
    fn indexing_is_deterministic_and_sorted() {
        let t = counts(&[("G", "C", 1), ("C", "Am", 1), ("Bb", "F", 1)]);
        let a = build_matrix(&t, &BuildOptions::default()).unwrap();
        let b = build_matrix(&t.clone(), &BuildOptions::default()).unwrap();
        assert_eq!(a.index().ngram_to_idx, b.index().ngram_to_idx);
        let names: Vec<String> = a.index().idx_to_ngram.iter().map(|g| g.to_string()).collect();
        assert_eq!(names, vec!["Am", "Bb", "C", "F", "G"]);
        assert!(a.index().is_consistent());
        assert_eq!(a.order(), 1);
    }

    #[test]
    fn everything_filtered_is_empty_vocabulary() {
        let t = counts(&[("C", "G", 1)]);
        let options = BuildOptions {
            min_count: 5,
            ..Default::default()
        };
        assert!(matches!(
            build_matrix(&t, &options),
            Err(ChordChainError::EmptyVocabulary)
        ));
        assert!(matches!(
            build_matrix(&TransitionCounts::new(), &BuildOptions::default()),
            Err(ChordChainError::EmptyVocabulary)
        ));
    }

    #[test]
    fn sparse_and_dense_agree() {
        let t = counts(&[("C", "G", 2), ("C", "Am", 2), ("G", "C", 1), ("Am", "G", 4)]);
        let dense = build_matrix(&t, &BuildOptions::default()).unwrap();
        let sparse = build_matrix(
            &t,
            &BuildOptions {
                min_count: 1,
                sparse_threshold: 1,
            },
        )
        .unwrap();
        assert!(!dense.matrix().is_sparse());
        assert!(sparse.matrix().is_sparse());
        assert_eq!(dense.index(), sparse.index());
        for i in 0..dense.vocabulary_size() {
            assert_eq!(dense.matrix().row_dense(i), sparse.matrix().row_dense(i));
        }
        assert_eq!(dense.matrix().non_zero(), sparse.matrix().non_zero());
        assert_eq!(dense.matrix().to_csr(), sparse.matrix().to_csr());
        assert_row_stochastic(sparse.matrix());
    }

    #[test]
    fn higher_order_models_keep_their_order() {
        let mut t = TransitionCounts::new();
        t.add(
            Ngram::from_slice(&["C", "Am"]),
            Ngram::from_slice(&["Am", "F"]),
            2,
        );
        let model = build_matrix(&t, &BuildOptions::default()).unwrap();
        assert_eq!(model.order(), 2);
        let row = model.row_for(&Ngram::from_slice(&["C", "Am"])).unwrap();
        assert_eq!(row.entries().len(), 1);
        assert_eq!(model.matrix().active_rows(), 1);
    }

    #[test]
    fn csr_validation_catches_bad_shapes() {
        let good = CsrMatrix::from_rows(2, &[vec![(1, 1.0)], vec![]]);
        assert!(good.validate().is_ok());

        let mut bad = good.clone();
        bad.indices[0] = 7;
        assert!(bad.validate().is_err());

        let mut short = good;
        short.indptr.pop();
        assert!(short.validate().is_err());
    }

    #[test]
    fn model_rejects_mismatched_index() {
        let index = NgramIndex::from_vocabulary([uni("C")].into_iter().collect());
        let matrix = TransitionMatrix::Dense(DenseMatrix::zeros(2));
        assert!(NgramModel::new(matrix, index).is_err());
    }
}
