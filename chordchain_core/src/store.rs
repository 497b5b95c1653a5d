// On-disk storage of per-genre, per-order models.
//
// Layout under the store root, one directory per order:
//
//   Matrices_<n>_Gram/transition_matrix_<genre>.bin   CSR matrix (bincode)
//   Matrices_<n>_Gram/ngram_mappings_<genre>.bin      NgramIndex (bincode)
//
// Each (genre, n) pair loads independently. A missing file for a pair is a
// cache miss (`Ok(None)`), never an error: the generator treats it as "this
// order is unavailable" and backs off. Files that exist but do not decode or
// disagree with each other are `CorruptModel`.
//
// Writes go to a temporary sibling and are renamed into place, so a reader
// never observes a half-written matrix while models are being rebuilt.

use crate::error::{ChordChainError, Result};
use crate::genre::Genre;
use crate::matrix::{CsrMatrix, NgramIndex, NgramModel, TransitionMatrix, TransitionRows};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Highest n-gram order the store and generator work with.
pub const MAX_ORDER: usize = 4;

/// Directory-backed model store.
#[derive(Clone, Debug)]
pub struct MatrixStore {
    root: PathBuf,
}

impl MatrixStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MatrixStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn order_dir(&self, n: usize) -> PathBuf {
        self.root.join(format!("Matrices_{n}_Gram"))
    }

    pub fn matrix_path(&self, genre: Genre, n: usize) -> PathBuf {
        self.order_dir(n)
            .join(format!("transition_matrix_{}.bin", genre.slug()))
    }

    pub fn mapping_path(&self, genre: Genre, n: usize) -> PathBuf {
        self.order_dir(n)
            .join(format!("ngram_mappings_{}.bin", genre.slug()))
    }

    /// Persist one model, replacing any previous one for the same key.
    pub fn save(&self, genre: Genre, n: usize, model: &NgramModel) -> Result<()> {
        check_order(n)?;
        if model.order() != n {
            return Err(ChordChainError::InvalidArgument(format!(
                "model has order {} but was saved as order {n}",
                model.order()
            )));
        }
        std::fs::create_dir_all(self.order_dir(n))?;
        write_atomic(&self.matrix_path(genre, n), &model.matrix().to_csr())?;
        write_atomic(&self.mapping_path(genre, n), model.index())?;
        info!(
            "saved {genre} {n}-gram model ({} entries)",
            model.vocabulary_size()
        );
        Ok(())
    }

    /// Delete the stored model for one key, if any. Returns whether anything
    /// was removed; a missing file is not an error.
    pub fn remove(&self, genre: Genre, n: usize) -> Result<bool> {
        check_order(n)?;
        let mut removed = false;
        for path in [self.matrix_path(genre, n), self.mapping_path(genre, n)] {
            match std::fs::remove_file(&path) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        if removed {
            info!("removed stale {genre} {n}-gram model");
        }
        Ok(removed)
    }

    /// Load one model. `Ok(None)` if either file is absent.
    pub fn load_order(&self, genre: Genre, n: usize) -> Result<Option<NgramModel>> {
        check_order(n)?;
        let matrix_path = self.matrix_path(genre, n);
        let mapping_path = self.mapping_path(genre, n);
        if !matrix_path.exists() || !mapping_path.exists() {
            debug!("no {genre} {n}-gram model on disk");
            return Ok(None);
        }

        let csr: CsrMatrix = read_blob(&matrix_path)?;
        csr.validate().map_err(|reason| ChordChainError::CorruptModel {
            path: matrix_path.clone(),
            reason,
        })?;
        let index: NgramIndex = read_blob(&mapping_path)?;
        if index.n != n || !index.is_consistent() {
            return Err(ChordChainError::CorruptModel {
                path: mapping_path,
                reason: format!("mapping is inconsistent or has order {}", index.n),
            });
        }
        if csr.dim() != index.len() {
            return Err(ChordChainError::CorruptModel {
                path: matrix_path,
                reason: format!(
                    "matrix dimension {} does not match {} mapped n-grams",
                    csr.dim(),
                    index.len()
                ),
            });
        }
        NgramModel::new(TransitionMatrix::Sparse(csr), index).map(Some)
    }

    /// Load every available order (1..=MAX_ORDER) for a genre.
    pub fn load(&self, genre: Genre) -> Result<GenreModels> {
        let mut models = GenreModels::new(genre);
        for n in 1..=MAX_ORDER {
            if let Some(model) = self.load_order(genre, n)? {
                models.insert(model);
            }
        }
        info!(
            "loaded {genre} models for orders {:?}",
            models.available_orders()
        );
        Ok(models)
    }

    /// Orders with both files present for `genre`.
    pub fn available_orders(&self, genre: Genre) -> Vec<usize> {
        (1..=MAX_ORDER)
            .filter(|&n| self.matrix_path(genre, n).exists() && self.mapping_path(genre, n).exists())
            .collect()
    }
}

/// The loaded models of one genre, keyed by order. Immutable once loaded;
/// rebuilding produces a new value rather than mutating this one.
#[derive(Clone, Debug)]
pub struct GenreModels {
    genre: Genre,
    models: BTreeMap<usize, NgramModel>,
}

impl GenreModels {
    pub fn new(genre: Genre) -> Self {
        GenreModels {
            genre,
            models: BTreeMap::new(),
        }
    }

    /// Assemble from already-built models, keyed by their own order.
    pub fn from_models(genre: Genre, models: impl IntoIterator<Item = NgramModel>) -> Self {
        let mut out = GenreModels::new(genre);
        for m in models {
            out.insert(m);
        }
        out
    }

    pub fn insert(&mut self, model: NgramModel) {
        self.models.insert(model.order(), model);
    }

    pub fn genre(&self) -> Genre {
        self.genre
    }

    /// The model for order `n`, or `None` if that order is unavailable.
    pub fn get(&self, n: usize) -> Option<&NgramModel> {
        self.models.get(&n)
    }

    pub fn available_orders(&self) -> Vec<usize> {
        self.models.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

fn check_order(n: usize) -> Result<()> {
    if (1..=MAX_ORDER).contains(&n) {
        Ok(())
    } else {
        Err(ChordChainError::InvalidArgument(format!(
            "unsupported n-gram order {n} (expected 1..={MAX_ORDER})"
        )))
    }
}

fn write_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value)?;
    let tmp = path.with_extension("bin.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn read_blob<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)?;
    bincode::deserialize(&bytes).map_err(|e| ChordChainError::CorruptModel {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::TransitionCounts;
    use crate::matrix::{BuildOptions, build_matrix};
    use crate::ngram::Ngram;

    fn sample_model() -> NgramModel {
        let mut t = TransitionCounts::new();
        t.add(Ngram::unigram("C"), Ngram::unigram("G"), 3);
        t.add(Ngram::unigram("C"), Ngram::unigram("Am"), 1);
        t.add(Ngram::unigram("G"), Ngram::unigram("C"), 2);
        build_matrix(&t, &BuildOptions::default()).unwrap()
    }

    #[test]
    fn saved_model_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = MatrixStore::new(dir.path());
        let model = sample_model();
        store.save(Genre::Jazz, 1, &model).unwrap();

        let loaded = store.load_order(Genre::Jazz, 1).unwrap().unwrap();
        assert_eq!(loaded.index(), model.index());
        assert!(loaded.matrix().is_sparse());
        for i in 0..model.vocabulary_size() {
            assert_eq!(loaded.matrix().row_dense(i), model.matrix().row_dense(i));
        }
        assert_eq!(store.available_orders(Genre::Jazz), vec![1]);
    }

    #[test]
    fn missing_files_are_cache_misses() {
        let dir = tempfile::tempdir().unwrap();
        let store = MatrixStore::new(dir.path());
        assert!(store.load_order(Genre::Rock, 2).unwrap().is_none());

        store.save(Genre::Rock, 1, &sample_model()).unwrap();
        std::fs::remove_file(store.mapping_path(Genre::Rock, 1)).unwrap();
        assert!(store.load_order(Genre::Rock, 1).unwrap().is_none());

        let models = store.load(Genre::Rock).unwrap();
        assert!(models.is_empty());
        assert!(models.get(1).is_none());
    }

    #[test]
    fn orders_load_independently() {
        let dir = tempfile::tempdir().unwrap();
        let store = MatrixStore::new(dir.path());

        let mut t = TransitionCounts::new();
        t.add(Ngram::from_slice(&["C", "G"]), Ngram::from_slice(&["G", "C"]), 1);
        let bigram = build_matrix(&t, &BuildOptions::default()).unwrap();
        store.save(Genre::PopRock, 2, &bigram).unwrap();

        let models = store.load(Genre::PopRock).unwrap();
        assert_eq!(models.available_orders(), vec![2]);
        assert!(models.get(1).is_none());
        assert!(store.matrix_path(Genre::PopRock, 2).ends_with("transition_matrix_pop_rock.bin"));
    }

    #[test]
    fn remove_deletes_both_files_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let store = MatrixStore::new(dir.path());
        assert!(!store.remove(Genre::Country, 1).unwrap());

        store.save(Genre::Country, 1, &sample_model()).unwrap();
        assert!(store.remove(Genre::Country, 1).unwrap());
        assert!(!store.matrix_path(Genre::Country, 1).exists());
        assert!(!store.mapping_path(Genre::Country, 1).exists());
        assert!(store.load_order(Genre::Country, 1).unwrap().is_none());
        assert!(store.remove(Genre::Country, 9).is_err());
    }

    #[test]
    fn garbage_file_is_corrupt_not_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = MatrixStore::new(dir.path());
        store.save(Genre::Soul, 1, &sample_model()).unwrap();
        std::fs::write(store.matrix_path(Genre::Soul, 1), b"nope").unwrap();
        assert!(matches!(
            store.load_order(Genre::Soul, 1),
            Err(ChordChainError::CorruptModel { .. })
        ));
    }

    #[test]
    fn order_must_match_and_be_in_range() {
        let dir = tempfile::tempdir().unwrap();
        let store = MatrixStore::new(dir.path());
        assert!(store.save(Genre::Pop, 2, &sample_model()).is_err());
        assert!(store.save(Genre::Pop, 5, &sample_model()).is_err());
        assert!(store.load_order(Genre::Pop, 0).is_err());
    }
}
