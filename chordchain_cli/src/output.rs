// JSON persistence of generated sequences.
//
// Each run writes one file, `sequence_<YYYYmmdd_HHMMSS>_<uuid>.json`, so
// concurrent or rapid runs never overwrite each other.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedSequence {
    pub genre: String,
    pub input_sequence: Vec<String>,
    pub generated_sequence: Vec<String>,
}

pub fn sequence_file_name() -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("sequence_{timestamp}_{}.json", uuid::Uuid::new_v4().simple())
}

/// Write `record` into `dir` (created if needed) and return the file path.
pub fn save_sequence_to_json(dir: &Path, record: &SavedSequence) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(sequence_file_name());
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

pub fn load_sequence(path: &Path) -> anyhow::Result<SavedSequence> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_unique_and_well_formed() {
        let a = sequence_file_name();
        let b = sequence_file_name();
        assert_ne!(a, b);
        assert!(a.starts_with("sequence_"));
        assert!(a.ends_with(".json"));
        // sequence_ + 8 date digits + _ + 6 time digits + _ + 32 hex + .json
        assert_eq!(a.len(), "sequence_".len() + 8 + 1 + 6 + 1 + 32 + ".json".len());
    }

    #[test]
    fn saved_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let record = SavedSequence {
            genre: "jazz".into(),
            input_sequence: vec!["Dm7".into(), "G7".into()],
            generated_sequence: vec!["Dm7".into(), "G7".into(), "Cmaj7".into()],
        };
        let nested = dir.path().join("Chord_Sequences");
        let path = save_sequence_to_json(&nested, &record).unwrap();
        assert_eq!(path.parent(), Some(nested.as_path()));
        assert_eq!(load_sequence(&path).unwrap(), record);

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["generated_sequence"][2], "Cmaj7");
    }
}
