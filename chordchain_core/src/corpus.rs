// Labeled song corpus: the records transition counting and random
// generation consume.
//
// The corpus is a noisy public dataset, so record parsing never fails. A
// record whose genre is missing or not a string, or whose chord field is
// neither a string nor a list of strings, is kept with `None` in that field
// and skipped by consumers. Only I/O failures while reading the file are
// errors.
//
// Two views exist over the same records:
// - `SongRecord`s feed `counter.rs`, which re-extracts n-grams per order;
// - `ChordCorpus` holds the cleaned whole-song sequences for one genre (or
//   all genres) and feeds `random.rs`, `completion.rs` and `input.rs`.

use crate::error::Result;
use crate::ngram::is_marker;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info};

/// The chords field of a record: either a raw string or pre-split tokens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChordField {
    Text(String),
    Tokens(Vec<String>),
}

impl ChordField {
    pub fn is_empty(&self) -> bool {
        match self {
            ChordField::Text(s) => s.trim().is_empty(),
            ChordField::Tokens(t) => t.is_empty(),
        }
    }

    /// Cleaned chord tokens. Text is split on whitespace and commas; empty
    /// tokens and bracketed markers are removed.
    pub fn chords(&self) -> Vec<String> {
        match self {
            ChordField::Text(s) => s
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|t| !t.is_empty() && !is_marker(t))
                .map(str::to_string)
                .collect(),
            ChordField::Tokens(tokens) => tokens
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty() && !is_marker(t))
                .map(str::to_string)
                .collect(),
        }
    }
}

/// One song from the corpus.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub main_genre: Option<String>,
    pub chords: Option<ChordField>,
}

impl SongRecord {
    pub fn new(genre: &str, chords: &str) -> Self {
        SongRecord {
            main_genre: Some(genre.to_string()),
            chords: Some(ChordField::Text(chords.to_string())),
        }
    }

    /// Interpret an arbitrary JSON value as a record, dropping mistyped fields.
    pub fn from_value(value: &Value) -> Self {
        let main_genre = value
            .get("main_genre")
            .and_then(Value::as_str)
            .map(str::to_string);
        let chords = match value.get("chords") {
            Some(Value::String(s)) => Some(ChordField::Text(s.clone())),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(ChordField::Tokens),
            _ => None,
        };
        SongRecord { main_genre, chords }
    }
}

/// Read a JSON Lines corpus file. Blank and unparsable lines are skipped.
pub fn load_jsonl(path: &Path) -> Result<Vec<SongRecord>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut records = Vec::new();
    let mut skipped = 0usize;

    // Raw byte lines, so a line of invalid UTF-8 is skipped like any other
    // unparsable record instead of failing the read.
    for line in reader.split(b'\n') {
        let line = line?;
        if line.trim_ascii().is_empty() {
            continue;
        }
        match serde_json::from_slice::<Value>(&line) {
            Ok(value) => records.push(SongRecord::from_value(&value)),
            Err(e) => {
                debug!("skipping unparsable corpus line: {e}");
                skipped += 1;
            }
        }
    }

    info!(
        "loaded {} corpus records from {} ({} lines skipped)",
        records.len(),
        path.display(),
        skipped
    );
    Ok(records)
}

/// Summary numbers for a `ChordCorpus`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorpusStats {
    pub total_sequences: usize,
    pub total_chords: usize,
    pub unique_chords: usize,
    pub average_length: f64,
}

/// Cleaned chord sequences, optionally restricted to one genre.
#[derive(Clone, Debug, Default)]
pub struct ChordCorpus {
    sequences: Vec<Vec<String>>,
}

impl ChordCorpus {
    /// Collect the non-empty cleaned sequences of all records whose genre
    /// matches `genre` case-insensitively (or of every record if `None`).
    pub fn from_records(records: &[SongRecord], genre: Option<&str>) -> Self {
        let wanted = genre.map(str::to_lowercase);
        let sequences = records
            .iter()
            .filter(|r| match (&wanted, &r.main_genre) {
                (None, _) => true,
                (Some(w), Some(g)) => g.to_lowercase() == *w,
                (Some(_), None) => false,
            })
            .filter_map(|r| r.chords.as_ref())
            .map(ChordField::chords)
            .filter(|seq| !seq.is_empty())
            .collect();
        ChordCorpus { sequences }
    }

    pub fn from_sequences(sequences: Vec<Vec<String>>) -> Self {
        ChordCorpus {
            sequences: sequences.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    pub fn sequences(&self) -> &[Vec<String>] {
        &self.sequences
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Every distinct chord in the corpus, sorted.
    pub fn available_chords(&self) -> Vec<String> {
        let set: BTreeSet<&String> = self.sequences.iter().flatten().collect();
        set.into_iter().cloned().collect()
    }

    pub fn stats(&self) -> CorpusStats {
        let total_sequences = self.sequences.len();
        let total_chords = self.sequences.iter().map(Vec::len).sum();
        let average_length = if total_sequences > 0 {
            total_chords as f64 / total_sequences as f64
        } else {
            0.0
        };
        CorpusStats {
            total_sequences,
            total_chords,
            unique_chords: self.available_chords().len(),
            average_length,
        }
    }
}
