// The fixed set of genres the corpus is labeled with.
//
// Genre names arrive from users in arbitrary case and must be resolved
// before any model is loaded, so that a typo fails fast with the list of
// valid names instead of silently falling back to random output.

use crate::error::{ChordChainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A corpus genre label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Genre {
    Alternative,
    Country,
    Electronic,
    Jazz,
    Metal,
    Pop,
    PopRock,
    Punk,
    Rap,
    Reggae,
    Rock,
    Soul,
}

impl Genre {
    pub const ALL: [Genre; 12] = [
        Genre::Alternative,
        Genre::Country,
        Genre::Electronic,
        Genre::Jazz,
        Genre::Metal,
        Genre::Pop,
        Genre::PopRock,
        Genre::Punk,
        Genre::Rap,
        Genre::Reggae,
        Genre::Rock,
        Genre::Soul,
    ];

    /// The label as it appears in the corpus `main_genre` field.
    pub fn name(self) -> &'static str {
        match self {
            Genre::Alternative => "alternative",
            Genre::Country => "country",
            Genre::Electronic => "electronic",
            Genre::Jazz => "jazz",
            Genre::Metal => "metal",
            Genre::Pop => "pop",
            Genre::PopRock => "pop rock",
            Genre::Punk => "punk",
            Genre::Rap => "rap",
            Genre::Reggae => "reggae",
            Genre::Rock => "rock",
            Genre::Soul => "soul",
        }
    }

    /// Filesystem-safe form of the name, used in model file names.
    pub fn slug(self) -> String {
        self.name().replace(' ', "_")
    }

    /// Resolve a user-supplied genre name, ignoring case and surrounding
    /// whitespace.
    pub fn resolve(input: &str) -> Result<Genre> {
        let wanted = input.trim().to_lowercase();
        Genre::ALL
            .into_iter()
            .find(|g| g.name() == wanted)
            .ok_or_else(|| ChordChainError::UnknownGenre {
                genre: input.to_string(),
                available: Genre::ALL.map(Genre::name).join(", "),
            })
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Genre {
    type Err = ChordChainError;

    fn from_str(s: &str) -> Result<Self> {
        Genre::resolve(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_case_insensitive() {
        assert_eq!(Genre::resolve("JAZZ").unwrap(), Genre::Jazz);
        assert_eq!(Genre::resolve("  Pop Rock ").unwrap(), Genre::PopRock);
    }

    #[test]
    fn unknown_genre_lists_alternatives() {
        let err = Genre::resolve("polka").unwrap_err();
        match err {
            ChordChainError::UnknownGenre { genre, available } => {
                assert_eq!(genre, "polka");
                assert!(available.contains("reggae"));
            }
            other => panic!("expected UnknownGenre, got {other:?}"),
        }
    }

    #[test]
    fn slug_has_no_spaces() {
        assert_eq!(Genre::PopRock.slug(), "pop_rock");
        for g in Genre::ALL {
            assert!(!g.slug().contains(' '));
        }
    }
}
