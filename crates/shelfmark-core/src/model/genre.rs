use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::model::ids::GenreId;

/// A book genre (e.g., "Science Fiction", "French Poetry").
///
/// Genres form a flat reference vocabulary; names are not unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    /// Assigned by storage on insert.
    pub id: Option<GenreId>,
    pub name: String,
}

impl Genre {
    pub const NAME_MAX_CHARS: usize = 200;
    pub const NAME_HELP_TEXT: &'static str =
        "Enter a book genre (e.g. Science Fiction, French Poetry etc.)";

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        super::require_text("name", &self.name, Self::NAME_MAX_CHARS)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
