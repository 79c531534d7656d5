use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::model::ids::LanguageId;

/// A natural language a book is written in (e.g., English, Farsi, Japanese).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language {
    /// Assigned by storage on insert.
    pub id: Option<LanguageId>,
    pub name: String,
}

impl Language {
    pub const NAME_MAX_CHARS: usize = 200;
    pub const NAME_HELP_TEXT: &'static str =
        "Enter the book's natural language (e.g. English, French, Japanese etc.)";

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

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
