use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::model::genre::Genre;
use crate::model::ids::{AuthorId, BookId, GenreId, LanguageId};
use crate::routes::{RouteTable, BOOK_DETAIL};

/// Column label shown next to [`Book::display_genre`] in tabular listings.
pub const DISPLAY_GENRE_LABEL: &str = "Genre";

/// A catalogued title (not a specific copy of it).
///
/// Physical copies are [`BookInstance`](crate::model::BookInstance)s that
/// point back at their book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Assigned by storage on insert.
    pub id: Option<BookId>,
    pub title: String,

    /// Cleared when the author is deleted; the book survives.
    pub author: Option<AuthorId>,

    pub summary: String,

    /// 13-character ISBN, unique across the catalog.
    pub isbn: String,

    /// Associated genres, in association order.
    pub genre: Vec<GenreId>,

    /// Cleared when the language is deleted; the book survives.
    pub language: Option<LanguageId>,
}

impl Book {
    pub const TITLE_MAX_CHARS: usize = 200;
    pub const SUMMARY_MAX_CHARS: usize = 1000;
    pub const ISBN_MAX_CHARS: usize = 13;
    pub const SUMMARY_HELP_TEXT: &'static str = "Enter a brief description of the book";
    pub const ISBN_HELP_TEXT: &'static str = "13 Character ISBN number";
    pub const GENRE_HELP_TEXT: &'static str = "Select a genre for this book";

    /// Number of genres [`Book::display_genre`] includes.
    pub const DISPLAY_GENRE_LIMIT: usize = 3;

    #[must_use]
    pub fn new(title: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            author: None,
            summary: String::new(),
            isbn: isbn.into(),
            genre: Vec::new(),
            language: None,
        }
    }

    #[must_use]
    pub fn with_author(mut self, author: AuthorId) -> Self {
        self.author = Some(author);
        self
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Associate a genre. Re-adding a genre already present is a no-op.
    #[must_use]
    pub fn with_genre(mut self, genre: GenreId) -> Self {
        if !self.genre.contains(&genre) {
            self.genre.push(genre);
        }
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: LanguageId) -> Self {
        self.language = Some(language);
        self
    }

    pub fn validate(&self) -> Result<()> {
        super::require_text("title", &self.title, Self::TITLE_MAX_CHARS)?;
        super::require_text("summary", &self.summary, Self::SUMMARY_MAX_CHARS)?;
        super::require_text("isbn", &self.isbn, Self::ISBN_MAX_CHARS)
    }

    /// Compact genre listing: the names of the first three genres, in the
    /// order given, joined with `", "`.
    ///
    /// Display only; never use the result for identity or comparison.
    pub fn display_genre<'a, I>(genres: I) -> String
    where
        I: IntoIterator<Item = &'a Genre>,
    {
        genres
            .into_iter()
            .take(Self::DISPLAY_GENRE_LIMIT)
            .map(|genre| genre.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Address of this book's detail page.
    pub fn get_absolute_url(&self, routes: &RouteTable) -> Result<String> {
        let id = self
            .id
            .ok_or_else(|| Error::InvalidData("book has not been saved".to_string()))?;
        routes.reverse(BOOK_DETAIL, &[id])
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
