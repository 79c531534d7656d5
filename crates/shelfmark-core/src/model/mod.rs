pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod ids;
pub mod language;
pub mod user;

pub use author::Author;
pub use book::{Book, DISPLAY_GENRE_LABEL};
pub use book_instance::{BookInstance, LoanStatus, CAN_MARK_RETURNED};
pub use genre::Genre;
pub use ids::{AuthorId, BookId, BookInstanceId, GenreId, LanguageId, UserId};
pub use language::Language;
pub use user::User;

use crate::error::{Error, Result};

/// Check a required text field: non-blank and at most `max_chars` characters.
pub(crate) fn require_text(field: &'static str, value: &str, max_chars: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation {
            field,
            message: "this field is required".to_string(),
        });
    }
    bounded_text(field, value, max_chars)
}

pub(crate) fn bounded_text(field: &'static str, value: &str, max_chars: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max_chars {
        return Err(Error::Validation {
            field,
            message: format!("at most {max_chars} characters allowed (got {len})"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_rejects_blank() {
        let err = require_text("name", "   ", 10).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "name", .. }));
    }

    #[test]
    fn test_bounded_text_counts_chars_not_bytes() {
        // 5 characters, 10 bytes
        assert!(bounded_text("name", "ééééé", 5).is_ok());
        assert!(bounded_text("name", "éééééé", 5).is_err());
    }
}
