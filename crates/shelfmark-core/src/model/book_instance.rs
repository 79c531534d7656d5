use chrono::{Local, NaiveDate};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::book::Book;
use crate::model::ids::{BookId, BookInstanceId, UserId};

/// Permission codename for marking a borrowed copy as returned.
pub const CAN_MARK_RETURNED: (&str, &str) = ("can_mark_returned", "Set book as returned");

/// Availability of a single copy.
///
/// Any status may follow any other; lending workflows outside the catalog
/// decide which transitions they allow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub const ALL: [Self; 4] = [Self::Maintenance, Self::OnLoan, Self::Available, Self::Reserved];

    /// Symbolic form used in storage and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Maintenance => "maintenance",
            Self::OnLoan => "on_loan",
            Self::Available => "available",
            Self::Reserved => "reserved",
        }
    }

    /// Single-character code used by older catalog stores.
    #[must_use]
    pub const fn tag(self) -> char {
        match self {
            Self::Maintenance => 'd',
            Self::OnLoan => 'o',
            Self::Available => 'a',
            Self::Reserved => 'r',
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Maintenance => "Maintenance",
            Self::OnLoan => "On loan",
            Self::Available => "Available",
            Self::Reserved => "Reserved",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LoanStatus {
    type Err = Error;

    /// Accepts the symbolic form (`on_loan`, `on-loan`) or the legacy tag (`o`).
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| {
                status.as_str() == normalized
                    || (normalized.len() == 1 && normalized.starts_with(status.tag()))
            })
            .ok_or_else(|| Error::InvalidData(format!("unknown loan status: {s}")))
    }
}

impl ToSql for LoanStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for LoanStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
    }
}

/// One physical, individually loanable copy of a [`Book`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInstance {
    /// Random id generated at creation.
    pub id: BookInstanceId,

    /// The book this is a copy of. The book cannot be deleted while copies exist.
    pub book: BookId,

    /// Edition or printing details.
    pub imprint: String,

    /// Return date; only set while the copy is out.
    pub due_back: Option<NaiveDate>,

    /// Cleared when the borrowing account is deleted.
    pub borrower: Option<UserId>,

    pub status: LoanStatus,
}

impl BookInstance {
    pub const IMPRINT_MAX_CHARS: usize = 200;
    pub const ID_HELP_TEXT: &'static str = "Unique ID for this particular book across whole library";
    pub const STATUS_HELP_TEXT: &'static str = "Book availability";

    #[must_use]
    pub fn new(book: BookId, imprint: impl Into<String>) -> Self {
        Self {
            id: BookInstanceId::new(),
            book,
            imprint: imprint.into(),
            due_back: None,
            borrower: None,
            status: LoanStatus::default(),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: LoanStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_due_back(mut self, due_back: NaiveDate) -> Self {
        self.due_back = Some(due_back);
        self
    }

    #[must_use]
    pub fn with_borrower(mut self, borrower: UserId) -> Self {
        self.borrower = Some(borrower);
        self
    }

    pub fn validate(&self) -> Result<()> {
        super::require_text("imprint", &self.imprint, Self::IMPRINT_MAX_CHARS)
    }

    /// Whether the copy is past its return date as of today (local time).
    #[must_use]
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(Local::now().date_naive())
    }

    /// Whether the copy is past its return date as of `today`.
    ///
    /// A copy with no return date is never overdue, and a copy due today is
    /// not yet overdue.
    #[must_use]
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        self.due_back.is_some_and(|due_back| today > due_back)
    }

    /// Render as `"<id> (<book title>)"`.
    #[must_use]
    pub fn display<'a>(&'a self, book: &'a Book) -> BookInstanceDisplay<'a> {
        BookInstanceDisplay {
            instance: self,
            book,
        }
    }
}

/// Helper returned by [`BookInstance::display`].
#[derive(Debug)]
pub struct BookInstanceDisplay<'a> {
    instance: &'a BookInstance,
    book: &'a Book,
}

impl fmt::Display for BookInstanceDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.instance.id, self.book.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_copy_defaults_to_maintenance() {
        let copy = BookInstance::new(BookId::new(1), "Penguin, 2003");
        assert_eq!(copy.status, LoanStatus::Maintenance);
        assert!(copy.due_back.is_none());
        assert!(copy.borrower.is_none());
    }

    #[test]
    fn test_new_copies_get_distinct_ids() {
        let a = BookInstance::new(BookId::new(1), "First printing");
        let b = BookInstance::new(BookId::new(1), "First printing");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_is_overdue_on() {
        let today = date(2024, 3, 10);
        let unset = BookInstance::new(BookId::new(1), "imprint");
        assert!(!unset.is_overdue_on(today));

        let past = unset.clone().with_due_back(date(2024, 3, 9));
        assert!(past.is_overdue_on(today));

        let due_today = unset.clone().with_due_back(today);
        assert!(!due_today.is_overdue_on(today));

        let future = unset.with_due_back(date(2024, 3, 11));
        assert!(!future.is_overdue_on(today));
    }

    #[test]
    fn test_is_overdue_uses_current_date() {
        let long_ago = BookInstance::new(BookId::new(1), "imprint").with_due_back(date(2000, 1, 1));
        assert!(long_ago.is_overdue());

        let far_future = BookInstance::new(BookId::new(1), "imprint").with_due_back(date(9999, 1, 1));
        assert!(!far_future.is_overdue());
    }

    #[test]
    fn test_display_with_book_title() {
        let mut book = Book::new("Kindred", "9780807083697");
        book.id = Some(BookId::new(1));
        let copy = BookInstance::new(BookId::new(1), "Beacon Press");
        assert_eq!(copy.display(&book).to_string(), format!("{} (Kindred)", copy.id));
    }

    #[test]
    fn test_loan_status_parse() {
        assert_eq!("on_loan".parse::<LoanStatus>().unwrap(), LoanStatus::OnLoan);
        assert_eq!("On-Loan".parse::<LoanStatus>().unwrap(), LoanStatus::OnLoan);
        assert_eq!("a".parse::<LoanStatus>().unwrap(), LoanStatus::Available);
        assert_eq!("d".parse::<LoanStatus>().unwrap(), LoanStatus::Maintenance);
        assert_eq!("reserved".parse::<LoanStatus>().unwrap(), LoanStatus::Reserved);
        assert!("lost".parse::<LoanStatus>().is_err());
        assert!("".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn test_loan_status_round_trips_through_symbolic_form() {
        for status in LoanStatus::ALL {
            assert_eq!(status.as_str().parse::<LoanStatus>().unwrap(), status);
            assert_eq!(status.tag().to_string().parse::<LoanStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_loan_status_serde() {
        let json = serde_json::to_string(&LoanStatus::OnLoan).unwrap();
        assert_eq!(json, "\"on_loan\"");
    }
}
