use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::model::ids::AuthorId;
use crate::routes::{RouteTable, AUTHOR_DETAIL};

/// A person credited as the author of one or more books.
///
/// Birth and death dates are independent: nothing requires the death date to
/// fall after the birth date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Assigned by storage on insert.
    pub id: Option<AuthorId>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    pub const NAME_MAX_CHARS: usize = 100;
    pub const DATE_OF_DEATH_LABEL: &'static str = "Died";

    #[must_use]
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth: None,
            date_of_death: None,
        }
    }

    #[must_use]
    pub fn with_date_of_birth(mut self, date: NaiveDate) -> Self {
        self.date_of_birth = Some(date);
        self
    }

    #[must_use]
    pub fn with_date_of_death(mut self, date: NaiveDate) -> Self {
        self.date_of_death = Some(date);
        self
    }

    pub fn validate(&self) -> Result<()> {
        super::require_text("first_name", &self.first_name, Self::NAME_MAX_CHARS)?;
        super::require_text("last_name", &self.last_name, Self::NAME_MAX_CHARS)
    }

    /// Address of this author's detail page.
    pub fn get_absolute_url(&self, routes: &RouteTable) -> Result<String> {
        let id = self
            .id
            .ok_or_else(|| Error::InvalidData("author has not been saved".to_string()))?;
        routes.reverse(AUTHOR_DETAIL, &[id])
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.last_name, self.first_name)
    }
}
