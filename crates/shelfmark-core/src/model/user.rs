use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::model::ids::UserId;

/// A user account that may borrow copies.
///
/// Accounts are owned by an external identity system; the catalog only keeps
/// enough to reference one as a borrower.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: Option<UserId>,
    pub username: String,
}

impl User {
    pub const USERNAME_MAX_CHARS: usize = 150;

    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        super::require_text("username", &self.username, Self::USERNAME_MAX_CHARS)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}
