//! Core catalog model for shelfmark.
//!
//! This crate defines the catalog entities (Genre, Language, Author, Book
//! and the loanable BookInstance), the named route table used to build
//! detail-page addresses, and the SQLite schema that enforces the catalog's
//! referential-integrity rules.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod routes;
pub mod schema;

pub use error::{Error, Result};
