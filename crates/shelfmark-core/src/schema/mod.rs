pub mod db;
pub mod migrations;

pub use db::{CatalogSummary, Database};
pub use migrations::{Migration, MIGRATIONS};
