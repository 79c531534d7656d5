pub mod author;
pub mod book;
pub mod config;
pub mod copy;
pub mod status;
pub mod user;
pub mod vocab;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use shelfmark_core::schema::Database;

pub use status::show_status;

fn open_db(db_path: &Path) -> Result<Database> {
    Database::open(db_path).context("Failed to open database")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
