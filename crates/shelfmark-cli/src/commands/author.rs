use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;

use shelfmark_core::model::{Author, AuthorId};
use shelfmark_core::routes::RouteTable;

use super::{open_db, print_json};

pub fn add(
    db_path: &Path,
    first_name: String,
    last_name: String,
    born: Option<NaiveDate>,
    died: Option<NaiveDate>,
) -> Result<()> {
    let db = open_db(db_path)?;
    let mut author = Author::new(first_name, last_name);
    author.date_of_birth = born;
    author.date_of_death = died;
    let id = db.insert_author(&mut author)?;
    println!("✓ Added author {id}: {author}");
    Ok(())
}

pub fn list(db_path: &Path, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    let authors = db.list_authors()?;
    if json {
        return print_json(&authors);
    }

    for author in &authors {
        println!(
            "{:>5}  {}{}",
            author.id.map(AuthorId::get).unwrap_or_default(),
            author,
            lifespan(author)
        );
    }
    if authors.is_empty() {
        println!("No authors yet. Run `shelfmark author add <FIRST> <LAST>`.");
    }
    Ok(())
}

pub fn show(db_path: &Path, routes: &RouteTable, id: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let author = db.get_author(AuthorId::new(id))?;
    let url = author
        .get_absolute_url(routes)
        .context("Failed to build author address")?;

    println!("{author}{}", lifespan(&author));
    if let Some(died) = author.date_of_death {
        println!("  {}: {died}", Author::DATE_OF_DEATH_LABEL);
    }
    println!("  URL: {url}");

    let books: Vec<_> = db
        .list_books()?
        .into_iter()
        .filter(|book| book.author == author.id)
        .collect();
    if books.is_empty() {
        println!("  No books catalogued.");
    } else {
        println!("  Books:");
        for book in &books {
            println!("    - {book} ({})", book.isbn);
        }
    }
    Ok(())
}

pub fn delete(db_path: &Path, id: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let author = db.get_author(AuthorId::new(id))?;
    db.delete_author(AuthorId::new(id))?;
    println!("✓ Deleted author {id}: {author}");
    println!("  Their books remain in the catalogue without an author.");
    Ok(())
}

fn lifespan(author: &Author) -> String {
    match (author.date_of_birth, author.date_of_death) {
        (None, None) => String::new(),
        (Some(born), None) => format!(" ({born} -)"),
        (born, Some(died)) => format!(
            " ({} - {died})",
            born.map(|d| d.to_string()).unwrap_or_default()
        ),
    }
}
