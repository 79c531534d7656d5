use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use shelfmark_core::model::{
    AuthorId, Book, BookId, GenreId, LanguageId, DISPLAY_GENRE_LABEL,
};
use shelfmark_core::routes::RouteTable;
use shelfmark_core::schema::Database;

use super::{open_db, print_json};

/// Fields accepted by `book add`.
#[derive(Debug)]
pub struct NewBook {
    pub title: String,
    pub isbn: String,
    pub summary: String,
    pub author: Option<i64>,
    pub language: Option<i64>,
    pub genres: Vec<i64>,
}

/// A book as listed, with its display-only genre summary.
#[derive(Debug, Serialize)]
struct BookRow {
    #[serde(flatten)]
    book: Book,
    author_name: Option<String>,
    display_genre: String,
}

pub fn add(db_path: &Path, new: NewBook) -> Result<()> {
    let db = open_db(db_path)?;
    let mut book = Book::new(new.title, new.isbn).with_summary(new.summary);
    book.author = new.author.map(AuthorId::new);
    book.language = new.language.map(LanguageId::new);
    for genre in new.genres {
        book = book.with_genre(GenreId::new(genre));
    }

    if let Some(existing) = db.get_book_by_isbn(&book.isbn)? {
        anyhow::bail!("ISBN {} is already catalogued as \"{}\"", book.isbn, existing);
    }

    let id = db.insert_book(&mut book).context("Failed to add book")?;
    println!("✓ Added book {id}: {book}");
    Ok(())
}

pub fn list(db_path: &Path, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    let rows = db
        .list_books()?
        .into_iter()
        .map(|book| to_row(&db, book))
        .collect::<Result<Vec<_>>>()?;

    if json {
        return print_json(&rows);
    }

    for row in &rows {
        println!(
            "{:>5}  {}  {}  [{}: {}]",
            row.book.id.map(BookId::get).unwrap_or_default(),
            row.book,
            row.author_name.as_deref().unwrap_or("(unknown author)"),
            DISPLAY_GENRE_LABEL,
            row.display_genre
        );
    }
    if rows.is_empty() {
        println!("No books yet. Run `shelfmark book add`.");
    }
    Ok(())
}

pub fn show(db_path: &Path, routes: &RouteTable, id: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let id = BookId::new(id);
    let book = db.get_book(id)?;
    let url = book
        .get_absolute_url(routes)
        .context("Failed to build book address")?;
    let row = to_row(&db, book)?;
    let language = match row.book.language {
        Some(language) => db.get_language(language)?.name,
        None => "(unknown)".to_string(),
    };

    println!("{}", row.book);
    println!("  Author: {}", row.author_name.as_deref().unwrap_or("(unknown)"));
    println!("  ISBN: {}", row.book.isbn);
    println!("  Language: {language}");
    println!("  {}: {}", DISPLAY_GENRE_LABEL, row.display_genre);
    println!("  URL: {url}");
    println!("  Summary: {}", row.book.summary);

    let copies = db.list_book_instances_for_book(id)?;
    println!("\n  Copies ({}):", copies.len());
    for copy in &copies {
        let due = copy
            .due_back
            .map(|d| format!(", due {d}"))
            .unwrap_or_default();
        let overdue = if copy.is_overdue() { " (overdue)" } else { "" };
        println!("    - {} [{}{due}]{overdue} {}", copy.id, copy.status, copy.imprint);
    }
    Ok(())
}

pub fn delete(db_path: &Path, id: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let id = BookId::new(id);
    let book = db.get_book(id)?;
    let copies = db.list_book_instances_for_book(id)?.len();

    match db.delete_book(id) {
        Ok(()) => {
            println!("✓ Deleted book {id}: {book}");
            Ok(())
        }
        Err(err) if err.is_constraint_violation() => Err(anyhow::Error::new(err).context(format!(
            "Cannot delete \"{book}\": {copies} cop{} still reference it",
            if copies == 1 { "y" } else { "ies" }
        ))),
        Err(err) => Err(err.into()),
    }
}

fn to_row(db: &Database, book: Book) -> Result<BookRow> {
    let author_name = match book.author {
        Some(author) => Some(db.get_author(author)?.to_string()),
        None => None,
    };
    let display_genre = match book.id {
        Some(id) => db.display_genre(id)?,
        None => String::new(),
    };
    Ok(BookRow {
        book,
        author_name,
        display_genre,
    })
}
