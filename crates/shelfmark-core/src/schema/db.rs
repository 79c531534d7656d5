use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{
    Author, AuthorId, Book, BookId, BookInstance, BookInstanceId, Genre, GenreId, Language,
    LanguageId, LoanStatus, User, UserId,
};

use super::migrations::MIGRATIONS;

/// Calendar dates are stored as ISO-8601 text so they sort chronologically.
const DATE_FORMAT: &str = "%Y-%m-%d";

const AUTHOR_COLUMNS: &str = "id, first_name, last_name, date_of_birth, date_of_death";
const BOOK_INSTANCE_COLUMNS: &str = "id, book_id, imprint, due_back, borrower_id, status";
const BOOK_INSTANCE_ORDER: &str = "ORDER BY due_back ASC NULLS FIRST, rowid";

/// A database connection with CRUD methods for catalog entities.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

/// Headline counts for the catalog home page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub books: u64,
    pub instances: u64,
    pub instances_available: u64,
    pub authors: u64,
    pub genres: u64,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn init(conn: Connection) -> Result<Self> {
        // Referential actions are only enforced when enabled per connection.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                let tx = self.conn.unchecked_transaction()?;
                tx.execute_batch(migration.sql)?;
                tx.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    }
}

fn date_param(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn date_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    row.get::<_, Option<String>>(idx)?
        .map(|text| {
            NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
            })
        })
        .transpose()
}

fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

fn expect_saved<T>(id: Option<T>, entity: &'static str) -> Result<T> {
    id.ok_or_else(|| Error::InvalidData(format!("{entity} has not been saved")))
}

fn expect_affected(rows: usize, entity: &'static str, id: impl ToString) -> Result<()> {
    if rows == 0 {
        return Err(Error::NotFound {
            entity,
            id: id.to_string(),
        });
    }
    Ok(())
}

// Genre and Language share a single-column shape.
impl Database {
    fn insert_named(&self, table: &'static str, name: &str) -> Result<i64> {
        self.conn.execute(
            &format!("INSERT INTO {table} (name) VALUES (?1)"),
            [name],
        )?;
        let id = self.conn.last_insert_rowid();
        log::debug!("Inserted {} {}", table, id);
        Ok(id)
    }

    fn get_named(&self, table: &'static str, entity: &'static str, id: i64) -> Result<String> {
        self.conn
            .query_row(
                &format!("SELECT name FROM {table} WHERE id = ?1"),
                [id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::NotFound {
                entity,
                id: id.to_string(),
            })
    }

    fn update_named(
        &self,
        table: &'static str,
        entity: &'static str,
        id: i64,
        name: &str,
    ) -> Result<()> {
        let rows = self.conn.execute(
            &format!("UPDATE {table} SET name = ?2 WHERE id = ?1"),
            rusqlite::params![id, name],
        )?;
        expect_affected(rows, entity, id)
    }

    fn delete_row(&self, table: &'static str, entity: &'static str, id: i64) -> Result<()> {
        let rows = self
            .conn
            .execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])?;
        expect_affected(rows, entity, id)?;
        log::debug!("Deleted {} {}", entity, id);
        Ok(())
    }

    fn list_named(&self, table: &'static str) -> Result<Vec<(i64, String)>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id, name FROM {table} ORDER BY name, id"))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

// Genre CRUD
impl Database {
    /// Insert a genre and record its new id on it.
    pub fn insert_genre(&self, genre: &mut Genre) -> Result<GenreId> {
        genre.validate()?;
        let id = GenreId::new(self.insert_named("genres", &genre.name)?);
        genre.id = Some(id);
        Ok(id)
    }

    pub fn get_genre(&self, id: GenreId) -> Result<Genre> {
        let name = self.get_named("genres", "genre", id.get())?;
        Ok(Genre { id: Some(id), name })
    }

    pub fn update_genre(&self, genre: &Genre) -> Result<()> {
        let id = expect_saved(genre.id, "genre")?;
        genre.validate()?;
        self.update_named("genres", "genre", id.get(), &genre.name)
    }

    /// Delete a genre. Books keep existing; they just lose the association.
    pub fn delete_genre(&self, id: GenreId) -> Result<()> {
        self.delete_row("genres", "genre", id.get())
    }

    pub fn list_genres(&self) -> Result<Vec<Genre>> {
        Ok(self
            .list_named("genres")?
            .into_iter()
            .map(|(id, name)| Genre {
                id: Some(GenreId::new(id)),
                name,
            })
            .collect())
    }
}

// Language CRUD
impl Database {
    /// Insert a language and record its new id on it.
    pub fn insert_language(&self, language: &mut Language) -> Result<LanguageId> {
        language.validate()?;
        let id = LanguageId::new(self.insert_named("languages", &language.name)?);
        language.id = Some(id);
        Ok(id)
    }

    pub fn get_language(&self, id: LanguageId) -> Result<Language> {
        let name = self.get_named("languages", "language", id.get())?;
        Ok(Language { id: Some(id), name })
    }

    pub fn update_language(&self, language: &Language) -> Result<()> {
        let id = expect_saved(language.id, "language")?;
        language.validate()?;
        self.update_named("languages", "language", id.get(), &language.name)
    }

    /// Delete a language. Books written in it keep existing with no language.
    pub fn delete_language(&self, id: LanguageId) -> Result<()> {
        self.delete_row("languages", "language", id.get())
    }

    pub fn list_languages(&self) -> Result<Vec<Language>> {
        Ok(self
            .list_named("languages")?
            .into_iter()
            .map(|(id, name)| Language {
                id: Some(LanguageId::new(id)),
                name,
            })
            .collect())
    }
}

// Author CRUD
impl Database {
    /// Insert an author and record its new id on it.
    pub fn insert_author(&self, author: &mut Author) -> Result<AuthorId> {
        author.validate()?;
        self.conn.execute(
            "INSERT INTO authors (first_name, last_name, date_of_birth, date_of_death)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                author.first_name,
                author.last_name,
                date_param(author.date_of_birth),
                date_param(author.date_of_death),
            ],
        )?;
        let id = AuthorId::new(self.conn.last_insert_rowid());
        author.id = Some(id);
        log::debug!("Inserted author {} ({})", id, author);
        Ok(id)
    }

    pub fn get_author(&self, id: AuthorId) -> Result<Author> {
        self.conn
            .query_row(
                &format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = ?1"),
                [id],
                Self::row_to_author,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound {
                entity: "author",
                id: id.to_string(),
            })
    }

    pub fn update_author(&self, author: &Author) -> Result<()> {
        let id = expect_saved(author.id, "author")?;
        author.validate()?;
        let rows = self.conn.execute(
            "UPDATE authors SET
                first_name = ?2, last_name = ?3, date_of_birth = ?4, date_of_death = ?5
             WHERE id = ?1",
            rusqlite::params![
                id,
                author.first_name,
                author.last_name,
                date_param(author.date_of_birth),
                date_param(author.date_of_death),
            ],
        )?;
        expect_affected(rows, "author", id)
    }

    /// Delete an author. Their books stay in the catalog with no author.
    pub fn delete_author(&self, id: AuthorId) -> Result<()> {
        self.delete_row("authors", "author", id.get())
    }

    /// All authors, ordered by last name then first name.
    pub fn list_authors(&self) -> Result<Vec<Author>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors ORDER BY last_name, first_name, id"
        ))?;
        let authors = stmt
            .query_map([], Self::row_to_author)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(authors)
    }

    fn row_to_author(row: &Row) -> rusqlite::Result<Author> {
        Ok(Author {
            id: Some(row.get(0)?),
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            date_of_birth: date_column(row, 3)?,
            date_of_death: date_column(row, 4)?,
        })
    }
}

// Book CRUD
impl Database {
    /// Insert a book with its genre associations and record its new id on it.
    ///
    /// A duplicate ISBN is rejected by storage and returned unchanged.
    pub fn insert_book(&self, book: &mut Book) -> Result<BookId> {
        book.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO books (title, author_id, summary, isbn, language_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![book.title, book.author, book.summary, book.isbn, book.language],
        )?;
        let id = BookId::new(tx.last_insert_rowid());
        Self::link_genres(&tx, id, &book.genre)?;
        tx.commit()?;

        book.id = Some(id);
        log::debug!("Inserted book {} ({})", id, book.isbn);
        Ok(id)
    }

    pub fn get_book(&self, id: BookId) -> Result<Book> {
        let mut book = self
            .conn
            .query_row(
                "SELECT id, title, author_id, summary, isbn, language_id FROM books WHERE id = ?1",
                [id],
                Self::row_to_book,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound {
                entity: "book",
                id: id.to_string(),
            })?;
        book.genre = self.book_genre_ids(id)?;
        Ok(book)
    }

    pub fn get_book_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let book = self
            .conn
            .query_row(
                "SELECT id, title, author_id, summary, isbn, language_id FROM books WHERE isbn = ?1",
                [isbn],
                Self::row_to_book,
            )
            .optional()?;
        match book {
            Some(mut book) => {
                if let Some(id) = book.id {
                    book.genre = self.book_genre_ids(id)?;
                }
                Ok(Some(book))
            }
            None => Ok(None),
        }
    }

    /// Update a book's fields and replace its genre set.
    pub fn update_book(&self, book: &Book) -> Result<()> {
        let id = expect_saved(book.id, "book")?;
        book.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        let rows = tx.execute(
            "UPDATE books SET
                title = ?2, author_id = ?3, summary = ?4, isbn = ?5, language_id = ?6
             WHERE id = ?1",
            rusqlite::params![id, book.title, book.author, book.summary, book.isbn, book.language],
        )?;
        expect_affected(rows, "book", id)?;
        tx.execute("DELETE FROM book_genres WHERE book_id = ?1", [id])?;
        Self::link_genres(&tx, id, &book.genre)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete a book.
    ///
    /// Fails with the storage constraint error, leaving everything intact,
    /// while any copy of the book exists.
    pub fn delete_book(&self, id: BookId) -> Result<()> {
        self.delete_row("books", "book", id.get())
    }

    /// All books, ordered by title then by author (last name, first name).
    pub fn list_books(&self) -> Result<Vec<Book>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.id, b.title, b.author_id, b.summary, b.isbn, b.language_id
             FROM books b
             LEFT JOIN authors a ON a.id = b.author_id
             ORDER BY b.title, a.last_name, a.first_name, b.id",
        )?;
        let mut books = stmt
            .query_map([], Self::row_to_book)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut links = self.all_genre_links()?;
        for book in &mut books {
            if let Some(genres) = book.id.and_then(|id| links.remove(&id)) {
                book.genre = genres;
            }
        }
        Ok(books)
    }

    /// Genres associated with a book, in association order.
    pub fn book_genres(&self, id: BookId) -> Result<Vec<Genre>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.id, g.name
             FROM book_genres bg
             JOIN genres g ON g.id = bg.genre_id
             WHERE bg.book_id = ?1
             ORDER BY bg.rowid",
        )?;
        let genres = stmt
            .query_map([id], |row| {
                Ok(Genre {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(genres)
    }

    /// [`Book::display_genre`] over the genres storage returns for this book.
    pub fn display_genre(&self, id: BookId) -> Result<String> {
        Ok(Book::display_genre(&self.book_genres(id)?))
    }

    fn link_genres(conn: &Connection, id: BookId, genres: &[GenreId]) -> Result<()> {
        let mut stmt =
            conn.prepare("INSERT OR IGNORE INTO book_genres (book_id, genre_id) VALUES (?1, ?2)")?;
        for genre in genres {
            stmt.execute(rusqlite::params![id, genre])?;
        }
        Ok(())
    }

    fn book_genre_ids(&self, id: BookId) -> Result<Vec<GenreId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT genre_id FROM book_genres WHERE book_id = ?1 ORDER BY rowid")?;
        let ids = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn all_genre_links(&self) -> Result<HashMap<BookId, Vec<GenreId>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT book_id, genre_id FROM book_genres ORDER BY rowid")?;
        let mut links: HashMap<BookId, Vec<GenreId>> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, BookId>(0)?, row.get::<_, GenreId>(1)?))
        })?;
        for row in rows {
            let (book, genre) = row?;
            links.entry(book).or_default().push(genre);
        }
        Ok(links)
    }

    fn row_to_book(row: &Row) -> rusqlite::Result<Book> {
        Ok(Book {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            author: row.get(2)?,
            summary: row.get(3)?,
            isbn: row.get(4)?,
            genre: Vec::new(),
            language: row.get(5)?,
        })
    }
}

// BookInstance CRUD
impl Database {
    pub fn insert_book_instance(&self, instance: &BookInstance) -> Result<()> {
        instance.validate()?;
        self.conn.execute(
            "INSERT INTO book_instances (id, book_id, imprint, due_back, borrower_id, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                instance.id,
                instance.book,
                instance.imprint,
                date_param(instance.due_back),
                instance.borrower,
                instance.status,
            ],
        )?;
        log::debug!("Inserted copy {} of book {}", instance.id, instance.book);
        Ok(())
    }

    pub fn get_book_instance(&self, id: BookInstanceId) -> Result<BookInstance> {
        self.conn
            .query_row(
                &format!("SELECT {BOOK_INSTANCE_COLUMNS} FROM book_instances WHERE id = ?1"),
                [id],
                Self::row_to_book_instance,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound {
                entity: "book instance",
                id: id.to_string(),
            })
    }

    /// Overwrite a copy's fields. Any status change is accepted.
    pub fn update_book_instance(&self, instance: &BookInstance) -> Result<()> {
        instance.validate()?;
        let rows = self.conn.execute(
            "UPDATE book_instances SET
                book_id = ?2, imprint = ?3, due_back = ?4, borrower_id = ?5, status = ?6
             WHERE id = ?1",
            rusqlite::params![
                instance.id,
                instance.book,
                instance.imprint,
                date_param(instance.due_back),
                instance.borrower,
                instance.status,
            ],
        )?;
        expect_affected(rows, "book instance", instance.id)
    }

    pub fn delete_book_instance(&self, id: BookInstanceId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM book_instances WHERE id = ?1", [id])?;
        expect_affected(rows, "book instance", id)?;
        log::debug!("Deleted copy {}", id);
        Ok(())
    }

    /// All copies, ordered by return date with undated copies first.
    pub fn list_book_instances(&self) -> Result<Vec<BookInstance>> {
        self.query_book_instances("", rusqlite::params![])
    }

    pub fn list_book_instances_for_book(&self, book: BookId) -> Result<Vec<BookInstance>> {
        self.query_book_instances("WHERE book_id = ?1", [book.get()])
    }

    /// Copies currently on loan, soonest due first.
    pub fn list_on_loan(&self) -> Result<Vec<BookInstance>> {
        self.query_book_instances("WHERE status = ?1", [LoanStatus::OnLoan.as_str()])
    }

    /// Copies on loan to `borrower`, soonest due first.
    pub fn list_on_loan_by_borrower(&self, borrower: UserId) -> Result<Vec<BookInstance>> {
        self.query_book_instances(
            "WHERE status = ?1 AND borrower_id = ?2",
            rusqlite::params![LoanStatus::OnLoan, borrower],
        )
    }

    /// Put a borrowed copy back on the shelf: available, no return date, no borrower.
    pub fn mark_returned(&self, id: BookInstanceId) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE book_instances
             SET status = ?2, due_back = NULL, borrower_id = NULL
             WHERE id = ?1",
            rusqlite::params![id, LoanStatus::Available],
        )?;
        expect_affected(rows, "book instance", id)?;
        log::info!("Copy {} marked as returned", id);
        Ok(())
    }

    fn query_book_instances<P: rusqlite::Params>(
        &self,
        filter: &str,
        params: P,
    ) -> Result<Vec<BookInstance>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOOK_INSTANCE_COLUMNS} FROM book_instances {filter} {BOOK_INSTANCE_ORDER}"
        ))?;
        let instances = stmt
            .query_map(params, Self::row_to_book_instance)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(instances)
    }

    fn row_to_book_instance(row: &Row) -> rusqlite::Result<BookInstance> {
        Ok(BookInstance {
            id: row.get(0)?,
            book: row.get(1)?,
            imprint: row.get(2)?,
            due_back: date_column(row, 3)?,
            borrower: row.get(4)?,
            status: row.get(5)?,
        })
    }
}

// User CRUD
impl Database {
    pub fn insert_user(&self, user: &mut User) -> Result<UserId> {
        user.validate()?;
        self.conn
            .execute("INSERT INTO users (username) VALUES (?1)", [&user.username])?;
        let id = UserId::new(self.conn.last_insert_rowid());
        user.id = Some(id);
        Ok(id)
    }

    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn
            .query_row(
                "SELECT id, username FROM users WHERE id = ?1",
                [id],
                |row| {
                    Ok(User {
                        id: Some(row.get(0)?),
                        username: row.get(1)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| Error::NotFound {
                entity: "user",
                id: id.to_string(),
            })
    }

    /// Delete an account. Copies it had borrowed keep existing with no borrower.
    pub fn delete_user(&self, id: UserId) -> Result<()> {
        self.delete_row("users", "user", id.get())
    }
}

impl Database {
    pub fn count_summary(&self) -> Result<CatalogSummary> {
        let summary = self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM books),
                (SELECT COUNT(*) FROM book_instances),
                (SELECT COUNT(*) FROM book_instances WHERE status = ?1),
                (SELECT COUNT(*) FROM authors),
                (SELECT COUNT(*) FROM genres)",
            [LoanStatus::Available.as_str()],
            |row| {
                Ok(CatalogSummary {
                    books: count(row.get(0)?),
                    instances: count(row.get(1)?),
                    instances_available: count(row.get(2)?),
                    authors: count(row.get(3)?),
                    genres: count(row.get(4)?),
                })
            },
        )?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_book(db: &Database, title: &str, isbn: &str) -> BookId {
        let mut book = Book::new(title, isbn).with_summary("A summary.");
        db.insert_book(&mut book).unwrap()
    }

    #[test]
    fn test_database_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);

        let fk: i64 = db
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_genre_crud() {
        let db = Database::open_in_memory().unwrap();
        let mut genre = Genre::new("Fantasy");
        let id = db.insert_genre(&mut genre).unwrap();
        assert_eq!(genre.id, Some(id));
        assert_eq!(db.get_genre(id).unwrap().name, "Fantasy");

        genre.name = "High Fantasy".to_string();
        db.update_genre(&genre).unwrap();
        assert_eq!(db.get_genre(id).unwrap().name, "High Fantasy");

        db.delete_genre(id).unwrap();
        assert!(db.get_genre(id).unwrap_err().is_not_found());
        assert!(db.delete_genre(id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_genre_names_are_not_unique() {
        let db = Database::open_in_memory().unwrap();
        db.insert_genre(&mut Genre::new("Poetry")).unwrap();
        db.insert_genre(&mut Genre::new("Poetry")).unwrap();
        assert_eq!(db.list_genres().unwrap().len(), 2);
    }

    #[test]
    fn test_insert_rejects_invalid_entity() {
        let db = Database::open_in_memory().unwrap();
        let err = db.insert_genre(&mut Genre::new("")).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "name", .. }));
        assert!(db.list_genres().unwrap().is_empty());
    }

    #[test]
    fn test_language_crud() {
        let db = Database::open_in_memory().unwrap();
        let mut language = Language::new("English");
        let id = db.insert_language(&mut language).unwrap();
        db.insert_language(&mut Language::new("Bengali")).unwrap();

        let names: Vec<String> = db
            .list_languages()
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Bengali", "English"]);

        language.name = "British English".to_string();
        db.update_language(&language).unwrap();
        assert_eq!(db.get_language(id).unwrap().to_string(), "British English");
    }

    #[test]
    fn test_update_unsaved_entity_fails() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.update_author(&Author::new("A", "B")),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_author_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let mut author = Author::new("Octavia", "Butler")
            .with_date_of_birth(date(1947, 6, 22))
            .with_date_of_death(date(2006, 2, 24));
        let id = db.insert_author(&mut author).unwrap();

        let loaded = db.get_author(id).unwrap();
        assert_eq!(loaded, author);
        assert_eq!(loaded.to_string(), "Butler, Octavia");

        let mut living = loaded;
        living.date_of_death = None;
        db.update_author(&living).unwrap();
        assert!(db.get_author(id).unwrap().date_of_death.is_none());
    }

    #[test]
    fn test_book_round_trip_with_genres() {
        let db = Database::open_in_memory().unwrap();
        let author = db.insert_author(&mut Author::new("Octavia", "Butler")).unwrap();
        let english = db.insert_language(&mut Language::new("English")).unwrap();
        let scifi = db.insert_genre(&mut Genre::new("Science Fiction")).unwrap();
        let horror = db.insert_genre(&mut Genre::new("Horror")).unwrap();

        let mut book = Book::new("Kindred", "9780807083697")
            .with_author(author)
            .with_summary("A time-travel novel.")
            .with_genre(horror)
            .with_genre(scifi)
            .with_language(english);
        let id = db.insert_book(&mut book).unwrap();

        let loaded = db.get_book(id).unwrap();
        assert_eq!(loaded, book);
        assert_eq!(loaded.genre, vec![horror, scifi]);
        assert_eq!(db.display_genre(id).unwrap(), "Horror, Science Fiction");

        let by_isbn = db.get_book_by_isbn("9780807083697").unwrap();
        assert_eq!(by_isbn, Some(loaded));
        assert!(db.get_book_by_isbn("0000000000000").unwrap().is_none());
    }

    #[test]
    fn test_update_book_replaces_genres() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_genre(&mut Genre::new("A")).unwrap();
        let b = db.insert_genre(&mut Genre::new("B")).unwrap();
        let mut book = Book::new("Title", "1111111111111")
            .with_summary("Summary.")
            .with_genre(a);
        let id = db.insert_book(&mut book).unwrap();

        book.genre = vec![b];
        book.title = "New Title".to_string();
        db.update_book(&book).unwrap();

        let loaded = db.get_book(id).unwrap();
        assert_eq!(loaded.title, "New Title");
        assert_eq!(loaded.genre, vec![b]);
    }

    #[test]
    fn test_duplicate_genre_links_collapse() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_genre(&mut Genre::new("A")).unwrap();
        let mut book = Book::new("Title", "1111111111111").with_summary("Summary.");
        book.genre = vec![a, a];
        let id = db.insert_book(&mut book).unwrap();
        assert_eq!(db.get_book(id).unwrap().genre, vec![a]);
    }

    #[test]
    fn test_deleting_genre_drops_association_only() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert_genre(&mut Genre::new("A")).unwrap();
        let mut book = Book::new("Title", "1111111111111")
            .with_summary("Summary.")
            .with_genre(a);
        let id = db.insert_book(&mut book).unwrap();

        db.delete_genre(a).unwrap();
        assert!(db.get_book(id).unwrap().genre.is_empty());
    }

    #[test]
    fn test_deleting_language_nulls_book_language() {
        let db = Database::open_in_memory().unwrap();
        let lang = db.insert_language(&mut Language::new("Latin")).unwrap();
        let mut book = Book::new("Title", "1111111111111")
            .with_summary("Summary.")
            .with_language(lang);
        let id = db.insert_book(&mut book).unwrap();

        db.delete_language(lang).unwrap();
        assert!(db.get_book(id).unwrap().language.is_none());
    }

    #[test]
    fn test_list_books_orders_by_title_then_author() {
        let db = Database::open_in_memory().unwrap();
        let zed = db.insert_author(&mut Author::new("Amy", "Zed")).unwrap();
        let abel = db.insert_author(&mut Author::new("Bob", "Abel")).unwrap();

        let mut b1 = Book::new("Same", "1000000000001").with_summary("s").with_author(zed);
        let mut b2 = Book::new("Same", "1000000000002").with_summary("s").with_author(abel);
        let mut b3 = Book::new("Alpha", "1000000000003").with_summary("s");
        let mut b4 = Book::new("Same", "1000000000004").with_summary("s");
        db.insert_book(&mut b1).unwrap();
        db.insert_book(&mut b2).unwrap();
        db.insert_book(&mut b3).unwrap();
        db.insert_book(&mut b4).unwrap();

        let isbns: Vec<String> = db.list_books().unwrap().into_iter().map(|b| b.isbn).collect();
        // Books without an author sort first within the same title.
        assert_eq!(
            isbns,
            vec!["1000000000003", "1000000000004", "1000000000002", "1000000000001"]
        );
    }

    #[test]
    fn test_book_instance_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let book = new_book(&db, "Kindred", "9780807083697");
        let borrower = db.insert_user(&mut User::new("reader")).unwrap();

        let copy = BookInstance::new(book, "Beacon Press, 2003")
            .with_status(LoanStatus::OnLoan)
            .with_due_back(date(2030, 1, 15))
            .with_borrower(borrower);
        db.insert_book_instance(&copy).unwrap();

        let loaded = db.get_book_instance(copy.id).unwrap();
        assert_eq!(loaded, copy);
    }

    #[test]
    fn test_copy_status_accepts_any_transition() {
        let db = Database::open_in_memory().unwrap();
        let book = new_book(&db, "Title", "1111111111111");
        let mut copy = BookInstance::new(book, "imprint");
        db.insert_book_instance(&copy).unwrap();

        for status in [
            LoanStatus::Reserved,
            LoanStatus::Maintenance,
            LoanStatus::OnLoan,
            LoanStatus::Available,
            LoanStatus::Reserved,
        ] {
            copy.status = status;
            db.update_book_instance(&copy).unwrap();
            assert_eq!(db.get_book_instance(copy.id).unwrap().status, status);
        }
    }

    #[test]
    fn test_status_check_constraint() {
        let db = Database::open_in_memory().unwrap();
        let book = new_book(&db, "Title", "1111111111111");
        let err = db
            .conn()
            .execute(
                "INSERT INTO book_instances (id, book_id, imprint, status) VALUES ('x', ?1, 'i', 'lost')",
                [book],
            )
            .map_err(Error::from)
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_status_defaults_to_maintenance_in_storage() {
        let db = Database::open_in_memory().unwrap();
        let book = new_book(&db, "Title", "1111111111111");
        let id = BookInstanceId::new();
        db.conn()
            .execute(
                "INSERT INTO book_instances (id, book_id, imprint) VALUES (?1, ?2, 'i')",
                rusqlite::params![id, book],
            )
            .unwrap();
        assert_eq!(
            db.get_book_instance(id).unwrap().status,
            LoanStatus::Maintenance
        );
    }

    #[test]
    fn test_loans_by_borrower_and_mark_returned() {
        let db = Database::open_in_memory().unwrap();
        let book = new_book(&db, "Title", "1111111111111");
        let alice = db.insert_user(&mut User::new("alice")).unwrap();
        let bob = db.insert_user(&mut User::new("bob")).unwrap();

        let later = BookInstance::new(book, "i")
            .with_status(LoanStatus::OnLoan)
            .with_due_back(date(2030, 2, 1))
            .with_borrower(alice);
        let sooner = BookInstance::new(book, "i")
            .with_status(LoanStatus::OnLoan)
            .with_due_back(date(2030, 1, 1))
            .with_borrower(alice);
        let bobs = BookInstance::new(book, "i")
            .with_status(LoanStatus::OnLoan)
            .with_due_back(date(2029, 1, 1))
            .with_borrower(bob);
        let shelved = BookInstance::new(book, "i").with_status(LoanStatus::Available);
        for copy in [&later, &sooner, &bobs, &shelved] {
            db.insert_book_instance(copy).unwrap();
        }

        let alices: Vec<_> = db
            .list_on_loan_by_borrower(alice)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(alices, vec![sooner.id, later.id]);
        assert_eq!(db.list_on_loan().unwrap().len(), 3);

        db.mark_returned(sooner.id).unwrap();
        let returned = db.get_book_instance(sooner.id).unwrap();
        assert_eq!(returned.status, LoanStatus::Available);
        assert!(returned.due_back.is_none());
        assert!(returned.borrower.is_none());
        assert_eq!(db.list_on_loan_by_borrower(alice).unwrap().len(), 1);

        assert!(db
            .mark_returned(BookInstanceId::new())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_deleting_user_nulls_borrower() {
        let db = Database::open_in_memory().unwrap();
        let book = new_book(&db, "Title", "1111111111111");
        let user = db.insert_user(&mut User::new("carol")).unwrap();
        let copy = BookInstance::new(book, "i").with_borrower(user);
        db.insert_book_instance(&copy).unwrap();

        db.delete_user(user).unwrap();
        assert!(db.get_book_instance(copy.id).unwrap().borrower.is_none());
        assert!(db.get_user(user).unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&mut User::new("dave")).unwrap();
        let err = db.insert_user(&mut User::new("dave")).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_count_summary() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.count_summary().unwrap(), CatalogSummary::default());

        db.insert_genre(&mut Genre::new("A")).unwrap();
        db.insert_author(&mut Author::new("F", "L")).unwrap();
        let book = new_book(&db, "Title", "1111111111111");
        db.insert_book_instance(&BookInstance::new(book, "i")).unwrap();
        db.insert_book_instance(&BookInstance::new(book, "i").with_status(LoanStatus::Available))
            .unwrap();

        let summary = db.count_summary().unwrap();
        assert_eq!(
            summary,
            CatalogSummary {
                books: 1,
                instances: 2,
                instances_available: 1,
                authors: 1,
                genres: 1,
            }
        );
    }
}
