/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Reference vocabularies
CREATE TABLE IF NOT EXISTS genres (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS languages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS authors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    date_of_birth TEXT,
    date_of_death TEXT
);

CREATE INDEX IF NOT EXISTS idx_authors_name ON authors(last_name, first_name);

-- Books: deleting an author or language keeps the book and clears the link
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author_id INTEGER REFERENCES authors(id) ON DELETE SET NULL,
    summary TEXT NOT NULL,
    isbn TEXT NOT NULL UNIQUE,
    language_id INTEGER REFERENCES languages(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_books_author_id ON books(author_id);
CREATE INDEX IF NOT EXISTS idx_books_language_id ON books(language_id);
CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);

-- Book <-> Genre (many-to-many, one row per pair)
CREATE TABLE IF NOT EXISTS book_genres (
    book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    genre_id INTEGER NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
    PRIMARY KEY (book_id, genre_id)
);

CREATE INDEX IF NOT EXISTS idx_book_genres_genre_id ON book_genres(genre_id);

-- Accounts that may borrow copies
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE
);

-- Loanable copies: a book cannot be deleted while copies of it exist
CREATE TABLE IF NOT EXISTS book_instances (
    id TEXT PRIMARY KEY,
    book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE RESTRICT,
    imprint TEXT NOT NULL,
    due_back TEXT,
    borrower_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    status TEXT NOT NULL DEFAULT 'maintenance'
        CHECK (status IN ('maintenance', 'on_loan', 'available', 'reserved'))
);

CREATE INDEX IF NOT EXISTS idx_book_instances_book_id ON book_instances(book_id);
CREATE INDEX IF NOT EXISTS idx_book_instances_borrower_id ON book_instances(borrower_id);
CREATE INDEX IF NOT EXISTS idx_book_instances_due_back ON book_instances(due_back);
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_catalog",
    sql: MIGRATION_001,
}];
