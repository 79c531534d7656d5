use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

use shelfmark_core::model::{Book, BookInstance, BookInstanceId, LoanStatus, CAN_MARK_RETURNED};
use shelfmark_core::routes::RouteTable;

mod commands;
mod config;
mod logging;

use commands::vocab::Vocabulary;
use config::Config;

#[derive(Debug, Parser)]
#[command(name = "shelfmark", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/shelfmark/catalog.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Manage book genres
    Genre {
        #[command(subcommand)]
        action: VocabAction,
    },
    /// Manage book languages
    Language {
        #[command(subcommand)]
        action: VocabAction,
    },
    /// Manage authors
    Author {
        #[command(subcommand)]
        action: AuthorAction,
    },
    /// Manage catalogued books
    ///
    /// A book is the bibliographic record (title, author, ISBN, genres,
    /// language). Physical loanable copies are managed with `shelfmark copy`.
    ///
    /// ISBNs are unique across the catalogue. Deleting an author or language
    /// leaves their books in place with the reference cleared; deleting a
    /// book is refused while any copy of it exists.
    Book {
        #[command(subcommand)]
        action: BookAction,
    },
    /// Manage physical copies and their loan status
    Copy {
        #[command(subcommand)]
        action: CopyAction,
    },
    /// Manage borrower accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Show catalogue counts and loans
    Status,
    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum VocabAction {
    /// Add an entry
    Add { name: String },
    /// List entries by name
    List {
        #[arg(long)]
        json: bool,
    },
    /// Rename an entry
    Rename { id: i64, name: String },
    /// Delete an entry
    Delete { id: i64 },
}

#[derive(Debug, clap::Subcommand)]
enum AuthorAction {
    /// Add an author
    Add {
        first_name: String,
        last_name: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        born: Option<NaiveDate>,
        /// Date of death (YYYY-MM-DD)
        #[arg(long)]
        died: Option<NaiveDate>,
    },
    /// List authors by last name, then first name
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show an author, their page address and their books
    Show { id: i64 },
    /// Delete an author (their books are kept)
    Delete { id: i64 },
}

#[derive(Debug, clap::Subcommand)]
enum BookAction {
    /// Add a book
    Add {
        title: String,
        #[arg(long, help = Book::ISBN_HELP_TEXT)]
        isbn: String,
        #[arg(long, help = Book::SUMMARY_HELP_TEXT)]
        summary: String,
        /// Author id
        #[arg(long)]
        author: Option<i64>,
        /// Language id
        #[arg(long)]
        language: Option<i64>,
        #[arg(long = "genre", help = Book::GENRE_HELP_TEXT, long_help = "Genre id (repeatable)")]
        genres: Vec<i64>,
    },
    /// List books by title, then author
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show a book with its copies
    Show { id: i64 },
    /// Delete a book (refused while copies exist)
    Delete { id: i64 },
}

#[derive(Debug, clap::Subcommand)]
enum CopyAction {
    /// Add a copy of a book
    Add {
        /// Book id
        book: i64,
        /// Edition or printing details
        imprint: String,
        #[arg(
            long,
            default_value = "maintenance",
            help = BookInstance::STATUS_HELP_TEXT,
            long_help = "Book availability: maintenance, on_loan, available or reserved"
        )]
        status: LoanStatus,
        /// Return date (YYYY-MM-DD)
        #[arg(long)]
        due_back: Option<NaiveDate>,
    },
    /// List copies, soonest due first
    List {
        /// Only copies of this book
        #[arg(long)]
        book: Option<i64>,
        /// Only copies on loan to this user
        #[arg(long)]
        borrower: Option<i64>,
        /// Only copies currently on loan
        #[arg(long)]
        on_loan: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show a copy
    Show {
        #[arg(help = BookInstance::ID_HELP_TEXT)]
        id: BookInstanceId,
    },
    /// Set a copy's status
    ///
    /// Any status other than on_loan clears the return date and borrower.
    Status {
        #[arg(help = BookInstance::ID_HELP_TEXT)]
        id: BookInstanceId,
        #[arg(help = BookInstance::STATUS_HELP_TEXT)]
        status: LoanStatus,
        /// Return date (YYYY-MM-DD)
        #[arg(long)]
        due_back: Option<NaiveDate>,
        /// Borrowing user id
        #[arg(long)]
        borrower: Option<i64>,
    },
    #[command(about = CAN_MARK_RETURNED.1)]
    Return {
        #[arg(help = BookInstance::ID_HELP_TEXT)]
        id: BookInstanceId,
    },
    /// Delete a copy
    Delete { id: BookInstanceId },
}

#[derive(Debug, clap::Subcommand)]
enum UserAction {
    /// Add a borrower account
    Add { username: String },
    /// Delete an account (borrowed copies lose their borrower)
    Delete { id: i64 },
    /// List copies on loan to a user
    Loans { id: i64 },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print one value
    Get { key: String },
    /// Set a value in the config file
    Set { key: String, value: String },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file if missing
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.db {
        Some(db_path) => Config::load_with_db_path(db_path)?,
        None => Config::load()?,
    };
    logging::init(&config.logging)?;

    let db_path = config.database_path.clone();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let routes = RouteTable::catalog(&config.url_prefix);

    match cli.command {
        Commands::Genre { action } => run_vocab(&db_path, Vocabulary::Genre, action)?,
        Commands::Language { action } => run_vocab(&db_path, Vocabulary::Language, action)?,
        Commands::Author { action } => match action {
            AuthorAction::Add {
                first_name,
                last_name,
                born,
                died,
            } => commands::author::add(&db_path, first_name, last_name, born, died)?,
            AuthorAction::List { json } => commands::author::list(&db_path, json)?,
            AuthorAction::Show { id } => commands::author::show(&db_path, &routes, id)?,
            AuthorAction::Delete { id } => commands::author::delete(&db_path, id)?,
        },
        Commands::Book { action } => match action {
            BookAction::Add {
                title,
                isbn,
                summary,
                author,
                language,
                genres,
            } => commands::book::add(
                &db_path,
                commands::book::NewBook {
                    title,
                    isbn,
                    summary,
                    author,
                    language,
                    genres,
                },
            )?,
            BookAction::List { json } => commands::book::list(&db_path, json)?,
            BookAction::Show { id } => commands::book::show(&db_path, &routes, id)?,
            BookAction::Delete { id } => commands::book::delete(&db_path, id)?,
        },
        Commands::Copy { action } => match action {
            CopyAction::Add {
                book,
                imprint,
                status,
                due_back,
            } => commands::copy::add(&db_path, book, imprint, status, due_back)?,
            CopyAction::List {
                book,
                borrower,
                on_loan,
                json,
            } => {
                let filter = commands::copy::CopyFilter {
                    book,
                    borrower,
                    on_loan,
                };
                commands::copy::list(&db_path, &filter, json)?;
            }
            CopyAction::Show { id } => commands::copy::show(&db_path, id)?,
            CopyAction::Status {
                id,
                status,
                due_back,
                borrower,
            } => commands::copy::set_status(&db_path, id, status, due_back, borrower)?,
            CopyAction::Return { id } => commands::copy::mark_returned(&db_path, id)?,
            CopyAction::Delete { id } => commands::copy::delete(&db_path, id)?,
        },
        Commands::User { action } => match action {
            UserAction::Add { username } => commands::user::add(&db_path, username)?,
            UserAction::Delete { id } => commands::user::delete(&db_path, id)?,
            UserAction::Loans { id } => commands::user::loans(&db_path, id)?,
        },
        Commands::Status => commands::show_status(&db_path)?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config)?,
            ConfigAction::Get { key } => commands::config::get_config(&config, &key)?,
            ConfigAction::Set { key, value } => commands::config::set_config(&key, &value)?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Example => commands::config::show_example()?,
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}

fn run_vocab(db_path: &std::path::Path, vocab: Vocabulary, action: VocabAction) -> Result<()> {
    match action {
        VocabAction::Add { name } => commands::vocab::add(db_path, vocab, name),
        VocabAction::List { json } => commands::vocab::list(db_path, vocab, json),
        VocabAction::Rename { id, name } => commands::vocab::rename(db_path, vocab, id, name),
        VocabAction::Delete { id } => commands::vocab::delete(db_path, vocab, id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_copy_status() {
        let id = BookInstanceId::new();
        let id_arg = id.to_string();
        let cli = Cli::try_parse_from([
            "shelfmark",
            "copy",
            "status",
            id_arg.as_str(),
            "on_loan",
            "--due-back",
            "2030-01-31",
        ])
        .unwrap();
        match cli.command {
            Commands::Copy {
                action: CopyAction::Status { id: parsed, status, due_back, .. },
            } => {
                assert_eq!(parsed, id);
                assert_eq!(status, LoanStatus::OnLoan);
                assert_eq!(due_back, NaiveDate::from_ymd_opt(2030, 1, 31));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_book_add_with_genres() {
        let cli = Cli::try_parse_from([
            "shelfmark", "--db", "/tmp/x.db", "book", "add", "Kindred", "--isbn",
            "9780807083697", "--summary", "s", "--genre", "1", "--genre", "2",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        match cli.command {
            Commands::Book {
                action: BookAction::Add { genres, author, .. },
            } => {
                assert_eq!(genres, vec![1, 2]);
                assert!(author.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_help_uses_catalog_help_texts() {
        let cmd = Cli::command();
        let book = cmd.find_subcommand("book").unwrap();
        let add = book.find_subcommand("add").unwrap();
        let isbn = add.get_arguments().find(|arg| arg.get_id() == "isbn").unwrap();
        assert_eq!(isbn.get_help().unwrap().to_string(), Book::ISBN_HELP_TEXT);

        let copy = cmd.find_subcommand("copy").unwrap();
        let ret = copy.find_subcommand("return").unwrap();
        assert_eq!(ret.get_about().unwrap().to_string(), CAN_MARK_RETURNED.1);
        let status = copy.find_subcommand("status").unwrap();
        let arg = status.get_arguments().find(|arg| arg.get_id() == "status").unwrap();
        assert_eq!(arg.get_help().unwrap().to_string(), BookInstance::STATUS_HELP_TEXT);
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        let id = BookInstanceId::new().to_string();
        assert!(Cli::try_parse_from(["shelfmark", "copy", "status", id.as_str(), "lost"]).is_err());
    }
}
