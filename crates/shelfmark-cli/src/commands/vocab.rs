//! Genre and language vocabularies share one set of commands.

use anyhow::Result;
use std::path::Path;

use shelfmark_core::model::{Genre, GenreId, Language, LanguageId};

use super::{open_db, print_json};

/// Which reference vocabulary a command operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    Genre,
    Language,
}

impl Vocabulary {
    const fn noun(self) -> &'static str {
        match self {
            Self::Genre => "genre",
            Self::Language => "language",
        }
    }

    const fn name_help(self) -> &'static str {
        match self {
            Self::Genre => Genre::NAME_HELP_TEXT,
            Self::Language => Language::NAME_HELP_TEXT,
        }
    }
}

pub fn add(db_path: &Path, vocab: Vocabulary, name: String) -> Result<()> {
    let db = open_db(db_path)?;
    let id = match vocab {
        Vocabulary::Genre => db.insert_genre(&mut Genre::new(name.as_str()))?.get(),
        Vocabulary::Language => db.insert_language(&mut Language::new(name.as_str()))?.get(),
    };
    println!("✓ Added {} {id}: {name}", vocab.noun());
    Ok(())
}

pub fn list(db_path: &Path, vocab: Vocabulary, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    match vocab {
        Vocabulary::Genre => {
            let genres = db.list_genres()?;
            if json {
                return print_json(&genres);
            }
            for genre in &genres {
                println!("{:>5}  {}", genre.id.map(|id| id.get()).unwrap_or_default(), genre);
            }
            print_empty_hint(vocab, genres.is_empty());
        }
        Vocabulary::Language => {
            let languages = db.list_languages()?;
            if json {
                return print_json(&languages);
            }
            for language in &languages {
                println!(
                    "{:>5}  {}",
                    language.id.map(|id| id.get()).unwrap_or_default(),
                    language
                );
            }
            print_empty_hint(vocab, languages.is_empty());
        }
    }
    Ok(())
}

pub fn rename(db_path: &Path, vocab: Vocabulary, id: i64, name: String) -> Result<()> {
    let db = open_db(db_path)?;
    match vocab {
        Vocabulary::Genre => {
            let mut genre = db.get_genre(GenreId::new(id))?;
            genre.name = name.clone();
            db.update_genre(&genre)?;
        }
        Vocabulary::Language => {
            let mut language = db.get_language(LanguageId::new(id))?;
            language.name = name.clone();
            db.update_language(&language)?;
        }
    }
    println!("✓ Renamed {} {id} to {name}", vocab.noun());
    Ok(())
}

pub fn delete(db_path: &Path, vocab: Vocabulary, id: i64) -> Result<()> {
    let db = open_db(db_path)?;
    match vocab {
        Vocabulary::Genre => db.delete_genre(GenreId::new(id))?,
        Vocabulary::Language => db.delete_language(LanguageId::new(id))?,
    }
    println!("✓ Deleted {} {id}", vocab.noun());
    Ok(())
}

fn print_empty_hint(vocab: Vocabulary, empty: bool) {
    if empty {
        println!("No {}s yet. Run `shelfmark {} add <NAME>`.", vocab.noun(), vocab.noun());
        println!("  {}", vocab.name_help());
    }
}
