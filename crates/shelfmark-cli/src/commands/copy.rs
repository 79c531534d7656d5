use anyhow::Result;
use chrono::NaiveDate;
use std::path::Path;

use shelfmark_core::model::{BookId, BookInstance, BookInstanceId, LoanStatus, UserId};
use shelfmark_core::schema::Database;

use super::{open_db, print_json};

/// Which copies `copy list` shows.
#[derive(Debug, Default)]
pub struct CopyFilter {
    pub book: Option<i64>,
    pub borrower: Option<i64>,
    pub on_loan: bool,
}

pub fn add(
    db_path: &Path,
    book: i64,
    imprint: String,
    status: LoanStatus,
    due_back: Option<NaiveDate>,
) -> Result<()> {
    let db = open_db(db_path)?;
    let book = db.get_book(BookId::new(book))?;
    let Some(book_id) = book.id else {
        anyhow::bail!("Book \"{book}\" has no id");
    };

    let mut copy = BookInstance::new(book_id, imprint).with_status(status);
    copy.due_back = due_back;
    db.insert_book_instance(&copy)?;
    println!("✓ Added copy {}", copy.display(&book));
    Ok(())
}

/// Copies matching every set field of `filter`, soonest due first.
fn select(db: &Database, filter: &CopyFilter) -> Result<Vec<BookInstance>> {
    let copies = match (filter.borrower, filter.book) {
        (Some(borrower), _) => db.list_on_loan_by_borrower(UserId::new(borrower))?,
        (None, Some(book)) => db.list_book_instances_for_book(BookId::new(book))?,
        (None, None) if filter.on_loan => db.list_on_loan()?,
        (None, None) => db.list_book_instances()?,
    };
    Ok(copies
        .into_iter()
        .filter(|copy| !filter.on_loan || copy.status == LoanStatus::OnLoan)
        .filter(|copy| filter.book.is_none_or(|book| copy.book == BookId::new(book)))
        .collect())
}

pub fn list(db_path: &Path, filter: &CopyFilter, json: bool) -> Result<()> {
    let db = open_db(db_path)?;
    let copies = select(&db, filter)?;

    if json {
        return print_json(&copies);
    }

    for copy in &copies {
        let book = db.get_book(copy.book)?;
        let due = copy
            .due_back
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let flag = if copy.is_overdue() { "  OVERDUE" } else { "" };
        println!("{:<12} {:<10} {}{flag}", copy.status.label(), due, copy.display(&book));
    }
    if copies.is_empty() {
        println!("No copies match.");
    }
    Ok(())
}

pub fn show(db_path: &Path, id: BookInstanceId) -> Result<()> {
    let db = open_db(db_path)?;
    let copy = db.get_book_instance(id)?;
    let book = db.get_book(copy.book)?;

    println!("{}", copy.display(&book));
    println!("  Imprint: {}", copy.imprint);
    println!("  Status: {}", copy.status);
    match copy.due_back {
        Some(due) if copy.is_overdue() => println!("  Due back: {due} (overdue)"),
        Some(due) => println!("  Due back: {due}"),
        None => println!("  Due back: -"),
    }
    match copy.borrower {
        Some(borrower) => println!("  Borrower: {}", db.get_user(borrower)?),
        None => println!("  Borrower: -"),
    }
    Ok(())
}

/// Overwrite a copy's status. Any transition is allowed.
///
/// Only a copy on loan keeps a return date and borrower; moving to any other
/// status clears both, as `copy return` does.
pub fn set_status(
    db_path: &Path,
    id: BookInstanceId,
    status: LoanStatus,
    due_back: Option<NaiveDate>,
    borrower: Option<i64>,
) -> Result<()> {
    let db = open_db(db_path)?;
    let mut copy = db.get_book_instance(id)?;
    copy.status = status;
    if status == LoanStatus::OnLoan {
        if due_back.is_some() {
            copy.due_back = due_back;
        }
        if let Some(borrower) = borrower {
            copy.borrower = db.get_user(UserId::new(borrower))?.id;
        }
    } else {
        if due_back.is_some() || borrower.is_some() {
            log::warn!("Ignoring due date and borrower for copy {id}: not on loan");
        }
        copy.due_back = None;
        copy.borrower = None;
    }
    db.update_book_instance(&copy)?;
    log::info!("Copy {} set to {}", id, status.as_str());
    println!("✓ Copy {id} is now {status}");
    Ok(())
}

pub fn mark_returned(db_path: &Path, id: BookInstanceId) -> Result<()> {
    let db = open_db(db_path)?;
    db.mark_returned(id)?;
    println!("✓ Copy {id} returned and available");
    Ok(())
}

pub fn delete(db_path: &Path, id: BookInstanceId) -> Result<()> {
    let db = open_db(db_path)?;
    db.delete_book_instance(id)?;
    println!("✓ Deleted copy {id}");
    Ok(())
}
