use anyhow::Result;
use std::path::Path;

use shelfmark_core::model::{User, UserId};

use super::open_db;

pub fn add(db_path: &Path, username: String) -> Result<()> {
    let db = open_db(db_path)?;
    let mut user = User::new(username);
    let id = db.insert_user(&mut user)?;
    println!("✓ Added user {id}: {user}");
    Ok(())
}

pub fn delete(db_path: &Path, id: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let user = db.get_user(UserId::new(id))?;
    db.delete_user(UserId::new(id))?;
    println!("✓ Deleted user {id}: {user}");
    println!("  Copies they had borrowed no longer have a borrower.");
    Ok(())
}

/// Copies on loan to a user, soonest due first.
pub fn loans(db_path: &Path, id: i64) -> Result<()> {
    let db = open_db(db_path)?;
    let user = db.get_user(UserId::new(id))?;
    let copies = db.list_on_loan_by_borrower(UserId::new(id))?;

    println!("Borrowed by {user}:");
    if copies.is_empty() {
        println!("  nothing");
    }
    for copy in &copies {
        let book = db.get_book(copy.book)?;
        let due = copy.due_back.map(|d| d.to_string()).unwrap_or_default();
        let flag = if copy.is_overdue() { " (overdue)" } else { "" };
        println!("  {due:<10} {book}{flag}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shelfmark_core::model::{Book, BookInstance, LoanStatus};
    use shelfmark_core::schema::Database;
    use tempfile::TempDir;

    #[test]
    fn test_delete_user_clears_borrower() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("catalog.db");

        add(&db_path, "reader".to_string()).unwrap();
        let db = Database::open(&db_path).unwrap();
        let mut book = Book::new("Kindred", "9780807083697").with_summary("A novel.");
        let book_id = db.insert_book(&mut book).unwrap();

        let user = db.get_user(UserId::new(1)).unwrap();
        let copy = BookInstance::new(book_id, "Beacon Press")
            .with_status(LoanStatus::OnLoan)
            .with_due_back(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap())
            .with_borrower(user.id.unwrap());
        db.insert_book_instance(&copy).unwrap();
        loans(&db_path, 1).unwrap();

        delete(&db_path, 1).unwrap();
        let orphaned = db.get_book_instance(copy.id).unwrap();
        assert_eq!(orphaned.borrower, None);
        assert_eq!(orphaned.status, LoanStatus::OnLoan);
        assert!(loans(&db_path, 1).is_err());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("catalog.db");

        add(&db_path, "reader".to_string()).unwrap();
        assert!(add(&db_path, "reader".to_string()).is_err());
    }
}
