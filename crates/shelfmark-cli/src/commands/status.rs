use anyhow::Result;
use std::path::Path;

use super::open_db;

pub fn show_status(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;
    let summary = db.count_summary()?;
    let on_loan = db.list_on_loan()?;
    let overdue = on_loan.iter().filter(|copy| copy.is_overdue()).count();

    println!("\n📚 Shelfmark Status\n");
    println!("  Database: {}", db_path.display());
    println!("  Books: {}", summary.books);
    println!(
        "  Copies: {} ({} available)",
        summary.instances, summary.instances_available
    );
    println!("  On loan: {} ({} overdue)", on_loan.len(), overdue);
    println!("  Authors: {}", summary.authors);
    println!("  Genres: {}", summary.genres);

    if summary.books == 0 {
        println!("\n  Run `shelfmark book add` to catalogue your first book");
    }

    Ok(())
}
