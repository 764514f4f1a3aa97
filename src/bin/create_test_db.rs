use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use masareef::{PasswordHash, ValidatedPassword, initialize_db};

/// A utility for creating a populated database for manual testing.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating the admin user 'admin@example.com' with the password 'test'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    connection.execute(
        "INSERT INTO user (email, password_hash, role, approved, created_at)
         VALUES ('admin@example.com', ?1, 'admin', 1, ?2)",
        (password_hash.as_ref(), OffsetDateTime::now_utc()),
    )?;

    println!("Creating sample categories and payment methods...");

    connection.execute_batch(
        "INSERT INTO category (name, icon, color, user_id) VALUES
            ('Groceries', 'ShoppingCart', '#16a34a', 1),
            ('Transport', 'Car', '#2563eb', 1),
            ('Eating Out', 'Utensils', NULL, 1);

         INSERT INTO payment_method (name, method_type, user_id) VALUES
            ('KNET', 'admin_defined', NULL),
            ('Cash', 'admin_defined', NULL),
            ('Credit Card', 'user_defined', 1);",
    )?;

    println!("Creating sample expenses...");

    // Amounts are in milliunits (fils). The date and created_at columns are
    // bound as parameters so that they round-trip through the same formats
    // the application writes.
    let expenses: [(i64, i64, Option<&str>, Option<i64>, Option<i64>); 6] = [
        (12_500, 1, Some("Weekly shop"), Some(1), Some(1)),
        (3_250, 3, Some("Fuel"), Some(2), Some(2)),
        (8_750, 5, None, Some(3), Some(3)),
        (1_500, 12, Some("Parking"), Some(2), Some(1)),
        (22_000, 40, Some("Monthly shop"), Some(1), Some(1)),
        (4_000, 70, None, None, Some(2)),
    ];

    let now = OffsetDateTime::now_utc();

    for (amount, days_ago, notes, category_id, payment_method_id) in expenses {
        connection.execute(
            "INSERT INTO expense (amount, date, notes, category_id, payment_method_id, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            (
                amount,
                now.date() - Duration::days(days_ago),
                notes,
                category_id,
                payment_method_id,
                now,
            ),
        )?;
    }

    // Bring the category aggregates in line with the rows inserted above.
    connection.execute_batch(
        "UPDATE category SET
            expenses_count =
                (SELECT COUNT(*) FROM expense WHERE expense.category_id = category.id),
            total_expenses_amount =
                (SELECT COALESCE(SUM(amount), 0) FROM expense WHERE expense.category_id = category.id);",
    )?;

    println!("Success!");

    Ok(())
}
