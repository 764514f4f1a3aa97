//! Operator CLI that resets a user's password from the command line, for
//! when an admin locks themselves out.

use std::{error::Error, io, path::Path, process::exit};

use bcrypt::DEFAULT_COST;
use clap::Parser;
use rusqlite::Connection;

use masareef::{PasswordHash, ValidatedPassword, get_user_by_email, update_user_password};

/// Reset the password of a registered user.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The email address of the user whose password should be reset.
    #[arg(long)]
    email: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let db_path = Path::new(&args.db_path);
    if !is_plausible_db_path(db_path) {
        exit(1);
    }

    let connection = Connection::open(db_path)
        .unwrap_or_else(|_| panic!("Could not open the database at {db_path:?}"));

    let user = match get_user_by_email(&args.email, &connection) {
        Ok(user) => user,
        Err(error) => {
            print_error(format!(
                "Could not find a user with the email {}: {error}",
                args.email
            ));
            exit(1);
        }
    };

    println!("Resetting password for {}", user.email);

    // `None` means the operator aborted the prompt; leave the password alone.
    if let Some(password_hash) = prompt_for_new_password() {
        update_user_password(user.id, password_hash, &connection)?;
        println!("Password updated successfully!");
    }

    Ok(())
}

/// Guards against typos like pointing the tool at a directory or an
/// extensionless path that SQLite would happily create as a new database.
fn is_plausible_db_path(db_path: &Path) -> bool {
    let has_extension = db_path.extension().is_some_and(|ext| !ext.is_empty());

    if !has_extension {
        print_error("Database path must include a file extension (e.g., 'my_database.db').");
        return false;
    }

    if !db_path.is_file() {
        print_error(format!("File does not exist at {db_path:?}!"));
        return false;
    }

    true
}

/// Prompt (repeatedly, until valid) for a new password and its confirmation.
///
/// Returns `None` if stdin is closed or unreadable.
fn prompt_for_new_password() -> Option<PasswordHash> {
    loop {
        println!();

        let password = prompt_hidden("Enter a new password: ")?;

        if let Err(error) = ValidatedPassword::new(&password) {
            print_error(error);
            continue;
        }

        let confirmation = prompt_hidden("Enter the same password again: ")?;

        if password != confirmation {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::from_raw_password(&password, DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => print_error(format!("Could not hash password: {error}. Try again.")),
        }
    }
}

fn prompt_hidden(label: &str) -> Option<String> {
    match rpassword::prompt_password(label) {
        Ok(string) => Some(string),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

fn print_error(error: impl ToString) {
    let message = error.to_string();
    let mut chars = message.chars();
    let capitalised = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };

    eprintln!("\x1b[31;1m{capitalised}\x1b[0m");
}
