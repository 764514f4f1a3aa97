//! Database initialization.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, category::create_category_table, expense::create_expense_table,
    payment_method::create_payment_method_table, user::create_user_table,
};

/// Create the tables for the application's domain models if they do not
/// already exist.
///
/// Also enables foreign key enforcement, which SQLite leaves off by default.
/// Deleting a user relies on this to cascade to their categories, expenses
/// and payment methods.
///
/// # Errors
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Must be set outside of a transaction, otherwise SQLite ignores it.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_payment_method_table(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
