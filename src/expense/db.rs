//! Database operations for expenses.
//!
//! Every write here runs inside a SQLite transaction that also applies the
//! matching delta to the denormalized aggregates on the expense's category,
//! so the category counts and totals can never drift from the expense rows.

use rusqlite::{Connection, Row, named_params};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{CategoryId, adjust_category_aggregates, get_category},
    money::{from_milliunits, validate_amount},
    payment_method::{PaymentMethodId, get_payment_method},
    user::UserId,
};

use super::domain::{Expense, ExpenseBuilder, ExpenseId};

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY,
                amount INTEGER NOT NULL,
                date TEXT NOT NULL,
                notes TEXT,
                category_id INTEGER,
                payment_method_id INTEGER,
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
                FOREIGN KEY(payment_method_id) REFERENCES payment_method(id) ON UPDATE CASCADE ON DELETE SET NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Composite index used by the dashboard and report queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Record a new expense from a builder.
///
/// If the expense names a category, that category's expense count and total
/// are incremented in the same transaction as the insert.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not positive or has more than three decimal places,
/// - [Error::InvalidCategory] if the category does not exist or belongs to another user,
/// - [Error::InvalidPaymentMethod] if the payment method is not visible to the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(builder: ExpenseBuilder, connection: &Connection) -> Result<Expense, Error> {
    let amount_milliunits = validate_amount(builder.amount)?;

    let transaction = connection.unchecked_transaction()?;

    check_references(
        builder.category_id,
        builder.payment_method_id,
        builder.user_id,
        &transaction,
    )?;

    let expense = transaction
        .prepare(
            "INSERT INTO expense (amount, date, notes, category_id, payment_method_id, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, amount, date, notes, category_id, payment_method_id, user_id, created_at",
        )?
        .query_row(
            (
                amount_milliunits,
                builder.date,
                builder.notes,
                builder.category_id,
                builder.payment_method_id,
                builder.user_id.as_i64(),
                OffsetDateTime::now_utc(),
            ),
            map_row,
        )?;

    if let Some(category_id) = expense.category_id {
        adjust_category_aggregates(category_id, 1, amount_milliunits, &transaction)?;
    }

    transaction.commit()?;

    Ok(expense)
}

/// Retrieve an expense recorded by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the expense does not exist or belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_expense(
    expense_id: ExpenseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "SELECT id, amount, date, notes, category_id, payment_method_id, user_id, created_at
             FROM expense WHERE id = :id AND user_id = :user_id",
        )?
        .query_one(
            &[(":id", &expense_id), (":user_id", &user_id.as_i64())],
            map_row,
        )?;

    Ok(expense)
}

/// Overwrite an expense with the values from a builder and move the category
/// aggregates to match.
///
/// An expense that stays in its category only shifts that category's total by
/// the difference in amount. An expense that changes category is subtracted
/// from the old category's aggregates and added to the new one's.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingExpense] if the expense does not exist or belongs to another user,
/// - [Error::InvalidAmount] if the amount is not positive or has more than three decimal places,
/// - [Error::InvalidCategory] if the category does not exist or belongs to another user,
/// - [Error::InvalidPaymentMethod] if the payment method is not visible to the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense(
    expense_id: ExpenseId,
    builder: ExpenseBuilder,
    connection: &Connection,
) -> Result<Expense, Error> {
    let new_amount_milliunits = validate_amount(builder.amount)?;

    let transaction = connection.unchecked_transaction()?;

    let before =
        get_snapshot(expense_id, builder.user_id, &transaction).map_err(|error| match error {
            Error::NotFound => Error::UpdateMissingExpense,
            other => other,
        })?;

    check_references(
        builder.category_id,
        builder.payment_method_id,
        builder.user_id,
        &transaction,
    )?;

    let expense = transaction
        .prepare(
            "UPDATE expense
             SET amount = :amount, date = :date, notes = :notes,
                 category_id = :category_id, payment_method_id = :payment_method_id
             WHERE id = :id AND user_id = :user_id
             RETURNING id, amount, date, notes, category_id, payment_method_id, user_id, created_at",
        )?
        .query_row(
            named_params! {
                ":amount": new_amount_milliunits,
                ":date": builder.date,
                ":notes": builder.notes,
                ":category_id": builder.category_id,
                ":payment_method_id": builder.payment_method_id,
                ":id": expense_id,
                ":user_id": builder.user_id.as_i64(),
            },
            map_row,
        )?;

    if before.category_id == expense.category_id {
        if let Some(category_id) = expense.category_id {
            adjust_category_aggregates(
                category_id,
                0,
                new_amount_milliunits - before.amount_milliunits,
                &transaction,
            )?;
        }
    } else {
        if let Some(category_id) = before.category_id {
            adjust_category_aggregates(category_id, -1, -before.amount_milliunits, &transaction)?;
        }

        if let Some(category_id) = expense.category_id {
            adjust_category_aggregates(category_id, 1, new_amount_milliunits, &transaction)?;
        }
    }

    transaction.commit()?;

    Ok(expense)
}

/// Delete an expense and subtract it from its category's aggregates.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingExpense] if the expense does not exist or belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_expense(
    expense_id: ExpenseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    let before = get_snapshot(expense_id, user_id, &transaction).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissingExpense,
        other => other,
    })?;

    let rows_affected = transaction.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (expense_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingExpense);
    }

    if let Some(category_id) = before.category_id {
        adjust_category_aggregates(category_id, -1, -before.amount_milliunits, &transaction)?;
    }

    transaction.commit()?;

    Ok(())
}

/// Verify that the referenced category and payment method exist and are
/// visible to `user_id`.
///
/// Foreign keys cannot check ownership, so the referenced rows are fetched
/// with the user's scope before the expense is written.
fn check_references(
    category_id: Option<CategoryId>,
    payment_method_id: Option<PaymentMethodId>,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    if let Some(category_id) = category_id {
        get_category(category_id, user_id, connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCategory(Some(category_id)),
            other => other,
        })?;
    }

    if let Some(payment_method_id) = payment_method_id {
        get_payment_method(payment_method_id, user_id, connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidPaymentMethod(Some(payment_method_id)),
            other => other,
        })?;
    }

    Ok(())
}

/// The fields of an expense row that drive the aggregate deltas.
struct ExpenseSnapshot {
    amount_milliunits: i64,
    category_id: Option<CategoryId>,
}

fn get_snapshot(
    expense_id: ExpenseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<ExpenseSnapshot, Error> {
    let snapshot = connection
        .prepare("SELECT amount, category_id FROM expense WHERE id = :id AND user_id = :user_id")?
        .query_one(
            &[(":id", &expense_id), (":user_id", &user_id.as_i64())],
            |row| {
                Ok(ExpenseSnapshot {
                    amount_milliunits: row.get(0)?,
                    category_id: row.get(1)?,
                })
            },
        )?;

    Ok(snapshot)
}

pub(super) fn map_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let amount_milliunits: i64 = row.get(1)?;

    Ok(Expense {
        id: row.get(0)?,
        amount: from_milliunits(amount_milliunits),
        date: row.get(2)?,
        notes: row.get(3)?,
        category_id: row.get(4)?,
        payment_method_id: row.get(5)?,
        user_id: UserId::new(row.get(6)?),
        created_at: row.get(7)?,
    })
}
