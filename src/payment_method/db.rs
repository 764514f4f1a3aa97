//! Database operations for payment methods.
//!
//! Reads are scoped to what the caller may see: their own methods plus
//! admin-defined ones. Write permission is checked by the endpoints against
//! the fetched row before any write.

use std::str::FromStr;

use rusqlite::{Connection, Row};

use crate::{
    Error,
    payment_method::{MethodType, PaymentMethod, PaymentMethodId, PaymentMethodName},
    user::UserId,
};

/// Create the payment method table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_payment_method_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS payment_method (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            method_type TEXT NOT NULL,
            user_id INTEGER,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Create a payment method in the database.
///
/// An admin-defined method is stored without an owner so that it stays
/// visible to everyone even after the creating administrator is deleted.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_payment_method(
    name: PaymentMethodName,
    method_type: MethodType,
    user_id: UserId,
    connection: &Connection,
) -> Result<PaymentMethod, Error> {
    let owner = match method_type {
        MethodType::UserDefined => Some(user_id),
        MethodType::AdminDefined => None,
    };

    connection.execute(
        "INSERT INTO payment_method (name, method_type, user_id) VALUES (?1, ?2, ?3)",
        (
            name.as_ref(),
            method_type.as_str(),
            owner.map(|owner| owner.as_i64()),
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(PaymentMethod {
        id,
        name,
        method_type,
        user_id: owner,
    })
}

/// Retrieve a payment method visible to `user_id`: one of their own or an
/// admin-defined one.
///
/// # Errors
/// Returns [Error::NotFound] if the payment method does not exist or belongs
/// to another user, or [Error::SqlError] if there is an SQL error.
pub fn get_payment_method(
    payment_method_id: PaymentMethodId,
    user_id: UserId,
    connection: &Connection,
) -> Result<PaymentMethod, Error> {
    connection
        .query_row(
            "SELECT id, name, method_type, user_id FROM payment_method
             WHERE id = :id AND (user_id = :user_id OR method_type = 'admin_defined');",
            &[(":id", &payment_method_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve the payment methods visible to `user_id`, sorted by name: their
/// own plus every admin-defined one.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn get_all_payment_methods(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<PaymentMethod>, Error> {
    connection
        .prepare(
            "SELECT id, name, method_type, user_id FROM payment_method
             WHERE user_id = :user_id OR method_type = 'admin_defined' ORDER BY name ASC;",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|payment_method| payment_method.map_err(|error| error.into()))
        .collect()
}

/// Rename the payment method with `payment_method_id`.
///
/// The caller must have already checked write permission against the fetched
/// row (see [PaymentMethod::can_be_modified_by]).
///
/// # Errors
/// Returns [Error::UpdateMissingPaymentMethod] if the payment method does not
/// exist, or [Error::SqlError] if there is an SQL error.
pub fn update_payment_method(
    payment_method_id: PaymentMethodId,
    name: PaymentMethodName,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE payment_method SET name = ?1 WHERE id = ?2",
        (name.as_ref(), payment_method_id),
    )?;

    if rows_affected == 0 {
        Err(Error::UpdateMissingPaymentMethod)
    } else {
        Ok(())
    }
}

/// Delete the payment method with `payment_method_id`.
///
/// The caller must have already checked write permission against the fetched
/// row (see [PaymentMethod::can_be_modified_by]). Expenses that referenced
/// the method keep no payment method afterwards.
///
/// # Errors
/// Returns [Error::DeleteMissingPaymentMethod] if the payment method does not
/// exist, or [Error::SqlError] if there is an SQL error.
pub fn delete_payment_method(
    payment_method_id: PaymentMethodId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM payment_method WHERE id = ?1",
        [payment_method_id],
    )?;

    if rows_affected == 0 {
        Err(Error::DeleteMissingPaymentMethod)
    } else {
        Ok(())
    }
}

fn map_row(row: &Row) -> Result<PaymentMethod, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let raw_method_type: String = row.get(2)?;
    let method_type = MethodType::from_str(&raw_method_type).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(error))
    })?;
    let user_id: Option<i64> = row.get(3)?;

    Ok(PaymentMethod {
        id,
        name: PaymentMethodName::new_unchecked(&raw_name),
        method_type,
        user_id: user_id.map(UserId::new),
    })
}
