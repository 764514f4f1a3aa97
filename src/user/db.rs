//! Database operations for user accounts.

use std::str::FromStr;

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error, PasswordHash,
    user::{Role, User, UserId},
};

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                approved INTEGER NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` is not a valid email address ([Error::InvalidEmail]),
/// - `email` is already registered to another account ([Error::DuplicateEmail]),
/// - or an SQL related error occurred ([Error::SqlError]).
pub fn create_user(
    email: &str,
    password_hash: PasswordHash,
    role: Role,
    approved: bool,
    connection: &Connection,
) -> Result<User, Error> {
    let email = email.trim();
    EmailAddress::from_str(email).map_err(|_| Error::InvalidEmail(email.to_string()))?;

    let insert_result = connection.execute(
        "INSERT INTO user (email, password_hash, role, approved, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            email,
            password_hash.as_ref(),
            role.as_str(),
            approved,
            OffsetDateTime::now_utc(),
        ),
    );

    if let Err(error) = insert_result {
        return match error.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => {
                Err(Error::DuplicateEmail(email.to_string()))
            }
            _ => Err(error.into()),
        };
    }

    let id = UserId::new(connection.last_insert_rowid());

    get_user_by_id(id, connection)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, email, password_hash, role, approved, created_at
             FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with an email equal to `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, email, password_hash, role, approved, created_at
             FROM user WHERE email = :email",
        )?
        .query_row(&[(":email", &email)], map_row)
        .map_err(|error| error.into())
}

/// Get all users ordered by most recently created.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_all_users(connection: &Connection) -> Result<Vec<User>, Error> {
    connection
        .prepare(
            "SELECT id, email, password_hash, role, approved, created_at
             FROM user ORDER BY created_at DESC, id DESC",
        )?
        .query_map([], map_row)?
        .map(|maybe_user| maybe_user.map_err(|error| error.into()))
        .collect()
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    let count: i64 = connection.query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))?;

    Ok(count as usize)
}

/// Flip whether the user may log in, and return the new state.
///
/// # Errors
///
/// Returns [Error::UpdateMissingUser] if `user_id` does not belong to a
/// registered user.
pub fn toggle_user_approval(user_id: UserId, connection: &Connection) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET approved = NOT approved WHERE id = ?1",
        [user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingUser);
    }

    connection
        .query_row(
            "SELECT approved FROM user WHERE id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Replace the user's password hash.
///
/// # Errors
///
/// Returns [Error::UpdateMissingUser] if `user_id` does not belong to a
/// registered user.
pub fn update_user_password(
    user_id: UserId,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password_hash = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingUser);
    }

    Ok(())
}

/// Delete a user by ID.
///
/// The user's categories, expenses and user-defined payment methods are
/// removed by the foreign key cascade.
///
/// # Errors
///
/// Returns [Error::DeleteMissingUser] if `user_id` does not belong to a
/// registered user.
pub fn delete_user(user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM user WHERE id = ?1", [user_id.as_i64()])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingUser);
    }

    Ok(())
}

/// Confirm that `user_id` belongs to an administrator.
///
/// # Errors
///
/// Returns [Error::Forbidden] if the user exists but does not have the admin
/// role, or [Error::NotFound] if the user does not exist.
pub fn require_admin(user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let user = get_user_by_id(user_id, connection)?;

    if user.role == Role::Admin {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_role: String = row.get(3)?;
    let role = Role::from_str(&raw_role).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(error))
    })?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserId::new(row.get(0)?),
        email: row.get(1)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        role,
        approved: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod user_query_tests {
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error, PasswordHash,
        user::{
            Role, User, UserId, count_users, create_user, delete_user, get_all_users,
            get_user_by_email, get_user_by_id, require_admin, toggle_user_approval,
            update_user_password,
        },
    };

    use super::create_user_table;

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn create_test_user(email: &str, connection: &Connection) -> User {
        create_user(
            email,
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            connection,
        )
        .expect("Could not create test user")
    }

    #[test]
    fn insert_user_succeeds() {
        let connection = get_db_connection();
        let password_hash = PasswordHash::new_unchecked("hunter2");

        let inserted_user = create_user(
            "test@example.com",
            password_hash.clone(),
            Role::User,
            false,
            &connection,
        )
        .unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "test@example.com");
        assert_eq!(inserted_user.password_hash, password_hash);
        assert_eq!(inserted_user.role, Role::User);
        assert!(!inserted_user.approved);
        assert!(
            (OffsetDateTime::now_utc() - inserted_user.created_at).abs() < Duration::seconds(2),
            "created_at should be set to the insertion time, got {:?}",
            inserted_user.created_at
        );
    }

    #[test]
    fn insert_user_trims_email() {
        let connection = get_db_connection();

        let inserted_user = create_user(
            " test@example.com ",
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            &connection,
        )
        .unwrap();

        assert_eq!(inserted_user.email, "test@example.com");
    }

    #[test]
    fn insert_user_fails_with_invalid_email() {
        let connection = get_db_connection();

        let result = create_user(
            "not an email",
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidEmail("not an email".to_string())));
    }

    #[test]
    fn insert_user_fails_with_duplicate_email() {
        let connection = get_db_connection();
        create_test_user("test@example.com", &connection);

        let result = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("swordfish"),
            Role::Admin,
            true,
            &connection,
        );

        assert_eq!(
            result,
            Err(Error::DuplicateEmail("test@example.com".to_string()))
        );
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let connection = get_db_connection();

        let id = UserId::new(42);

        assert_eq!(get_user_by_id(id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let connection = get_db_connection();
        let test_user = create_test_user("test@example.com", &connection);

        let retrieved_user = get_user_by_id(test_user.id, &connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_email_succeeds() {
        let connection = get_db_connection();
        let test_user = create_test_user("test@example.com", &connection);

        let retrieved_user = get_user_by_email("test@example.com", &connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_email_fails_with_unknown_email() {
        let connection = get_db_connection();
        create_test_user("test@example.com", &connection);

        let result = get_user_by_email("other@example.com", &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn returns_correct_count() {
        let connection = get_db_connection();

        let count = count_users(&connection).expect("Could not get user count");
        assert_eq!(0, count, "Want zero users before insertion, got {count}");

        create_test_user("test@example.com", &connection);

        let count = count_users(&connection).expect("Could not get user count");
        assert_eq!(1, count, "Want one user after insertion, got {count}");
    }

    #[test]
    fn get_all_users_returns_most_recent_first() {
        let connection = get_db_connection();
        let first = create_test_user("first@example.com", &connection);
        let second = create_test_user("second@example.com", &connection);

        let users = get_all_users(&connection).expect("Could not get all users");

        let emails = users.iter().map(|user| user.email.as_str()).collect::<Vec<_>>();
        assert_eq!(emails, vec![second.email.as_str(), first.email.as_str()]);
    }

    #[test]
    fn toggle_user_approval_flips_state() {
        let connection = get_db_connection();
        let user = create_test_user("test@example.com", &connection);
        assert!(user.approved);

        let approved = toggle_user_approval(user.id, &connection).unwrap();
        assert!(!approved);

        let approved = toggle_user_approval(user.id, &connection).unwrap();
        assert!(approved);
    }

    #[test]
    fn toggle_user_approval_with_invalid_id_returns_error() {
        let connection = get_db_connection();

        let result = toggle_user_approval(UserId::new(999999), &connection);

        assert_eq!(result, Err(Error::UpdateMissingUser));
    }

    #[test]
    fn update_user_password_succeeds() {
        let connection = get_db_connection();
        let user = create_test_user("test@example.com", &connection);
        let new_hash = PasswordHash::new_unchecked("swordfish");

        update_user_password(user.id, new_hash.clone(), &connection).unwrap();

        let updated_user = get_user_by_id(user.id, &connection).unwrap();
        assert_eq!(updated_user.password_hash, new_hash);
    }

    #[test]
    fn update_user_password_with_invalid_id_returns_error() {
        let connection = get_db_connection();

        let result = update_user_password(
            UserId::new(999999),
            PasswordHash::new_unchecked("swordfish"),
            &connection,
        );

        assert_eq!(result, Err(Error::UpdateMissingUser));
    }

    #[test]
    fn delete_user_succeeds() {
        let connection = get_db_connection();
        let user = create_test_user("test@example.com", &connection);

        let result = delete_user(user.id, &connection);

        assert!(result.is_ok());
        assert_eq!(get_user_by_id(user.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn delete_user_with_invalid_id_returns_error() {
        let connection = get_db_connection();

        let result = delete_user(UserId::new(999999), &connection);

        assert_eq!(result, Err(Error::DeleteMissingUser));
    }

    #[test]
    fn require_admin_accepts_admin() {
        let connection = get_db_connection();
        let admin = create_user(
            "admin@example.com",
            PasswordHash::new_unchecked("hunter2"),
            Role::Admin,
            true,
            &connection,
        )
        .unwrap();

        assert_eq!(require_admin(admin.id, &connection), Ok(()));
    }

    #[test]
    fn require_admin_rejects_regular_user() {
        let connection = get_db_connection();
        let user = create_test_user("user@example.com", &connection);

        assert_eq!(require_admin(user.id, &connection), Err(Error::Forbidden));
    }
}
