//! Database operations for categories, including the incremental
//! maintenance of their expense aggregates.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName},
    money::from_milliunits,
    user::UserId,
};

/// Create the category table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                icon TEXT NOT NULL,
                color TEXT,
                user_id INTEGER NOT NULL,
                expenses_count INTEGER NOT NULL DEFAULT 0,
                total_expenses_amount INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create a category and return it with its generated ID and zeroed
/// aggregates.
pub fn create_category(
    name: CategoryName,
    icon: &str,
    color: Option<&str>,
    user_id: UserId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, icon, color, user_id) VALUES (?1, ?2, ?3, ?4);",
        (name.as_ref(), icon, color, user_id.as_i64()),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name,
        icon: icon.to_string(),
        color: color.map(|color| color.to_string()),
        user_id,
        expenses_count: 0,
        total_expenses_amount: from_milliunits(0),
    })
}

/// Retrieve a single category owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the category does not exist or belongs to
/// another user.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, name, icon, color, user_id, expenses_count, total_expenses_amount
             FROM category WHERE id = :id AND user_id = :user_id;",
        )?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of the user's categories ordered alphabetically by name.
pub fn get_all_categories(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, icon, color, user_id, expenses_count, total_expenses_amount
             FROM category WHERE user_id = :user_id ORDER BY name ASC;",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Update a category's name, icon and color. The aggregates are not touched.
///
/// # Errors
///
/// Returns [Error::UpdateMissingCategory] if the category does not exist or
/// belongs to another user.
pub fn update_category(
    category_id: CategoryId,
    name: CategoryName,
    icon: &str,
    color: Option<&str>,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET name = ?1, icon = ?2, color = ?3 WHERE id = ?4 AND user_id = ?5",
        (name.as_ref(), icon, color, category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete a category owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::CategoryInUse] while any live expense references the
/// category, and [Error::DeleteMissingCategory] if the category does not
/// exist or belongs to another user.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let category = get_category(category_id, user_id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissingCategory,
        other => other,
    })?;

    if category.expenses_count > 0 {
        return Err(Error::CategoryInUse(category.name.to_string()));
    }

    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Apply a count and amount delta to a category's maintained aggregates in
/// one statement.
///
/// `amount_delta` is in milliunits. Both aggregates are clamped at zero.
///
/// Callers adjusting aggregates alongside an expense write must run both in
/// the same transaction.
pub(crate) fn adjust_category_aggregates(
    category_id: CategoryId,
    count_delta: i64,
    amount_delta: i64,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "UPDATE category
         SET expenses_count = MAX(0, expenses_count + :count_delta),
             total_expenses_amount = MAX(0, total_expenses_amount + :amount_delta)
         WHERE id = :id",
        rusqlite::named_params! {
            ":count_delta": count_delta,
            ":amount_delta": amount_delta,
            ":id": category_id,
        },
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(1)?;
    let total_milliunits: i64 = row.get(6)?;

    Ok(Category {
        id: row.get(0)?,
        name: CategoryName::new_unchecked(&raw_name),
        icon: row.get(2)?,
        color: row.get(3)?,
        user_id: UserId::new(row.get(4)?),
        expenses_count: row.get(5)?,
        total_expenses_amount: from_milliunits(total_milliunits),
    })
}

#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::{
        Error, PasswordHash,
        category::{
            CategoryName, create_category, delete_category, get_all_categories, get_category,
            update_category,
        },
        user::{Role, UserId, create_user, create_user_table},
    };

    use super::{adjust_category_aggregates, create_category_table};

    fn get_test_db_connection() -> (Connection, UserId) {
        let connection = Connection::open_in_memory().unwrap();
        create_user_table(&connection).expect("Could not create user table");
        create_category_table(&connection).expect("Could not create category table");

        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            &connection,
        )
        .expect("Could not create test user");

        (connection, user.id)
    }

    #[test]
    fn create_category_succeeds() {
        let (connection, user_id) = get_test_db_connection();
        let name = CategoryName::new_unchecked("Groceries");

        let category = create_category(
            name.clone(),
            "ShoppingCart",
            Some("#3b82f6"),
            user_id,
            &connection,
        )
        .expect("Could not create category");

        assert!(category.id > 0);
        assert_eq!(category.name, name);
        assert_eq!(category.icon, "ShoppingCart");
        assert_eq!(category.color.as_deref(), Some("#3b82f6"));
        assert_eq!(category.user_id, user_id);
        assert_eq!(category.expenses_count, 0);
        assert_eq!(category.total_expenses_amount, Decimal::ZERO);
    }

    #[test]
    fn get_category_succeeds() {
        let (connection, user_id) = get_test_db_connection();
        let inserted_category = create_category(
            CategoryName::new_unchecked("Coffee"),
            "Coffee",
            None,
            user_id,
            &connection,
        )
        .expect("Could not create test category");

        let selected_category = get_category(inserted_category.id, user_id, &connection);

        assert_eq!(Ok(inserted_category), selected_category);
    }

    #[test]
    fn get_category_with_invalid_id_returns_not_found() {
        let (connection, user_id) = get_test_db_connection();

        let selected_category = get_category(999999, user_id, &connection);

        assert_eq!(selected_category, Err(Error::NotFound));
    }

    #[test]
    fn get_category_hides_other_users_categories() {
        let (connection, user_id) = get_test_db_connection();
        let other_user = create_user(
            "other@example.com",
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            &connection,
        )
        .expect("Could not create other user");
        let other_users_category = create_category(
            CategoryName::new_unchecked("Secret"),
            "Heart",
            None,
            other_user.id,
            &connection,
        )
        .expect("Could not create test category");

        let result = get_category(other_users_category.id, user_id, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_all_categories_returns_own_sorted_by_name() {
        let (connection, user_id) = get_test_db_connection();
        let other_user = create_user(
            "other@example.com",
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            &connection,
        )
        .expect("Could not create other user");
        create_category(
            CategoryName::new_unchecked("Groceries"),
            "ShoppingCart",
            None,
            user_id,
            &connection,
        )
        .unwrap();
        create_category(
            CategoryName::new_unchecked("Coffee"),
            "Coffee",
            None,
            user_id,
            &connection,
        )
        .unwrap();
        create_category(
            CategoryName::new_unchecked("Also Theirs"),
            "Home",
            None,
            other_user.id,
            &connection,
        )
        .unwrap();

        let categories = get_all_categories(user_id, &connection).unwrap();

        let names = categories
            .iter()
            .map(|category| category.name.as_ref())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Coffee", "Groceries"]);
    }

    #[test]
    fn update_category_succeeds() {
        let (connection, user_id) = get_test_db_connection();
        let category = create_category(
            CategoryName::new_unchecked("Original"),
            "Home",
            None,
            user_id,
            &connection,
        )
        .expect("Could not create test category");

        let new_name = CategoryName::new_unchecked("Updated");
        let result = update_category(
            category.id,
            new_name.clone(),
            "Car",
            Some("#ef4444"),
            user_id,
            &connection,
        );

        assert!(result.is_ok());

        let updated_category =
            get_category(category.id, user_id, &connection).expect("Could not get category");
        assert_eq!(updated_category.name, new_name);
        assert_eq!(updated_category.icon, "Car");
        assert_eq!(updated_category.color.as_deref(), Some("#ef4444"));
        assert_eq!(updated_category.id, category.id);
    }

    #[test]
    fn update_category_with_invalid_id_returns_not_found() {
        let (connection, user_id) = get_test_db_connection();

        let result = update_category(
            999999,
            CategoryName::new_unchecked("Updated"),
            "Car",
            None,
            user_id,
            &connection,
        );

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }

    #[test]
    fn delete_category_succeeds() {
        let (connection, user_id) = get_test_db_connection();
        let category = create_category(
            CategoryName::new_unchecked("ToDelete"),
            "Zap",
            None,
            user_id,
            &connection,
        )
        .expect("Could not create test category");

        let result = delete_category(category.id, user_id, &connection);

        assert!(result.is_ok());
        assert_eq!(
            get_category(category.id, user_id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_category_with_invalid_id_returns_not_found() {
        let (connection, user_id) = get_test_db_connection();

        let result = delete_category(999999, user_id, &connection);

        assert_eq!(result, Err(Error::DeleteMissingCategory));
    }

    #[test]
    fn delete_category_fails_while_expenses_reference_it() {
        let (connection, user_id) = get_test_db_connection();
        let category = create_category(
            CategoryName::new_unchecked("Food"),
            "Utensils",
            None,
            user_id,
            &connection,
        )
        .expect("Could not create test category");
        adjust_category_aggregates(category.id, 1, 25_500, &connection).unwrap();

        let result = delete_category(category.id, user_id, &connection);

        assert_eq!(result, Err(Error::CategoryInUse("Food".to_string())));
        assert!(
            get_category(category.id, user_id, &connection).is_ok(),
            "the category should not have been deleted"
        );
    }

    #[test]
    fn adjust_category_aggregates_applies_deltas() {
        let (connection, user_id) = get_test_db_connection();
        let category = create_category(
            CategoryName::new_unchecked("Food"),
            "Utensils",
            None,
            user_id,
            &connection,
        )
        .expect("Could not create test category");

        adjust_category_aggregates(category.id, 1, 25_500, &connection).unwrap();
        let category_after_create = get_category(category.id, user_id, &connection).unwrap();
        assert_eq!(category_after_create.expenses_count, 1);
        assert_eq!(
            category_after_create.total_expenses_amount,
            "25.500".parse::<Decimal>().unwrap()
        );

        adjust_category_aggregates(category.id, 0, -15_500, &connection).unwrap();
        let category_after_update = get_category(category.id, user_id, &connection).unwrap();
        assert_eq!(category_after_update.expenses_count, 1);
        assert_eq!(
            category_after_update.total_expenses_amount,
            "10.000".parse::<Decimal>().unwrap()
        );

        adjust_category_aggregates(category.id, -1, -10_000, &connection).unwrap();
        let category_after_delete = get_category(category.id, user_id, &connection).unwrap();
        assert_eq!(category_after_delete.expenses_count, 0);
        assert_eq!(category_after_delete.total_expenses_amount, Decimal::ZERO);
    }

    #[test]
    fn adjust_category_aggregates_clamps_at_zero() {
        let (connection, user_id) = get_test_db_connection();
        let category = create_category(
            CategoryName::new_unchecked("Food"),
            "Utensils",
            None,
            user_id,
            &connection,
        )
        .expect("Could not create test category");

        adjust_category_aggregates(category.id, -5, -999_999, &connection).unwrap();

        let clamped_category = get_category(category.id, user_id, &connection).unwrap();
        assert_eq!(clamped_category.expenses_count, 0);
        assert_eq!(clamped_category.total_expenses_amount, Decimal::ZERO);
    }
}
