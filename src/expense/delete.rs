//! Expense deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    expense::{ExpenseId, db::delete_expense},
    user::UserId,
};

/// The state needed for deleting an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExpenseEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle expense deletion. Returns success alert or error.
///
/// Deleting an expense gives its amount back to the category aggregates in
/// the same transaction as the delete.
pub async fn delete_expense_endpoint(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<DeleteExpenseEndpointState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_expense(expense_id, user_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Expense deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error @ Error::DeleteMissingExpense) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting expense {expense_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_expense_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use scraper::Html;
    use time::OffsetDateTime;

    use crate::{
        Error, PasswordHash,
        category::{Category, CategoryName, create_category, get_category},
        db::initialize,
        expense::{Expense, create_expense, delete_expense_endpoint, get_expense},
        test_utils::{assert_valid_html, get_header, parse_html_fragment},
        user::{Role, UserId, create_user},
    };

    use super::DeleteExpenseEndpointState;

    fn get_test_state() -> (DeleteExpenseEndpointState, UserId) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            &connection,
        )
        .expect("Could not create test user");

        (
            DeleteExpenseEndpointState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    fn create_test_category(state: &DeleteExpenseEndpointState, user_id: UserId) -> Category {
        create_category(
            CategoryName::new_unchecked("Groceries"),
            "ShoppingCart",
            None,
            user_id,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test category")
    }

    fn create_test_expense(
        state: &DeleteExpenseEndpointState,
        category: &Category,
        user_id: UserId,
    ) -> Expense {
        let builder = Expense::build(
            "25.500".parse().unwrap(),
            OffsetDateTime::now_utc().date(),
            user_id,
        )
        .category_id(Some(category.id));

        create_expense(builder, &state.db_connection.lock().unwrap())
            .expect("Could not create test expense")
    }

    #[tokio::test]
    async fn delete_expense_endpoint_succeeds_and_restores_aggregates() {
        let (state, user_id) = get_test_state();
        let category = create_test_category(&state, user_id);
        let expense = create_test_expense(&state, &category, user_id);

        let response =
            delete_expense_endpoint(Path(expense.id), State(state.clone()), Extension(user_id))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_expense(expense.id, user_id, &connection),
            Err(Error::NotFound)
        );

        let category = get_category(category.id, user_id, &connection).unwrap();
        assert_eq!(category.expenses_count, 0);
        assert_eq!(category.total_expenses_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn delete_expense_endpoint_with_invalid_id_returns_error_html() {
        let (state, user_id) = get_test_state();
        let invalid_id = 999999;

        let response = delete_expense_endpoint(Path(invalid_id), State(state), Extension(user_id))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get_header(&response, "content-type"),
            "text/html; charset=utf-8"
        );

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_error_content(&html, "Could not delete expense");
    }

    #[tokio::test]
    async fn delete_expense_endpoint_hides_other_users_expense() {
        let (state, user_id) = get_test_state();
        let other_user = create_user(
            "other@example.com",
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create other user");
        let category = create_test_category(&state, other_user.id);
        let expense = create_test_expense(&state, &category, other_user.id);

        let response =
            delete_expense_endpoint(Path(expense.id), State(state.clone()), Extension(user_id))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let connection = state.db_connection.lock().unwrap();
        assert!(
            get_expense(expense.id, other_user.id, &connection).is_ok(),
            "another user must not be able to delete the expense"
        );
    }

    #[track_caller]
    fn assert_error_content(html: &Html, want_error_message: &str) {
        let p = scraper::Selector::parse("p").unwrap();
        let error_message = html
            .select(&p)
            .next()
            .expect("No error message found")
            .text()
            .collect::<Vec<_>>()
            .join("");
        let got_error_message = error_message.trim();

        assert_eq!(want_error_message, got_error_message);
    }
}
