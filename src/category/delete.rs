//! Category deletion endpoint.

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
    category::{CategoryId, db::delete_category},
    user::UserId,
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle category deletion. Returns success alert or error.
///
/// A category that still has expenses recorded against it is refused, so
/// every expense keeps its category until the user reassigns or deletes it.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<DeleteCategoryEndpointState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(category_id, user_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Category deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error @ (Error::DeleteMissingCategory | Error::CategoryInUse(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use scraper::Html;

    use crate::{
        Error, PasswordHash,
        category::{
            CategoryName, adjust_category_aggregates, create_category, create_category_table,
            delete_category_endpoint, get_category,
        },
        test_utils::{assert_valid_html, get_header, parse_html_fragment},
        user::{Role, UserId, create_user, create_user_table},
    };

    use super::DeleteCategoryEndpointState;

    fn get_test_state() -> (DeleteCategoryEndpointState, UserId) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
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

        (
            DeleteCategoryEndpointState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn delete_category_endpoint_succeeds() {
        let (state, user_id) = get_test_state();
        let category = create_category(
            CategoryName::new_unchecked("Groceries"),
            "ShoppingCart",
            None,
            user_id,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test category");

        let response =
            delete_category_endpoint(Path(category.id), State(state.clone()), Extension(user_id))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            get_category(category.id, user_id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn delete_category_endpoint_refuses_category_in_use() {
        let (state, user_id) = get_test_state();
        let category = create_category(
            CategoryName::new_unchecked("Groceries"),
            "ShoppingCart",
            None,
            user_id,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test category");
        adjust_category_aggregates(category.id, 1, 25_500, &state.db_connection.lock().unwrap())
            .expect("Could not adjust aggregates");

        let response =
            delete_category_endpoint(Path(category.id), State(state.clone()), Extension(user_id))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_error_content(&html, "Could not delete category");
        assert!(
            get_category(category.id, user_id, &state.db_connection.lock().unwrap()).is_ok(),
            "a category with recorded expenses must not be deleted"
        );
    }

    #[tokio::test]
    async fn delete_category_endpoint_with_invalid_id_returns_error_html() {
        let (state, user_id) = get_test_state();
        let invalid_id = 999999;

        let response = delete_category_endpoint(Path(invalid_id), State(state), Extension(user_id))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get_header(&response, "content-type"),
            "text/html; charset=utf-8"
        );

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        assert_error_content(&html, "Could not delete category");
    }

    #[tokio::test]
    async fn delete_category_endpoint_hides_other_users_category() {
        let (state, user_id) = get_test_state();
        let other_user = create_user(
            "other@example.com",
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create other user");
        let category = create_category(
            CategoryName::new_unchecked("Secret"),
            "Heart",
            None,
            other_user.id,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test category");

        let response =
            delete_category_endpoint(Path(category.id), State(state.clone()), Extension(user_id))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let connection = state.db_connection.lock().unwrap();
        assert!(
            get_category(category.id, other_user.id, &connection).is_ok(),
            "another user must not be able to delete the category"
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
