//! User deletion endpoint.

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
    user::{UserId, db::delete_user, require_admin},
};

/// The state needed for deleting a user.
#[derive(Debug, Clone)]
pub struct DeleteUserEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteUserEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle user deletion. Returns success alert or error.
///
/// The user's categories, expenses and user-defined payment methods are
/// deleted along with the account.
pub async fn delete_user_endpoint(
    Path(user_id): Path<i64>,
    State(state): State<DeleteUserEndpointState>,
    Extension(current_user_id): Extension<UserId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = require_admin(current_user_id, &connection) {
        return error.into_alert_response();
    }

    match delete_user(UserId::new(user_id), &connection) {
        Ok(_) => Alert::Success {
            message: "User deleted successfully".to_owned(),
            details: "Their categories, payment methods, and expenses have also been removed."
                .to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingUser) => Error::DeleteMissingUser.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_user_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash,
        test_utils::{assert_valid_html, get_header, parse_html_fragment},
        user::{Role, User, create_user, create_user_table, get_user_by_id},
    };

    use super::{DeleteUserEndpointState, delete_user_endpoint};

    fn get_test_state() -> (DeleteUserEndpointState, User, User) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");

        let admin = create_user(
            "admin@example.com",
            PasswordHash::new_unchecked("hunter2"),
            Role::Admin,
            true,
            &connection,
        )
        .expect("Could not create admin user");

        let user = create_user(
            "user@example.com",
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            &connection,
        )
        .expect("Could not create regular user");

        (
            DeleteUserEndpointState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            admin,
            user,
        )
    }

    #[tokio::test]
    async fn delete_user_endpoint_succeeds() {
        let (state, admin, user) = get_test_state();

        let response = delete_user_endpoint(
            Path(user.id.as_i64()),
            State(state.clone()),
            Extension(admin.id),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_user_by_id(user.id, &connection),
            Err(Error::NotFound),
            "the user should have been deleted"
        );
    }

    #[tokio::test]
    async fn forbids_regular_users() {
        let (state, admin, user) = get_test_state();

        let response = delete_user_endpoint(
            Path(admin.id.as_i64()),
            State(state.clone()),
            Extension(user.id),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let connection = state.db_connection.lock().unwrap();
        assert!(
            get_user_by_id(admin.id, &connection).is_ok(),
            "the admin should not have been deleted"
        );
    }

    #[tokio::test]
    async fn with_invalid_id_returns_error_html() {
        let (state, admin, _) = get_test_state();

        let response = delete_user_endpoint(Path(999999), State(state), Extension(admin.id))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            get_header(&response, "content-type"),
            "text/html; charset=utf-8"
        );

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);

        let p = scraper::Selector::parse("p").unwrap();
        let error_message = html
            .select(&p)
            .next()
            .expect("No error message found")
            .text()
            .collect::<String>();
        assert_eq!(error_message.trim(), "Could not delete user");
    }
}
