//! Payment method deletion endpoint.

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
    payment_method::{PaymentMethodId, db::delete_payment_method, get_payment_method},
    user::{UserId, get_user_by_id},
};

/// The state needed for deleting a payment method.
#[derive(Debug, Clone)]
pub struct DeletePaymentMethodEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeletePaymentMethodEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle payment method deletion. Returns success alert or error.
///
/// Expenses that referenced the method are kept with their payment method
/// cleared.
pub async fn delete_payment_method_endpoint(
    Path(payment_method_id): Path<PaymentMethodId>,
    State(state): State<DeletePaymentMethodEndpointState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let user = match get_user_by_id(user_id, &connection) {
        Ok(user) => user,
        Err(error) => {
            tracing::error!("Failed to retrieve user: {error}");
            return error.into_alert_response();
        }
    };

    let payment_method = match get_payment_method(payment_method_id, user_id, &connection) {
        Ok(payment_method) => payment_method,
        Err(Error::NotFound) => return Error::DeleteMissingPaymentMethod.into_alert_response(),
        Err(error) => {
            tracing::error!("Failed to retrieve payment method {payment_method_id}: {error}");
            return error.into_alert_response();
        }
    };

    if !payment_method.can_be_modified_by(&user) {
        return Error::Forbidden.into_alert_response();
    }

    match delete_payment_method(payment_method_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Payment method deleted successfully".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingPaymentMethod) => {
            Error::DeleteMissingPaymentMethod.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting payment method \
                {payment_method_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_payment_method_endpoint_tests {
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
        payment_method::{
            MethodType, PaymentMethodName, create_payment_method, create_payment_method_table,
            delete_payment_method_endpoint, get_payment_method,
        },
        test_utils::{assert_valid_html, get_header, parse_html_fragment},
        user::{Role, User, create_user, create_user_table},
    };

    use super::DeletePaymentMethodEndpointState;

    fn get_test_state() -> (DeletePaymentMethodEndpointState, User, User) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");
        create_payment_method_table(&connection).expect("Could not create payment method table");

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
            DeletePaymentMethodEndpointState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            admin,
            user,
        )
    }

    #[tokio::test]
    async fn delete_payment_method_endpoint_succeeds() {
        let (state, _, user) = get_test_state();
        let payment_method = create_payment_method(
            PaymentMethodName::new_unchecked("Cash"),
            MethodType::UserDefined,
            user.id,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test payment method");

        let response = delete_payment_method_endpoint(
            Path(payment_method.id),
            State(state.clone()),
            Extension(user.id),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            get_payment_method(
                payment_method.id,
                user.id,
                &state.db_connection.lock().unwrap()
            ),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn regular_user_cannot_delete_shared_method() {
        let (state, admin, user) = get_test_state();
        let payment_method = create_payment_method(
            PaymentMethodName::new_unchecked("KNET"),
            MethodType::AdminDefined,
            admin.id,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test payment method");

        let response = delete_payment_method_endpoint(
            Path(payment_method.id),
            State(state.clone()),
            Extension(user.id),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(
            get_payment_method(
                payment_method.id,
                user.id,
                &state.db_connection.lock().unwrap()
            )
            .is_ok(),
            "the shared method must still exist"
        );
    }

    #[tokio::test]
    async fn admin_can_delete_shared_method() {
        let (state, admin, _) = get_test_state();
        let payment_method = create_payment_method(
            PaymentMethodName::new_unchecked("KNET"),
            MethodType::AdminDefined,
            admin.id,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test payment method");

        let response = delete_payment_method_endpoint(
            Path(payment_method.id),
            State(state.clone()),
            Extension(admin.id),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn delete_payment_method_endpoint_with_invalid_id_returns_error_html() {
        let (state, _, user) = get_test_state();
        let invalid_id = 999999;

        let response =
            delete_payment_method_endpoint(Path(invalid_id), State(state), Extension(user.id))
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
        assert_eq!(error_message.trim(), "Could not delete payment method");
    }
}
