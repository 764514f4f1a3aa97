//! Payment method creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    user::{Role, UserId, get_user_by_id},
};

use super::{MethodType, PaymentMethodName, create_payment_method, domain::PaymentMethodFormData};

/// The state needed for the payment method creation page.
#[derive(Debug, Clone)]
pub struct NewPaymentMethodPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewPaymentMethodPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for creating a payment method.
#[derive(Debug, Clone)]
pub struct CreatePaymentMethodEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreatePaymentMethodEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the payment method creation page.
///
/// Administrators get an extra checkbox for creating a method shared with
/// every user.
pub async fn get_new_payment_method_page(
    State(state): State<NewPaymentMethodPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve user: {error}"))?;

    Ok(new_payment_method_view(user.role == Role::Admin).into_response())
}

/// Handle payment method creation form submission.
pub async fn create_payment_method_endpoint(
    State(state): State<CreatePaymentMethodEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(new_payment_method): Form<PaymentMethodFormData>,
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
    let is_admin = user.role == Role::Admin;

    // The shared checkbox is only rendered for admins, so a set flag from a
    // non-admin is a forged request.
    if new_payment_method.shared.is_some() && !is_admin {
        return Error::Forbidden.into_alert_response();
    }

    let name = match PaymentMethodName::new(&new_payment_method.name) {
        Ok(name) => name,
        Err(error) => {
            return new_payment_method_form_view(&format!("Error: {error}"), is_admin)
                .into_response();
        }
    };

    let method_type = if new_payment_method.shared.is_some() {
        MethodType::AdminDefined
    } else {
        MethodType::UserDefined
    };

    match create_payment_method(name, method_type, user_id, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::PAYMENT_METHODS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while creating a payment method: {error}"
            );

            error.into_alert_response()
        }
    }
}

fn new_payment_method_view(is_admin: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_PAYMENT_METHOD_VIEW, is_admin).into_html();
    let form = new_payment_method_form_view("", is_admin);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Payment Method", &[], &content)
}

fn new_payment_method_form_view(error_message: &str, is_admin: bool) -> Markup {
    let create_payment_method_endpoint = endpoints::POST_PAYMENT_METHOD;

    html! {
        form
            hx-post=(create_payment_method_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label
                    for="name"
                    class=(FORM_LABEL_STYLE)
                {
                    "Payment Method Name"
                }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Payment Method Name"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if is_admin {
                div class="flex items-center gap-x-3"
                {
                    input
                        type="checkbox"
                        name="shared"
                        id="shared"
                        tabindex="0"
                        class="rounded-xs";

                    label
                        for="shared"
                        class="block text-sm font-medium text-gray-900 dark:text-white"
                    {
                        "Share with every user"
                    }
                }
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Payment Method" }
        }
    }
}


#[cfg(test)]
mod create_payment_method_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::State,
        http::{StatusCode, header::CONTENT_TYPE},
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{
        PasswordHash, endpoints,
        payment_method::{
            MethodType, PaymentMethodName, create::CreatePaymentMethodEndpointState,
            create_payment_method_endpoint, create_payment_method_table,
            domain::PaymentMethodFormData, get_payment_method,
        },
        test_utils::{
            assert_form_error_message, assert_hx_redirect, assert_valid_html, get_header,
            must_get_form, parse_html_fragment,
        },
        user::{Role, User, create_user, create_user_table},
    };

    fn get_test_state() -> (CreatePaymentMethodEndpointState, User, User) {
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
            CreatePaymentMethodEndpointState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            admin,
            user,
        )
    }

    #[tokio::test]
    async fn can_create_payment_method() {
        let (state, _, user) = get_test_state();
        let form = PaymentMethodFormData {
            name: "Cash".to_string(),
            shared: None,
        };

        let response =
            create_payment_method_endpoint(State(state.clone()), Extension(user.id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::PAYMENT_METHODS_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let payment_method = get_payment_method(1, user.id, &connection)
            .expect("Could not retrieve created payment method");
        assert_eq!(
            payment_method.name,
            PaymentMethodName::new_unchecked("Cash")
        );
        assert_eq!(payment_method.method_type, MethodType::UserDefined);
        assert_eq!(payment_method.user_id, Some(user.id));
    }

    #[tokio::test]
    async fn admin_can_create_shared_method() {
        let (state, admin, user) = get_test_state();
        let form = PaymentMethodFormData {
            name: "KNET".to_string(),
            shared: Some("on".to_string()),
        };

        let response =
            create_payment_method_endpoint(State(state.clone()), Extension(admin.id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let payment_method = get_payment_method(1, user.id, &connection)
            .expect("A shared method must be visible to every user");
        assert_eq!(payment_method.method_type, MethodType::AdminDefined);
        assert_eq!(payment_method.user_id, None);
    }

    #[tokio::test]
    async fn regular_user_cannot_create_shared_method() {
        let (state, _, user) = get_test_state();
        let form = PaymentMethodFormData {
            name: "KNET".to_string(),
            shared: Some("on".to_string()),
        };

        let response =
            create_payment_method_endpoint(State(state.clone()), Extension(user.id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            get_payment_method(1, user.id, &state.db_connection.lock().unwrap()),
            Err(crate::Error::NotFound),
            "no payment method should be created"
        );
    }

    #[tokio::test]
    async fn create_payment_method_fails_on_empty_name() {
        let (state, _, user) = get_test_state();
        let form = PaymentMethodFormData {
            name: "".to_string(),
            shared: None,
        };

        let response = create_payment_method_endpoint(State(state), Extension(user.id), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            get_header(&response, CONTENT_TYPE.as_str()),
            "text/html; charset=utf-8"
        );
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: Payment method name cannot be empty");
    }
}
