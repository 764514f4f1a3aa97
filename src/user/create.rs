//! Endpoint for an administrator to create a user account.
//!
//! The form itself is embedded in the users page, see
//! [crate::user::list::get_users_page].

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, email_input, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    register_user::{PASSWORD_INPUT_MIN_LENGTH, confirm_password_input},
    user::{Role, UserId, create_user, require_admin},
};

/// The state needed for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateUserEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a user account.
#[derive(Clone, Serialize, Deserialize)]
pub struct NewUserForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
}

/// Handle user creation form submission from the users page.
///
/// Only administrators may create accounts. Accounts created here are
/// approved immediately, unlike self-registered accounts.
pub async fn create_user_endpoint(
    State(state): State<CreateUserEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(new_user): Form<NewUserForm>,
) -> Response {
    {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_alert_response();
            }
        };

        if let Err(error) = require_admin(user_id, &connection) {
            return error.into_alert_response();
        }
    }

    // The role comes from a fixed select, so anything else is a forged
    // request and gets an alert rather than a form re-render.
    let role = match Role::from_str(&new_user.role) {
        Ok(role) => role,
        Err(error) => return error.into_alert_response(),
    };

    let validated_password = match ValidatedPassword::new(&new_user.password) {
        Ok(password) => password,
        Err(error) => {
            return new_user_form_view(&new_user.email, None, Some(&error.to_string()), None)
                .into_response();
        }
    };

    if new_user.password != new_user.confirm_password {
        return new_user_form_view(&new_user.email, None, None, Some("Passwords do not match"))
            .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(password_hash) => password_hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing the password: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_user(&new_user.email, password_hash, role, true, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::USERS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::InvalidEmail(_)) => new_user_form_view(
            &new_user.email,
            Some("Please enter a valid email address."),
            None,
            None,
        )
        .into_response(),
        Err(Error::DuplicateEmail(_)) => new_user_form_view(
            &new_user.email,
            Some("An account with this email already exists."),
            None,
            None,
        )
        .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a user: {error}");

            error.into_alert_response()
        }
    }
}

/// The form for creating a user account, rendered in the users page and
/// re-rendered with error messages when validation fails.
pub(super) fn new_user_form_view(
    email: &str,
    email_error_message: Option<&str>,
    password_error_message: Option<&str>,
    confirm_password_error_message: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS_API)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (email_input(email, email_error_message))
            (password_input("", PASSWORD_INPUT_MIN_LENGTH, password_error_message))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, confirm_password_error_message))

            div
            {
                label
                    for="role"
                    class=(FORM_LABEL_STYLE)
                {
                    "Role"
                }

                select
                    id="role"
                    name="role"
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="user" selected { "User" }
                    option value="admin" { "Admin" }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add User" }
        }
    }
}
