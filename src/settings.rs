//! The settings page where users change their own password.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    navigation::NavBar,
    register_user::{PASSWORD_INPUT_MIN_LENGTH, confirm_password_input},
    user::{Role, UserId, get_user_by_id, update_user_password},
};

/// The state needed for the settings page.
#[derive(Debug, Clone)]
pub struct SettingsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettingsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for changing the user's password.
#[derive(Debug, Clone)]
pub struct ChangePasswordEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ChangePasswordEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for changing the signed-in user's password.
#[derive(Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub password: String,
    pub confirm_password: String,
}

/// Render the settings page.
pub async fn get_settings_page(
    State(state): State<SettingsPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve user: {error}"))?;

    Ok(settings_view(user.role == Role::Admin).into_response())
}

/// Handle a password change request.
///
/// The current password must verify against the stored hash before the new
/// password is accepted, so a stolen session alone is not enough to lock the
/// owner out.
pub async fn change_password_endpoint(
    State(state): State<ChangePasswordEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<ChangePasswordForm>,
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

    let is_current_password_valid = match user.password_hash.verify(&form.current_password) {
        Ok(is_current_password_valid) => is_current_password_valid,
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return get_internal_server_error_redirect();
        }
    };

    if !is_current_password_valid {
        return change_password_form(Some("Current password is incorrect"), None, None, None)
            .into_response();
    }

    let validated_password = match ValidatedPassword::new(&form.password) {
        Ok(password) => password,
        Err(error) => {
            return change_password_form(None, Some(error.to_string().as_ref()), None, None)
                .into_response();
        }
    };

    if form.password != form.confirm_password {
        return change_password_form(None, None, Some("Passwords do not match"), None)
            .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");

            return get_internal_server_error_redirect();
        }
    };

    if let Err(error) = update_user_password(user_id, password_hash, &connection) {
        tracing::error!("could not update password for user {user_id}: {error}");

        return error.into_alert_response();
    }

    change_password_form(None, None, None, Some("Password changed successfully")).into_response()
}

fn settings_view(is_admin: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::SETTINGS_VIEW, is_admin).into_html();
    let form = change_password_form(None, None, None, None);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Settings", &[], &content)
}

fn change_password_form(
    current_password_error: Option<&str>,
    password_error: Option<&str>,
    confirm_password_error: Option<&str>,
    success_message: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::CHANGE_PASSWORD)
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { "Change Password" }

            div
            {
                label
                    for="current-password"
                    class=(FORM_LABEL_STYLE)
                {
                    "Current Password"
                }

                input
                    type="password"
                    name="current_password"
                    id="current-password"
                    placeholder="••••••••"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required;

                @if let Some(error_message) = current_password_error
                {
                    p class="text-red-500 text-base" { (error_message) }
                }
            }

            (password_input("", PASSWORD_INPUT_MIN_LENGTH, password_error))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, confirm_password_error))

            @if let Some(message) = success_message
            {
                p class="text-green-600 text-base" { (message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Change Password" }
        }
    }
}

#[cfg(test)]
mod settings_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use crate::{
        PasswordHash, endpoints,
        settings::{SettingsPageState, get_settings_page},
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
        user::{Role, User, create_user, create_user_table},
    };

    fn get_test_state() -> (SettingsPageState, User) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");

        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            &connection,
        )
        .expect("Could not create test user");

        (
            SettingsPageState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user,
        )
    }

    #[tokio::test]
    async fn render_page() {
        let (state, user) = get_test_state();

        let response = get_settings_page(State(state), Extension(user.id))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::CHANGE_PASSWORD, "hx-post");
        assert_form_input(&form, "current_password", "password");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
        assert_form_submit_button(&form);
    }
}
