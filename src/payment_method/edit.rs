//! Payment method editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
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

use super::{
    PaymentMethodId, PaymentMethodName, domain::PaymentMethodFormData, get_payment_method,
    update_payment_method,
};

/// The state needed for the edit payment method page.
#[derive(Debug, Clone)]
pub struct EditPaymentMethodPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditPaymentMethodPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating a payment method.
#[derive(Debug, Clone)]
pub struct UpdatePaymentMethodEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdatePaymentMethodEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the payment method editing page.
///
/// A regular user opening a shared method gets the forbidden page, since the
/// method is visible to them but not theirs to change.
pub async fn get_edit_payment_method_page(
    Path(payment_method_id): Path<PaymentMethodId>,
    State(state): State<EditPaymentMethodPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve user: {error}"))?;
    let is_admin = user.role == Role::Admin;

    let edit_endpoint =
        endpoints::format_endpoint(endpoints::EDIT_PAYMENT_METHOD_VIEW, payment_method_id);
    let update_endpoint =
        endpoints::format_endpoint(endpoints::PUT_PAYMENT_METHOD, payment_method_id);

    match get_payment_method(payment_method_id, user_id, &connection) {
        Ok(payment_method) => {
            if !payment_method.can_be_modified_by(&user) {
                return Err(Error::Forbidden);
            }

            Ok(edit_payment_method_view(
                &edit_endpoint,
                &update_endpoint,
                payment_method.name.as_ref(),
                "",
                is_admin,
            )
            .into_response())
        }
        Err(error) => {
            let error_message = match error {
                Error::NotFound => "Payment method not found",
                _ => {
                    tracing::error!(
                        "Failed to retrieve payment method {payment_method_id}: {error}"
                    );
                    "Failed to load payment method"
                }
            };

            Ok(edit_payment_method_view(
                &edit_endpoint,
                &update_endpoint,
                "",
                error_message,
                is_admin,
            )
            .into_response())
        }
    }
}

/// Handle payment method update form submission.
pub async fn update_payment_method_endpoint(
    Path(payment_method_id): Path<PaymentMethodId>,
    State(state): State<UpdatePaymentMethodEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(form_data): Form<PaymentMethodFormData>,
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
        Err(Error::NotFound) => return Error::UpdateMissingPaymentMethod.into_alert_response(),
        Err(error) => {
            tracing::error!("Failed to retrieve payment method {payment_method_id}: {error}");
            return error.into_alert_response();
        }
    };

    if !payment_method.can_be_modified_by(&user) {
        return Error::Forbidden.into_alert_response();
    }

    let update_endpoint =
        endpoints::format_endpoint(endpoints::PUT_PAYMENT_METHOD, payment_method_id);

    let name = match PaymentMethodName::new(&form_data.name) {
        Ok(name) => name,
        Err(error) => {
            return edit_payment_method_form_view(
                &update_endpoint,
                &form_data.name,
                &format!("Error: {error}"),
            )
            .into_response();
        }
    };

    match update_payment_method(payment_method_id, name, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::PAYMENT_METHODS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingPaymentMethod) => {
            Error::UpdateMissingPaymentMethod.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating payment method \
                {payment_method_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_payment_method_view(
    edit_endpoint: &str,
    update_endpoint: &str,
    name: &str,
    error_message: &str,
    is_admin: bool,
) -> Markup {
    let nav_bar = NavBar::new(edit_endpoint, is_admin).into_html();
    let form = edit_payment_method_form_view(update_endpoint, name, error_message);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Edit Payment Method", &[], &content)
}

fn edit_payment_method_form_view(
    update_payment_method_endpoint: &str,
    name: &str,
    error_message: &str,
) -> Markup {
    html! {
        form
            hx-put=(update_payment_method_endpoint)
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
                    value=(name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if !error_message.is_empty() {
                p
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Payment Method" }
        }
    }
}
