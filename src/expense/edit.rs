//! Expense editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dinar_input_styles},
    navigation::NavBar,
    payment_method::{PaymentMethod, get_all_payment_methods},
    timezone::{get_local_offset, local_date},
    user::{Role, UserId, get_user_by_id},
};

use super::{
    Expense,
    db::{get_expense, update_expense},
    domain::{ExpenseFormData, ExpenseId},
    form::{ExpenseFormDefaults, expense_form_fields},
};

/// The state needed for the edit expense page.
#[derive(Debug, Clone)]
pub struct EditExpensePageState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kuwait".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating an expense.
#[derive(Debug, Clone)]
pub struct UpdateExpenseEndpointState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kuwait".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateExpenseEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the expense editing page with the current values prefilled.
///
/// Another user's expense renders the same "not found" message as a
/// non-existent one, so the page does not leak which IDs exist.
pub async fn get_edit_expense_page(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<EditExpensePageState>,
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

    let available_categories = get_all_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
    let available_payment_methods = get_all_payment_methods(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve payment methods: {error}"))?;

    let local_timezone = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = local_date(local_timezone);

    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_EXPENSE, expense_id);

    match get_expense(expense_id, user_id, &connection) {
        Ok(expense) => {
            let defaults = ExpenseFormDefaults {
                amount: Some(expense.amount),
                date: expense.date,
                notes: expense.notes.as_deref(),
                category_id: expense.category_id,
                payment_method_id: expense.payment_method_id,
                max_date: today,
                autofocus_amount: false,
            };

            Ok(edit_expense_view(
                &edit_endpoint,
                &update_endpoint,
                &defaults,
                &available_categories,
                &available_payment_methods,
                "",
                is_admin,
            )
            .into_response())
        }
        Err(error) => {
            let error_message = match error {
                Error::NotFound => "Expense not found",
                _ => {
                    tracing::error!("Failed to retrieve expense {expense_id}: {error}");
                    "Failed to load expense"
                }
            };

            let defaults = ExpenseFormDefaults {
                amount: None,
                date: today,
                notes: None,
                category_id: None,
                payment_method_id: None,
                max_date: today,
                autofocus_amount: false,
            };

            Ok(edit_expense_view(
                &edit_endpoint,
                &update_endpoint,
                &defaults,
                &available_categories,
                &available_payment_methods,
                error_message,
                is_admin,
            )
            .into_response())
        }
    }
}

/// Handle expense update form submission.
///
/// The category aggregates are rebalanced inside the update, so moving an
/// expense between categories keeps both counts and totals consistent.
pub async fn update_expense_endpoint(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<UpdateExpenseEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<ExpenseFormData>,
) -> Response {
    let Some(local_timezone) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let today = local_date(local_timezone);

    if form.date > today {
        tracing::error!("Tried to move an expense to a future date");
        return Error::FutureDate(form.date).into_alert_response();
    }

    let notes = form.notes.filter(|notes| !notes.trim().is_empty());
    let builder = Expense::build(form.amount, form.date, user_id)
        .notes(notes)
        .category_id(form.category_id)
        .payment_method_id(form.payment_method_id);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_expense(expense_id, builder, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingExpense) => Error::UpdateMissingExpense.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating expense {expense_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn edit_expense_view(
    edit_endpoint: &str,
    update_endpoint: &str,
    defaults: &ExpenseFormDefaults<'_>,
    available_categories: &[Category],
    available_payment_methods: &[PaymentMethod],
    error_message: &str,
    is_admin: bool,
) -> Markup {
    let nav_bar = NavBar::new(edit_endpoint, is_admin).into_html();
    let fields = expense_form_fields(defaults, available_categories, available_payment_methods);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(update_endpoint)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Expense" }

                (fields)

                @if !error_message.is_empty() {
                    p
                    {
                        (error_message)
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Expense" }
            }
        }
    };

    base("Edit Expense", &[dinar_input_styles()], &content)
}
