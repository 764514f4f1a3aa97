//! Expense recording page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
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
    db::create_expense,
    domain::ExpenseFormData,
    form::{ExpenseFormDefaults, expense_form_fields},
};

/// The state needed for the new expense page.
#[derive(Debug, Clone)]
pub struct NewExpensePageState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kuwait".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for recording an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseEndpointState {
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kuwait".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateExpenseEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the page for recording an expense.
///
/// The date field defaults to today in the configured timezone, which is also
/// the latest date the form accepts.
pub async fn get_new_expense_page(
    State(state): State<NewExpensePageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let (is_admin, available_categories, available_payment_methods) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let user = get_user_by_id(user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve user: {error}"))?;

        let categories = get_all_categories(user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

        let payment_methods = get_all_payment_methods(user_id, &connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve payment methods: {error}"))?;

        (user.role == Role::Admin, categories, payment_methods)
    };

    let local_timezone = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = local_date(local_timezone);

    let defaults = ExpenseFormDefaults {
        amount: None,
        date: today,
        notes: None,
        category_id: None,
        payment_method_id: None,
        max_date: today,
        autofocus_amount: true,
    };

    Ok(new_expense_view(
        &defaults,
        &available_categories,
        &available_payment_methods,
        is_admin,
    )
    .into_response())
}

/// Handle the expense form submission, redirects to the expenses view on
/// success.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<ExpenseFormData>,
) -> Response {
    let Some(local_timezone) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let today = local_date(local_timezone);

    if form.date > today {
        tracing::error!("Tried to record an expense dated in the future");
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

    if let Err(error) = create_expense(builder, &connection) {
        tracing::error!("could not create expense: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::EXPENSES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

fn new_expense_view(
    defaults: &ExpenseFormDefaults<'_>,
    available_categories: &[Category],
    available_payment_methods: &[PaymentMethod],
    is_admin: bool,
) -> Markup {
    let create_expense_endpoint = endpoints::POST_EXPENSE;
    let nav_bar = NavBar::new(endpoints::NEW_EXPENSE_VIEW, is_admin).into_html();
    let fields = expense_form_fields(defaults, available_categories, available_payment_methods);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(create_expense_endpoint)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Record Expense" }

                (fields)

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Record Expense" }
            }
        }
    };

    base("Record Expense", &[dinar_input_styles()], &content)
}


#[cfg(test)]
mod create_expense_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error, PasswordHash, endpoints,
        category::{CategoryName, create_category, get_category},
        db::initialize,
        expense::{
            create::CreateExpenseEndpointState, create_expense_endpoint, domain::ExpenseFormData,
            get_expense,
        },
        test_utils::assert_hx_redirect,
        user::{Role, User, create_user},
    };

    fn get_test_state() -> (CreateExpenseEndpointState, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            &connection,
        )
        .expect("Could not create test user");

        (
            CreateExpenseEndpointState {
                local_timezone: "Etc/UTC".to_owned(),
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user,
        )
    }

    fn amount(string: &str) -> Decimal {
        string.parse().expect("Could not parse test amount")
    }

    #[tokio::test]
    async fn can_record_expense() {
        let (state, user) = get_test_state();
        let category = create_category(
            CategoryName::new_unchecked("Groceries"),
            "ShoppingCart",
            None,
            user.id,
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test category");
        let today = OffsetDateTime::now_utc().date();

        let form = ExpenseFormData {
            amount: amount("25.500"),
            date: today,
            notes: Some("Weekly shop".to_owned()),
            category_id: Some(category.id),
            payment_method_id: None,
        };

        let response = create_expense_endpoint(State(state.clone()), Extension(user.id), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::EXPENSES_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let expense = get_expense(1, user.id, &connection).expect("Could not retrieve expense");
        assert_eq!(expense.amount, amount("25.500"));
        assert_eq!(expense.date, today);
        assert_eq!(expense.notes.as_deref(), Some("Weekly shop"));
        assert_eq!(expense.category_id, Some(category.id));

        let category = get_category(category.id, user.id, &connection).unwrap();
        assert_eq!(category.expenses_count, 1);
        assert_eq!(category.total_expenses_amount, amount("25.500"));
    }

    #[tokio::test]
    async fn blank_notes_are_stored_as_none() {
        let (state, user) = get_test_state();

        let form = ExpenseFormData {
            amount: amount("5.000"),
            date: OffsetDateTime::now_utc().date(),
            notes: Some("   ".to_owned()),
            category_id: None,
            payment_method_id: None,
        };

        let response = create_expense_endpoint(State(state.clone()), Extension(user.id), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let expense = get_expense(1, user.id, &connection).expect("Could not retrieve expense");
        assert_eq!(expense.notes, None);
    }

    #[tokio::test]
    async fn rejects_future_date() {
        let (state, user) = get_test_state();
        let tomorrow = OffsetDateTime::now_utc().date() + Duration::days(1);

        let form = ExpenseFormData {
            amount: amount("5.000"),
            date: tomorrow,
            notes: None,
            category_id: None,
            payment_method_id: None,
        };

        let response = create_expense_endpoint(State(state.clone()), Extension(user.id), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_expense(1, user.id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound),
            "an expense dated in the future must not be recorded"
        );
    }

    #[tokio::test]
    async fn rejects_unknown_category() {
        let (state, user) = get_test_state();

        let form = ExpenseFormData {
            amount: amount("5.000"),
            date: OffsetDateTime::now_utc().date(),
            notes: None,
            category_id: Some(42),
            payment_method_id: None,
        };

        let response = create_expense_endpoint(State(state.clone()), Extension(user.id), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_expense(1, user.id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let (state, user) = get_test_state();

        let form = ExpenseFormData {
            amount: Decimal::ZERO,
            date: OffsetDateTime::now_utc().date(),
            notes: None,
            category_id: None,
            payment_method_id: None,
        };

        let response = create_expense_endpoint(State(state.clone()), Extension(user.id), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
