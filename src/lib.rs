//! Masareef is a web app for tracking household expenses against categories
//! and payment methods.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use rust_decimal::Decimal;
use time::Date;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod category;
mod charts;
mod dashboard;
mod db;
mod endpoints;
mod expense;
mod html;
mod internal_server_error;
mod logging;
mod money;
mod navigation;
mod not_found;
mod payment_method;
mod register_user;
mod report;
mod routing;
mod settings;
#[cfg(test)]
mod test_utils;
mod timezone;
mod user;

pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use user::{User, UserId, get_user_by_email, update_user_password};

use crate::{
    alert::Alert,
    category::CategoryId,
    internal_server_error::{InternalServerError, get_403_forbidden_response},
    not_found::get_404_not_found_response,
    payment_method::PaymentMethodId,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an email and password combination that does not
    /// match a registered user.
    #[error("incorrect email or password")]
    InvalidCredentials,

    /// The user is signed in but does not have the role required for the
    /// requested operation.
    #[error("the current user does not have permission to perform this operation")]
    Forbidden,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing a date string.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not parse date string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// A date in the future was used to create or update an expense.
    ///
    /// Expenses record purchases that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address is already registered to another user.
    #[error("the email \"{0}\" is already registered")]
    DuplicateEmail(String),

    /// The string is not a usable email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The string does not name a user role.
    #[error("\"{0}\" is not a valid role")]
    InvalidRole(String),

    /// The string does not name a payment method type.
    #[error("\"{0}\" is not a valid payment method type")]
    InvalidMethodType(String),

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// An empty string was used to create a payment method name.
    #[error("Payment method name cannot be empty")]
    EmptyPaymentMethodName,

    /// An expense amount that is not positive or has more than three decimal
    /// places.
    #[error("{0} is not a valid expense amount")]
    InvalidAmount(Decimal),

    /// The category ID on an expense did not match a category owned by the
    /// current user.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// The payment method ID on an expense did not match a payment method
    /// visible to the current user.
    #[error("the payment method ID does not refer to a valid payment method")]
    InvalidPaymentMethod(Option<PaymentMethodId>),

    /// Tried to delete a category that still has expenses recorded against it.
    #[error("the category \"{0}\" still has expenses recorded against it")]
    CategoryInUse(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete an expense that does not exist
    #[error("tried to delete an expense that is not in the database")]
    DeleteMissingExpense,

    /// Tried to update an expense that does not exist
    #[error("tried to update an expense that is not in the database")]
    UpdateMissingExpense,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a payment method that does not exist
    #[error("tried to update a payment method that is not in the database")]
    UpdateMissingPaymentMethod,

    /// Tried to delete a payment method that does not exist
    #[error("tried to delete a payment method that is not in the database")]
    DeleteMissingPaymentMethod,

    /// Tried to update a user that does not exist
    #[error("tried to update a user that is not in the database")]
    UpdateMissingUser,

    /// Tried to delete a user that does not exist
    #[error("tried to delete a user that is not in the database")]
    DeleteMissingUser,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::Forbidden => get_403_forbidden_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidTimezoneError(timezone) => alert_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Invalid Timezone Settings",
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            ),
            Error::Forbidden => alert_response(
                StatusCode::FORBIDDEN,
                "Permission denied",
                "You do not have permission to perform this action.",
            ),
            Error::InvalidAmount(amount) => alert_response(
                StatusCode::BAD_REQUEST,
                "Invalid expense amount",
                &format!(
                    "{amount} is not a valid amount. Amounts must be greater than zero \
                    and have at most three decimal places."
                ),
            ),
            Error::FutureDate(date) => alert_response(
                StatusCode::BAD_REQUEST,
                "Invalid expense date",
                &format!(
                    "{date} is a date in the future, which is not allowed. \
                    Change the date to today or earlier."
                ),
            ),
            Error::InvalidCategory(category_id) => alert_response(
                StatusCode::BAD_REQUEST,
                "Invalid category ID",
                &format!("Could not find a category with the ID {category_id:?}"),
            ),
            Error::InvalidPaymentMethod(payment_method_id) => alert_response(
                StatusCode::BAD_REQUEST,
                "Invalid payment method ID",
                &format!("Could not find a payment method with the ID {payment_method_id:?}"),
            ),
            Error::CategoryInUse(name) => alert_response(
                StatusCode::BAD_REQUEST,
                "Could not delete category",
                &format!(
                    "The category \"{name}\" still has expenses recorded against it. \
                    Reassign or delete those expenses first."
                ),
            ),
            Error::DuplicateEmail(email) => alert_response(
                StatusCode::BAD_REQUEST,
                "Duplicate Email",
                &format!(
                    "The email {email} is already registered. \
                    Choose a different email, or edit or delete the existing user.",
                ),
            ),
            Error::UpdateMissingExpense => alert_response(
                StatusCode::NOT_FOUND,
                "Could not update expense",
                "The expense could not be found.",
            ),
            Error::DeleteMissingExpense => alert_response(
                StatusCode::NOT_FOUND,
                "Could not delete expense",
                "The expense could not be found. \
                Try refreshing the page to see if the expense has already been deleted.",
            ),
            Error::UpdateMissingCategory => alert_response(
                StatusCode::NOT_FOUND,
                "Could not update category",
                "The category could not be found.",
            ),
            Error::DeleteMissingCategory => alert_response(
                StatusCode::NOT_FOUND,
                "Could not delete category",
                "The category could not be found. \
                Try refreshing the page to see if the category has already been deleted.",
            ),
            Error::UpdateMissingPaymentMethod => alert_response(
                StatusCode::NOT_FOUND,
                "Could not update payment method",
                "The payment method could not be found.",
            ),
            Error::DeleteMissingPaymentMethod => alert_response(
                StatusCode::NOT_FOUND,
                "Could not delete payment method",
                "The payment method could not be found. \
                Try refreshing the page to see if the payment method has already been deleted.",
            ),
            Error::UpdateMissingUser => alert_response(
                StatusCode::NOT_FOUND,
                "Could not update user",
                "The user could not be found.",
            ),
            Error::DeleteMissingUser => alert_response(
                StatusCode::NOT_FOUND,
                "Could not delete user",
                "The user could not be found. \
                Try refreshing the page to see if the user has already been deleted.",
            ),
            _ => alert_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
                "An unexpected error occurred, check the server logs for more details.",
            ),
        }
    }
}

fn alert_response(status_code: StatusCode, message: &str, details: &str) -> Response {
    (
        status_code,
        Alert::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
        .into_html(),
    )
        .into_response()
}
