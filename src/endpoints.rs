//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/users/{user_id}', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying a user's expenses.
pub const EXPENSES_VIEW: &str = "/expenses";
/// The page for recording a new expense.
pub const NEW_EXPENSE_VIEW: &str = "/expenses/new";
/// The page for editing an existing expense.
pub const EDIT_EXPENSE_VIEW: &str = "/expenses/{expense_id}/edit";
/// The page for listing all of a user's categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for creating a new category.
pub const NEW_CATEGORY_VIEW: &str = "/categories/new";
/// The page for editing an existing category.
pub const EDIT_CATEGORY_VIEW: &str = "/categories/{category_id}/edit";
/// The page for listing the payment methods visible to a user.
pub const PAYMENT_METHODS_VIEW: &str = "/payment_methods";
/// The page for creating a new payment method.
pub const NEW_PAYMENT_METHOD_VIEW: &str = "/payment_methods/new";
/// The page for editing an existing payment method.
pub const EDIT_PAYMENT_METHOD_VIEW: &str = "/payment_methods/{payment_method_id}/edit";
/// The page for the filtered expense report.
pub const REPORTS_VIEW: &str = "/reports";
/// The printable yearly report page.
pub const YEARLY_REPORT_VIEW: &str = "/reports/yearly";
/// The admin page for managing users.
pub const USERS_VIEW: &str = "/users";
/// The page where a user can change their own password.
pub const SETTINGS_VIEW: &str = "/settings";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route for creating the first user.
pub const REGISTER_API: &str = "/api/register";
/// The route for a user to change their own password.
pub const CHANGE_PASSWORD: &str = "/api/settings/password";
/// The route for an admin to create a user.
pub const USERS_API: &str = "/api/users";
/// The route for an admin to delete a user.
pub const DELETE_USER: &str = "/api/users/{user_id}";
/// The route for an admin to toggle whether a user may log in.
pub const TOGGLE_USER_APPROVAL: &str = "/api/users/{user_id}/approval";
/// The route to create a category.
pub const POST_CATEGORY: &str = "/api/categories";
/// The route to update a category.
pub const PUT_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to delete a category.
pub const DELETE_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to create a payment method.
pub const POST_PAYMENT_METHOD: &str = "/api/payment_methods";
/// The route to update a payment method.
pub const PUT_PAYMENT_METHOD: &str = "/api/payment_methods/{payment_method_id}";
/// The route to delete a payment method.
pub const DELETE_PAYMENT_METHOD: &str = "/api/payment_methods/{payment_method_id}";
/// The route to record an expense.
pub const POST_EXPENSE: &str = "/api/expenses";
/// The route to update an expense.
pub const PUT_EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route to delete an expense.
pub const DELETE_EXPENSE: &str = "/api/expenses/{expense_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
