//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    middleware,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{auth_guard, auth_guard_hx, get_log_in_page, get_log_out, post_log_in},
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_page,
        get_edit_category_page, get_new_category_page, update_category_endpoint,
    },
    dashboard::get_dashboard_page,
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, get_edit_expense_page, get_expenses_page,
        get_new_expense_page, update_expense_endpoint,
    },
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    payment_method::{
        create_payment_method_endpoint, delete_payment_method_endpoint,
        get_edit_payment_method_page, get_new_payment_method_page, get_payment_methods_page,
        update_payment_method_endpoint,
    },
    register_user::{get_register_page, register_user},
    report::{get_reports_page, get_yearly_report_page},
    settings::{change_password_endpoint, get_settings_page},
    user::{
        create_user_endpoint, delete_user_endpoint, get_users_page, toggle_user_approval_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::REGISTER_API, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .route(endpoints::NEW_EXPENSE_VIEW, get(get_new_expense_page))
        .route(endpoints::EDIT_EXPENSE_VIEW, get(get_edit_expense_page))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::NEW_CATEGORY_VIEW, get(get_new_category_page))
        .route(endpoints::EDIT_CATEGORY_VIEW, get(get_edit_category_page))
        .route(
            endpoints::PAYMENT_METHODS_VIEW,
            get(get_payment_methods_page),
        )
        .route(
            endpoints::NEW_PAYMENT_METHOD_VIEW,
            get(get_new_payment_method_page),
        )
        .route(
            endpoints::EDIT_PAYMENT_METHOD_VIEW,
            get(get_edit_payment_method_page),
        )
        .route(endpoints::REPORTS_VIEW, get(get_reports_page))
        .route(endpoints::YEARLY_REPORT_VIEW, get(get_yearly_report_page))
        .route(endpoints::USERS_VIEW, get(get_users_page))
        .route(endpoints::SETTINGS_VIEW, get(get_settings_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-Redirect header for auth redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::POST_EXPENSE, post(create_expense_endpoint))
            .route(endpoints::PUT_EXPENSE, put(update_expense_endpoint))
            .route(endpoints::DELETE_EXPENSE, delete(delete_expense_endpoint))
            .route(endpoints::POST_CATEGORY, post(create_category_endpoint))
            .route(endpoints::PUT_CATEGORY, put(update_category_endpoint))
            .route(endpoints::DELETE_CATEGORY, delete(delete_category_endpoint))
            .route(
                endpoints::POST_PAYMENT_METHOD,
                post(create_payment_method_endpoint),
            )
            .route(
                endpoints::PUT_PAYMENT_METHOD,
                put(update_payment_method_endpoint),
            )
            .route(
                endpoints::DELETE_PAYMENT_METHOD,
                delete(delete_payment_method_endpoint),
            )
            .route(endpoints::CHANGE_PASSWORD, post(change_password_endpoint))
            .route(endpoints::USERS_API, post(create_user_endpoint))
            .route(endpoints::DELETE_USER, delete(delete_user_endpoint))
            .route(
                endpoints::TOGGLE_USER_APPROVAL,
                post(toggle_user_approval_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::response::IntoResponse;

    use crate::{endpoints, routing::get_index_page, test_utils::assert_see_other_redirect};

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let response = get_index_page().await.into_response();

        assert_see_other_redirect(&response, endpoints::DASHBOARD_VIEW);
    }
}
