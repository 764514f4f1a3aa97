//! Category editing page and endpoint.

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
    CATEGORY_ICONS, CategoryId, CategoryName,
    create::{color_input, icon_select},
    domain::CategoryFormData,
    get_category, update_category,
};

/// The state needed for the edit category page.
#[derive(Debug, Clone)]
pub struct EditCategoryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating a category.
#[derive(Debug, Clone)]
pub struct UpdateCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category editing page.
///
/// Another user's category renders the same "not found" message as a
/// non-existent one, so the page does not leak which IDs exist.
pub async fn get_edit_category_page(
    Path(category_id): Path<CategoryId>,
    State(state): State<EditCategoryPageState>,
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

    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id);

    match get_category(category_id, user_id, &connection) {
        Ok(category) => Ok(edit_category_view(
            &edit_endpoint,
            &update_endpoint,
            category.name.as_ref(),
            &category.icon,
            category.color.as_deref(),
            "",
            is_admin,
        )
        .into_response()),
        Err(error) => {
            let error_message = match error {
                Error::NotFound => "Category not found",
                _ => {
                    tracing::error!("Failed to retrieve category {category_id}: {error}");
                    "Failed to load category"
                }
            };

            Ok(edit_category_view(
                &edit_endpoint,
                &update_endpoint,
                "",
                CATEGORY_ICONS[0],
                None,
                error_message,
                is_admin,
            )
            .into_response())
        }
    }
}

/// Handle category update form submission.
///
/// Renaming or restyling a category leaves its expense count and total
/// untouched, since the expenses it aggregates are unchanged.
pub async fn update_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<UpdateCategoryEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id);

    let name = match CategoryName::new(&form_data.name) {
        Ok(name) => name,
        Err(error) => {
            return edit_category_form_view(
                &update_endpoint,
                &form_data.name,
                &form_data.icon,
                form_data.color.as_deref(),
                &format!("Error: {error}"),
            )
            .into_response();
        }
    };

    if !CATEGORY_ICONS.contains(&form_data.icon.as_str()) {
        return edit_category_form_view(
            &update_endpoint,
            &form_data.name,
            CATEGORY_ICONS[0],
            form_data.color.as_deref(),
            "Error: Please choose one of the listed icons",
        )
        .into_response();
    }

    let color = form_data.color.as_deref().filter(|color| !color.is_empty());

    match update_category(
        category_id,
        name,
        &form_data.icon,
        color,
        user_id,
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::UpdateMissingCategory) => Error::UpdateMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn edit_category_view(
    edit_endpoint: &str,
    update_endpoint: &str,
    name: &str,
    icon: &str,
    color: Option<&str>,
    error_message: &str,
    is_admin: bool,
) -> Markup {
    let nav_bar = NavBar::new(edit_endpoint, is_admin).into_html();
    let form = edit_category_form_view(update_endpoint, name, icon, color, error_message);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Edit Category", &[], &content)
}

fn edit_category_form_view(
    update_category_endpoint: &str,
    name: &str,
    icon: &str,
    color: Option<&str>,
    error_message: &str,
) -> Markup {
    html! {
        form
            hx-put=(update_category_endpoint)
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label
                    for="name"
                    class=(FORM_LABEL_STYLE)
                {
                    "Category Name"
                }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Category Name"
                    value=(name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (icon_select(icon))

            (color_input(color))

            @if !error_message.is_empty() {
                p
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Category" }
        }
    }
}

#[cfg(test)]
mod edit_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use scraper::Selector;

    use crate::{
        PasswordHash, endpoints,
        category::{
            Category, CategoryName, adjust_category_aggregates, create_category,
            create_category_table,
            domain::CategoryFormData,
            edit::{EditCategoryPageState, UpdateCategoryEndpointState},
            get_category, get_edit_category_page, update_category_endpoint,
        },
        test_utils::{
            assert_content_type, assert_form_error_message, assert_form_input_with_value,
            assert_form_submit_button_with_text, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, must_get_form, parse_html_document, parse_html_fragment,
        },
        user::{Role, UserId, create_user, create_user_table},
    };

    fn get_test_connection() -> (Arc<Mutex<Connection>>, UserId) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");
        create_category_table(&connection).expect("Could not create category table");

        let user = create_user(
            "test@example.com",
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            &connection,
        )
        .expect("Could not create test user");

        (Arc::new(Mutex::new(connection)), user.id)
    }

    fn create_test_category(
        db_connection: &Arc<Mutex<Connection>>,
        user_id: UserId,
    ) -> Category {
        create_category(
            CategoryName::new_unchecked("Groceries"),
            "ShoppingCart",
            Some("#3b82f6"),
            user_id,
            &db_connection.lock().unwrap(),
        )
        .expect("Could not create test category")
    }

    #[tokio::test]
    async fn get_edit_category_page_succeeds() {
        let (db_connection, user_id) = get_test_connection();
        let category = create_test_category(&db_connection, user_id);
        let state = EditCategoryPageState { db_connection };

        let response = get_edit_category_page(Path(category.id), State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::PUT_CATEGORY, category.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "name", "text", category.name.as_ref());
        let selected_icon = form
            .select(&Selector::parse("select[name='icon'] option[selected]").unwrap())
            .next()
            .expect("No icon is preselected");
        assert_eq!(
            selected_icon.value().attr("value").unwrap_or_default(),
            category.icon
        );
        assert_form_submit_button_with_text(&form, "Update Category");
    }

    #[tokio::test]
    async fn get_edit_category_page_with_invalid_id_shows_error() {
        let (db_connection, user_id) = get_test_connection();
        let state = EditCategoryPageState { db_connection };
        let invalid_id = 999999;

        let response = get_edit_category_page(Path(invalid_id), State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_form_error_message(&form, "Category not found");
    }

    #[tokio::test]
    async fn get_edit_category_page_hides_other_users_category() {
        let (db_connection, user_id) = get_test_connection();
        let category = create_test_category(&db_connection, user_id);
        let other_user = create_user(
            "other@example.com",
            PasswordHash::new_unchecked("hunter2"),
            Role::User,
            true,
            &db_connection.lock().unwrap(),
        )
        .expect("Could not create other user");
        let state = EditCategoryPageState { db_connection };

        let response =
            get_edit_category_page(Path(category.id), State(state), Extension(other_user.id))
                .await
                .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Category not found");
    }

    #[tokio::test]
    async fn update_category_endpoint_succeeds_and_keeps_aggregates() {
        let (db_connection, user_id) = get_test_connection();
        let category = create_test_category(&db_connection, user_id);
        adjust_category_aggregates(category.id, 1, 25_500, &db_connection.lock().unwrap())
            .expect("Could not adjust aggregates");
        let state = UpdateCategoryEndpointState {
            db_connection: db_connection.clone(),
        };

        let form = CategoryFormData {
            name: "Food".to_string(),
            icon: "Utensils".to_string(),
            color: None,
        };

        let response = update_category_endpoint(
            Path(category.id),
            State(state),
            Extension(user_id),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);

        let updated_category =
            get_category(category.id, user_id, &db_connection.lock().unwrap()).unwrap();
        assert_eq!(updated_category.name, CategoryName::new_unchecked("Food"));
        assert_eq!(updated_category.icon, "Utensils");
        assert_eq!(updated_category.color, None);
        assert_eq!(
            updated_category.expenses_count, 1,
            "renaming a category must not change its expense count"
        );
        assert_eq!(
            updated_category.total_expenses_amount,
            "25.500".parse::<Decimal>().unwrap(),
            "renaming a category must not change its expense total"
        );
    }

    #[tokio::test]
    async fn update_category_endpoint_with_invalid_id_returns_not_found() {
        let (db_connection, user_id) = get_test_connection();
        let state = UpdateCategoryEndpointState { db_connection };
        let invalid_id = 999999;
        let form = CategoryFormData {
            name: "Updated".to_string(),
            icon: "ShoppingCart".to_string(),
            color: None,
        };

        let response = update_category_endpoint(
            Path(invalid_id),
            State(state),
            Extension(user_id),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_category_endpoint_with_empty_name_returns_error() {
        let (db_connection, user_id) = get_test_connection();
        let category = create_test_category(&db_connection, user_id);
        let state = UpdateCategoryEndpointState { db_connection };

        let form = CategoryFormData {
            name: "".to_string(),
            icon: "ShoppingCart".to_string(),
            color: None,
        };

        let response = update_category_endpoint(
            Path(category.id),
            State(state),
            Extension(user_id),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: Category name cannot be empty");
    }
}
