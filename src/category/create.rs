//! Category creation page and endpoint.

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

use super::{CATEGORY_ICONS, CategoryName, create_category, domain::CategoryFormData};

/// The state needed for the category creation page.
#[derive(Debug, Clone)]
pub struct NewCategoryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewCategoryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category creation page.
pub async fn get_new_category_page(
    State(state): State<NewCategoryPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve user: {error}"))?;

    Ok(new_category_view(user.role == Role::Admin).into_response())
}

/// Handle category creation form submission.
///
/// The new category starts with zero recorded expenses. Its expense count
/// and total are maintained by the expense endpoints from then on.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(new_category): Form<CategoryFormData>,
) -> Response {
    let name = match CategoryName::new(&new_category.name) {
        Ok(name) => name,
        Err(error) => {
            return new_category_form_view(&format!("Error: {error}")).into_response();
        }
    };

    if !CATEGORY_ICONS.contains(&new_category.icon.as_str()) {
        return new_category_form_view("Error: Please choose one of the listed icons")
            .into_response();
    }

    let color = new_category.color.as_deref().filter(|color| !color.is_empty());

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(name, &new_category.icon, color, user_id, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");

            error.into_alert_response()
        }
    }
}

fn new_category_view(is_admin: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW, is_admin).into_html();
    let form = new_category_form_view("");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Category", &[], &content)
}

fn new_category_form_view(error_message: &str) -> Markup {
    let create_category_endpoint = endpoints::POST_CATEGORY;

    html! {
        form
            hx-post=(create_category_endpoint)
            hx-target-error="#alert-container"
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
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (icon_select(CATEGORY_ICONS[0]))

            (color_input(None))

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Category" }
        }
    }
}

/// A select over the fixed icon set with `selected_icon` preselected.
pub(super) fn icon_select(selected_icon: &str) -> Markup {
    html! {
        div
        {
            label
                for="icon"
                class=(FORM_LABEL_STYLE)
            {
                "Icon"
            }

            select
                id="icon"
                name="icon"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                @for icon in CATEGORY_ICONS {
                    @if icon == selected_icon {
                        option value=(icon) selected { (icon) }
                    } @else {
                        option value=(icon) { (icon) }
                    }
                }
            }
        }
    }
}

/// An optional hex color field, prefilled with `color` when set.
pub(super) fn color_input(color: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="color"
                class=(FORM_LABEL_STYLE)
            {
                "Color (optional)"
            }

            input
                id="color"
                type="text"
                name="color"
                value=[color]
                placeholder="#3b82f6"
                pattern="#[0-9a-fA-F]{6}"
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}
