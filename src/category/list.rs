//! Categories listing page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    user::{Role, UserId, get_user_by_id},
};

use super::{Category, get_all_categories};

/// The state needed for the categories listing page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A category with its formatted edit URL for template rendering.
#[derive(Debug, Clone)]
struct CategoryWithEditUrl {
    pub category: Category,
    pub edit_url: String,
}

/// Render the categories listing page with each category's expense count and
/// running total.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve user: {error}"))?;

    let categories = get_all_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let categories_with_edit_urls = categories
        .into_iter()
        .map(|category| CategoryWithEditUrl {
            edit_url: endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id),
            category,
        })
        .collect::<Vec<_>>();

    Ok(categories_view(&categories_with_edit_urls, user.role == Role::Admin).into_response())
}

/// The category name in a pill, prefixed with a dot in the category's color
/// when one is set. The icon name is exposed as a data attribute for the
/// client-side icon font.
fn category_badge(category: &Category) -> Markup {
    html!(
        span class=(CATEGORY_BADGE_STYLE) data-icon=(category.icon)
        {
            @if let Some(color) = &category.color {
                span
                    class="mr-1.5 inline-block h-2 w-2 rounded-full"
                    style=(format!("background-color: {color}"))
                {}
            }

            (category.name)
        }
    )
}

fn categories_view(categories: &[CategoryWithEditUrl], is_admin: bool) -> Markup {
    let new_category_route = endpoints::NEW_CATEGORY_VIEW;
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW, is_admin).into_html();

    let table_row = |category_with_url: &CategoryWithEditUrl| {
        let delete_url = endpoints::format_endpoint(
            endpoints::DELETE_CATEGORY,
            category_with_url.category.id,
        );
        let confirm_message = format!(
            "Are you sure you want to delete '{}'?",
            category_with_url.category.name
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    (category_badge(&category_with_url.category))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (category_with_url.category.expenses_count)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    span class="tabular-nums"
                    {
                        (format_currency(category_with_url.category.total_expenses_amount))
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &category_with_url.edit_url,
                            &delete_url,
                            &confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(new_category_route) class=(LINK_STYLE)
                    {
                        "Create Category"
                    }
                }

                (categories_cards_view(categories, new_category_route))

                section class="hidden lg:block dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Name"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Expenses"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Total"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Actions"
                                }
                            }
                        }

                        tbody
                        {
                            @for category_with_url in categories {
                                (table_row(category_with_url))
                            }

                            @if categories.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories created yet. "
                                        a href=(new_category_route) class=(LINK_STYLE)
                                        {
                                            "Create your first category"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Categories", &[], &content)
}

fn categories_cards_view(categories: &[CategoryWithEditUrl], new_category_route: &str) -> Markup {
    struct CategoryCardView<'a> {
        category: &'a Category,
        total: String,
        edit_url: &'a str,
        delete_url: String,
        confirm_message: String,
    }

    let cards = categories
        .iter()
        .map(|category_with_url| CategoryCardView {
            category: &category_with_url.category,
            total: format_currency(category_with_url.category.total_expenses_amount),
            edit_url: &category_with_url.edit_url,
            delete_url: endpoints::format_endpoint(
                endpoints::DELETE_CATEGORY,
                category_with_url.category.id,
            ),
            confirm_message: format!(
                "Are you sure you want to delete '{}'?",
                category_with_url.category.name
            ),
        })
        .collect::<Vec<_>>();

    html!(
        ul class="lg:hidden space-y-4"
        {
            @for card in &cards {
                li class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                    data-category-card="true"
                {
                    div class="flex items-start justify-between gap-3"
                    {
                        (category_badge(card.category))
                        span class="text-sm tabular-nums text-gray-900 dark:text-white"
                        {
                            (card.total)
                        }
                    }

                    div class="mt-2 text-sm text-gray-500 dark:text-gray-400"
                    {
                        (card.category.expenses_count) " expense(s)"
                    }

                    div class="mt-2 flex items-center gap-4 text-sm"
                    {
                        (edit_delete_action_links(
                            card.edit_url,
                            &card.delete_url,
                            &card.confirm_message,
                            "closest [data-category-card='true']",
                            "outerHTML",
                        ))
                    }
                }
            }

            @if cards.is_empty() {
                li class="rounded border border-dashed border-gray-300 bg-white px-4 py-6 text-center text-sm text-gray-500 dark:border-gray-700 dark:bg-gray-800 dark:text-gray-400"
                {
                    "No categories created yet. "
                    a href=(new_category_route) class=(LINK_STYLE)
                    {
                        "Create your first category"
                    }
                }
            }
        }
    )
}

#[cfg(test)]
mod get_categories_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        PasswordHash,
        category::{
            CategoryName, adjust_category_aggregates, create_category, create_category_table,
            get_categories_page, list::CategoriesPageState,
        },
        test_utils::{assert_valid_html, parse_html_document},
        user::{Role, User, create_user, create_user_table},
    };

    fn get_test_state() -> (CategoriesPageState, User) {
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

        (
            CategoriesPageState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user,
        )
    }

    #[tokio::test]
    async fn lists_own_categories_with_aggregates() {
        let (state, user) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            let groceries = create_category(
                CategoryName::new_unchecked("Groceries"),
                "ShoppingCart",
                Some("#3b82f6"),
                user.id,
                &connection,
            )
            .expect("Could not create test category");
            adjust_category_aggregates(groceries.id, 2, 35_750, &connection)
                .expect("Could not adjust aggregates");
            create_category(
                CategoryName::new_unchecked("Coffee"),
                "Coffee",
                None,
                user.id,
                &connection,
            )
            .expect("Could not create test category");

            let other_user = create_user(
                "other@example.com",
                PasswordHash::new_unchecked("hunter2"),
                Role::User,
                true,
                &connection,
            )
            .expect("Could not create other user");
            create_category(
                CategoryName::new_unchecked("Secret"),
                "Heart",
                None,
                other_user.id,
                &connection,
            )
            .expect("Could not create test category");
        }

        let response = get_categories_page(State(state), Extension(user.id))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let rows = html
            .select(&Selector::parse("tbody tr").unwrap())
            .map(|row| row.text().collect::<String>())
            .collect::<Vec<_>>();

        assert_eq!(
            rows.len(),
            2,
            "want one table row per category owned by the user, got {rows:?}"
        );
        assert!(
            rows[0].contains("Coffee") && rows[0].contains("KD 0.000"),
            "want categories sorted by name with their totals, got {rows:?}"
        );
        assert!(
            rows[1].contains("Groceries")
                && rows[1].contains('2')
                && rows[1].contains("KD 35.750"),
            "want the expense count and total for each category, got {rows:?}"
        );
        assert!(
            !rows.iter().any(|row| row.contains("Secret")),
            "another user's categories must not be listed, got {rows:?}"
        );
    }

    #[tokio::test]
    async fn shows_empty_state_with_create_link() {
        let (state, user) = get_test_state();

        let response = get_categories_page(State(state), Extension(user.id))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        let empty_state = html
            .select(&Selector::parse("tbody tr td").unwrap())
            .next()
            .expect("No empty state row found");

        assert!(
            empty_state
                .text()
                .collect::<String>()
                .contains("No categories created yet"),
            "want an empty state message when there are no categories"
        );
        assert!(
            empty_state
                .select(&Selector::parse("a").unwrap())
                .next()
                .is_some(),
            "want a link to the new category page in the empty state"
        );
    }
}
