//! The categories page: income and expense categories side by side with a
//! form for adding new ones.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    category::{
        Category, CategoryId, CategoryKind, count_transactions_per_category, get_all_categories,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CATEGORY_BADGE_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE,
        FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, delete_action_link,
    },
    navigation::NavBar,
};

/// The state needed for the categories page.
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

/// Render the default categories and the user's own categories.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
    let counts = count_transactions_per_category(user_id, &connection).inspect_err(|error| {
        tracing::error!("Could not count transactions per category: {error}")
    })?;

    Ok(categories_view(&categories, &counts).into_response())
}

fn categories_view(categories: &[Category], counts: &HashMap<CategoryId, u32>) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            header class="flex justify-between flex-wrap items-end"
            {
                h1 class="text-xl font-bold" { "Categories" }
            }

            div class="grid gap-6 lg:grid-cols-3"
            {
                @for kind in [CategoryKind::Expense, CategoryKind::Income] {
                    (category_table(kind, categories, counts))
                }

                section class="rounded border border-gray-200 bg-white p-4 shadow-sm dark:border-gray-700 dark:bg-gray-800"
                {
                    h2 class="text-lg font-semibold mb-4" { "Add Category" }
                    (category_form(""))
                }
            }
        }
    );

    base("Categories", &[], &content)
}

fn category_table(
    kind: CategoryKind,
    categories: &[Category],
    counts: &HashMap<CategoryId, u32>,
) -> Markup {
    let rows: Vec<&Category> = categories
        .iter()
        .filter(|category| category.kind == kind)
        .collect();

    html!(
        section data-category-kind=(kind.as_str())
        {
            h2 class="text-lg font-semibold mb-2" { (kind.label()) }

            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                    }
                }

                tbody
                {
                    @for category in &rows {
                        @let count = counts.get(&category.id).copied().unwrap_or(0);
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE)
                            {
                                span class=(CATEGORY_BADGE_STYLE) { (category.name) }
                            }
                            td class=(TABLE_CELL_STYLE) { (count) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                @if category.is_default() {
                                    span class="text-gray-400" { "Default" }
                                } @else {
                                    (delete_action_link(
                                        &endpoints::format_endpoint(endpoints::DELETE_CATEGORY, category.id),
                                        &format!(
                                            "Are you sure you want to delete '{}'? {} transaction(s) will become uncategorised.",
                                            category.name, count
                                        ),
                                        "closest tr",
                                        "delete",
                                    ))
                                }
                            }
                        }
                    }

                    @if rows.is_empty() {
                        tr
                        {
                            td colspan="3" class="px-6 py-4 text-center"
                            {
                                "No " (kind.as_str()) " categories yet."
                            }
                        }
                    }
                }
            }
        }
    )
}

/// A labelled select named `category_id` with the categories grouped by kind.
///
/// The empty first option submits no category.
pub(crate) fn category_select(categories: &[Category]) -> Markup {
    let group = |kind: CategoryKind| {
        html! {
            optgroup label=(kind.label())
            {
                @for category in categories.iter().filter(|category| category.kind == kind) {
                    option value=(category.id) { (category.name) }
                }
            }
        }
    };

    html! {
        label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }
        select id="category_id" name="category_id" class=(FORM_SELECT_STYLE)
        {
            option value="" { "Uncategorized" }
            (group(CategoryKind::Income))
            (group(CategoryKind::Expense))
        }
    }
}

/// The form for adding a category, with an optional error message.
pub(super) fn category_form(error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::CATEGORIES_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Category Name"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="kind" class=(FORM_LABEL_STYLE) { "Type" }

                select id="kind" name="kind" class=(FORM_SELECT_STYLE)
                {
                    option value=(CategoryKind::Expense.as_str()) { (CategoryKind::Expense.label()) }
                    option value=(CategoryKind::Income.as_str()) { (CategoryKind::Income.label()) }
                }
            }

            @if !error_message.is_empty() {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Category" }
        }
    }
}
