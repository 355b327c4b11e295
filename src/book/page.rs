//! The monthly account book, the home page for recording cash spending.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error, UserID,
    book::{LedgerEntry, LedgerSource, MonthSummary, get_month_summary},
    cash::CashSide,
    category::{Category, CategoryKind, category_select, get_all_categories},
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, EXPENSE_TEXT_STYLE, FORM_LABEL_STYLE,
        FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, INCOME_TEXT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency, format_description,
    },
    navigation::NavBar,
    period::{MonthQuery, YearMonth},
    timezone::local_today,
};

#[derive(Debug, Clone)]
pub struct BookPageState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BookPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

fn month_url(base_url: &str, month: YearMonth) -> String {
    format!(
        "{base_url}?year={}&month={}",
        month.year,
        month.month_number()
    )
}

/// Renders the account book for the month in the query, or the current month.
pub async fn get_book_page(
    State(state): State<BookPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthQuery>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let month = YearMonth::from_query(query, today)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let summary = get_month_summary(user_id, month, &connection)
        .inspect_err(|error| tracing::error!("could not get summary for {}: {error}", month.label()))?;
    let categories = get_all_categories(user_id, &connection)?;

    Ok(book_view(&summary, &categories, today).into_response())
}

fn summary_card(label: &str, amount: f64, data_name: &str) -> Markup {
    html! {
        div
            class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm dark:border-gray-700 dark:bg-gray-800"
            data-summary=(data_name)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p class="text-lg font-semibold tabular-nums" { (format_currency(amount)) }
        }
    }
}

fn book_view(summary: &MonthSummary, categories: &[Category], today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::BOOK_VIEW).into_html();
    let month = summary.month;

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full lg:max-w-6xl space-y-8"
            {
                header class="flex items-center justify-between"
                {
                    a href=(month_url(endpoints::BOOK_VIEW, month.previous())) class=(LINK_STYLE) rel="prev"
                    { "Previous" }
                    h1 class="text-xl font-bold" { (month.label()) }
                    a href=(month_url(endpoints::BOOK_VIEW, month.next())) class=(LINK_STYLE) rel="next"
                    { "Next" }
                }

                section class="grid grid-cols-2 gap-4 md:grid-cols-5"
                {
                    (summary_card("Income", summary.income, "income"))
                    (summary_card("Expense", summary.expense, "expense"))
                    (summary_card("Cash Balance", summary.cash_balance, "cash-balance"))
                    (summary_card("Bank Balance", summary.bank_balance, "bank-balance"))
                    (summary_card("Total Assets", summary.total_assets(), "total-assets"))
                }

                section class="space-y-4"
                {
                    h2 class="text-lg font-semibold" { "Add Cash Transaction" }
                    (cash_form(categories, today))
                }

                section class="space-y-2"
                {
                    div class="flex flex-wrap justify-between items-end gap-4"
                    {
                        h2 class="text-lg font-semibold" { "Transactions" }

                        div class="flex gap-4"
                        {
                            a href=(month_url(endpoints::EXPORT_CSV, month)) class=(LINK_STYLE) download
                            { "Download CSV" }
                            a href=(month_url(endpoints::EXPORT_STATEMENT_VIEW, month)) class=(LINK_STYLE)
                            { "Printable Statement" }
                        }
                    }

                    (entries_table(&summary.entries, month))
                }
            }
        }
    };

    base("Account Book", &[], &content)
}

fn cash_form(categories: &[Category], today: Date) -> Markup {
    html! {
        form
            hx-post=(endpoints::CASH_API)
            hx-target-error="#alert-container"
            class="grid gap-4 md:grid-cols-4"
        {
            div
            {
                label for="side" class=(FORM_LABEL_STYLE) { "Type" }
                select id="side" name="side" required class=(FORM_SELECT_STYLE)
                {
                    option value=(CashSide::Expense.as_str()) { (CashSide::Expense.label()) }
                    option value=(CashSide::Income.as_str()) { (CashSide::Income.label()) }
                }
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                input id="amount" type="number" name="amount" min="0.01" step="0.01" required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                input id="date" type="date" name="date" value=(today) max=(today) required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div { (category_select(categories)) }

            div
            {
                label for="asset_type" class=(FORM_LABEL_STYLE) { "Asset" }
                input id="asset_type" type="text" name="asset_type" value="Cash" list="asset-types"
                    class=(FORM_TEXT_INPUT_STYLE);
                datalist id="asset-types"
                {
                    option value="Cash" {}
                    option value="Card" {}
                }
            }

            div class="md:col-span-2"
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                input id="description" type="text" name="description" class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="memo" class=(FORM_LABEL_STYLE) { "Memo" }
                input id="memo" type="text" name="memo" class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="md:col-span-4"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
            }
        }
    }
}

fn entry_row(entry: &LedgerEntry) -> Markup {
    let amount_style = match entry.kind {
        CategoryKind::Income => INCOME_TEXT_STYLE,
        CategoryKind::Expense => EXPENSE_TEXT_STYLE,
    };

    html! {
        tr class=(TABLE_ROW_STYLE) data-source=(entry.source.label())
        {
            td class="px-4 py-4"
            {
                @if entry.source == LedgerSource::Cash {
                    input type="checkbox" name="ids" value=(entry.id)
                        aria-label="Select transaction";
                }
            }
            td class=(TABLE_CELL_STYLE) { (entry.date) }
            td class=(TABLE_CELL_STYLE) { (entry.source.label()) }
            td class=(TABLE_CELL_STYLE) { (entry.side_label) }
            td class=(TABLE_CELL_STYLE) { (entry.category_name.as_deref().unwrap_or("Uncategorized")) }
            td class=(TABLE_CELL_STYLE) title=(entry.description) { (format_description(&entry.description)) }
            td class=(TABLE_CELL_STYLE) { (entry.asset) }
            td class={ "px-6 py-4 text-right tabular-nums " (amount_style) }
            { (format_currency(entry.signed_amount())) }
        }
    }
}

fn entries_table(entries: &[LedgerEntry], month: YearMonth) -> Markup {
    html! {
        form
            hx-post=(endpoints::CASH_DELETE_API)
            hx-confirm="Delete the selected cash transactions? This cannot be undone."
            hx-target-error="#alert-container"
            class="space-y-2"
        {
            input type="hidden" name="year" value=(month.year);
            input type="hidden" name="month" value=(month.month_number());

            div class="overflow-x-auto"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class="px-4 py-3" {}
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Source" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Asset" }
                            th scope="col" class="px-6 py-3 text-right" { "Amount" }
                        }
                    }

                    tbody
                    {
                        @for entry in entries {
                            (entry_row(entry))
                        }

                        @if entries.is_empty() {
                            tr
                            {
                                td colspan="8" class="px-6 py-4 text-center"
                                { "No transactions this month." }
                            }
                        }
                    }
                }
            }

            @if entries.iter().any(|entry| entry.source == LedgerSource::Cash) {
                button type="submit" class=(BUTTON_DELETE_STYLE) { "Delete selected" }
            }
        }
    }
}
