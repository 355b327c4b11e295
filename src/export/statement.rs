//! A printable monthly statement the browser can save as PDF.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, User, UserID,
    book::{LedgerEntry, LedgerSource, MonthSummary, get_month_summary},
    endpoints,
    get_user_by_id,
    html::{BUTTON_PRIMARY_STYLE, HeadElement, LINK_STYLE, base, format_currency},
    period::{MonthQuery, YearMonth},
    timezone::local_today,
};

const PRINT_STYLE: &str = r#"
@media print {
    .no-print {
        display: none !important;
    }

    body {
        background: white !important;
        color: black !important;
    }

    table {
        page-break-inside: auto;
    }

    tr {
        page-break-inside: avoid;
    }
}
"#;

#[derive(Debug, Clone)]
pub struct StatementState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StatementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the statement for the month in the query, or the current month.
pub async fn get_statement_page(
    State(state): State<StatementState>,
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

    let user = get_user_by_id(user_id, &connection)?;
    let summary = get_month_summary(user_id, month, &connection)?;

    Ok(statement_view(&user, &summary).into_response())
}

fn entries_table(title: &str, id: &str, entries: &[&LedgerEntry]) -> Markup {
    html! {
        section id=(id) class="space-y-2"
        {
            h2 class="text-lg font-semibold" { (title) }

            table class="w-full text-sm border-collapse"
            {
                thead
                {
                    tr class="border-b border-gray-400 text-left"
                    {
                        th scope="col" class="py-1 pr-4" { "Date" }
                        th scope="col" class="py-1 pr-4" { "Type" }
                        th scope="col" class="py-1 pr-4" { "Category" }
                        th scope="col" class="py-1 pr-4" { "Description" }
                        th scope="col" class="py-1 pr-4" { "Asset" }
                        th scope="col" class="py-1 pr-4 text-right" { "Amount" }
                        th scope="col" class="py-1 text-right" { "Balance" }
                    }
                }

                tbody
                {
                    @for entry in entries {
                        tr class="border-b border-gray-200" data-statement-row
                        {
                            td class="py-1 pr-4" { (entry.date) }
                            td class="py-1 pr-4" { (entry.side_label) }
                            td class="py-1 pr-4" { (entry.category_name.as_deref().unwrap_or("")) }
                            td class="py-1 pr-4" { (entry.description) }
                            td class="py-1 pr-4" { (entry.asset) }
                            td class="py-1 pr-4 text-right tabular-nums" { (format_currency(entry.signed_amount())) }
                            td class="py-1 text-right tabular-nums" { (format_currency(entry.balance)) }
                        }
                    }

                    @if entries.is_empty() {
                        tr { td colspan="7" class="py-2 text-center" { "No transactions." } }
                    }
                }
            }
        }
    }
}

fn total_row(label: &str, amount: f64, data_name: &str) -> Markup {
    html! {
        tr data-statement-total=(data_name)
        {
            th scope="row" class="py-1 pr-8 text-left font-normal" { (label) }
            td class="py-1 text-right tabular-nums" { (format_currency(amount)) }
        }
    }
}

fn statement_view(user: &User, summary: &MonthSummary) -> Markup {
    let month = summary.month;
    // Oldest first reads better on paper.
    let (account_rows, cash_rows): (Vec<&LedgerEntry>, Vec<&LedgerEntry>) = summary
        .entries
        .iter()
        .rev()
        .partition(|entry| entry.source == LedgerSource::Account);

    let content = html! {
        main class="mx-auto max-w-4xl px-6 py-8 space-y-8 bg-white text-gray-900"
        {
            div class="no-print flex justify-between items-center"
            {
                a href={ (endpoints::BOOK_VIEW) "?year=" (month.year) "&month=" (month.month_number()) }
                    class=(LINK_STYLE)
                { "Back to account book" }

                div class="w-48"
                {
                    button type="button" onclick="window.print()" class=(BUTTON_PRIMARY_STYLE)
                    { "Print / Save as PDF" }
                }
            }

            header class="space-y-1"
            {
                h1 class="text-2xl font-bold" { "Statement " (month.label()) }
                p data-statement-holder { (user.name) }
                p class="text-sm text-gray-600"
                { (month.first_day()) " to " (month.last_day()) }
            }

            (entries_table("Bank Accounts", "statement-accounts", &account_rows))
            (entries_table("Cash", "statement-cash", &cash_rows))

            section class="space-y-2"
            {
                h2 class="text-lg font-semibold" { "Summary" }

                table class="text-sm"
                {
                    tbody
                    {
                        (total_row("Income", summary.income, "income"))
                        (total_row("Expense", summary.expense, "expense"))
                        (total_row("Net", summary.income - summary.expense, "net"))
                        (total_row("Cash Balance", summary.cash_balance, "cash-balance"))
                        (total_row("Bank Balance", summary.bank_balance, "bank-balance"))
                        (total_row("Total Assets", summary.total_assets(), "total-assets"))
                    }
                }
            }
        }
    };

    base(
        &format!("Statement {}", month.label()),
        &[HeadElement::Style(PreEscaped(PRINT_STYLE.to_owned()))],
        &content,
    )
}

#[cfg(test)]
mod statement_tests {
    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        Error,
        account::test_utils::insert_test_account,
        cash::{CashSide, test_utils::insert_test_cash},
        html::format_currency,
        period::MonthQuery,
        test_utils::{
            assert_valid_html, get_shared_test_connection, insert_test_user, must_select_text,
            parse_html_document,
        },
    };

    use super::{StatementState, get_statement_page};

    fn get_state() -> StatementState {
        StatementState {
            local_timezone: "Asia/Seoul".to_owned(),
            db_connection: get_shared_test_connection(),
        }
    }

    fn month(year: i32, month: u8) -> Query<MonthQuery> {
        Query(MonthQuery {
            year: Some(year),
            month: Some(month),
        })
    }

    #[tokio::test]
    async fn renders_printable_statement() {
        let state = get_state();
        let user = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user("test", &connection);
            insert_test_account(user.id, "110-1", 1_000.0, &connection);
            insert_test_cash(user.id, CashSide::Income, 50.0, date!(2025 - 01 - 03), &connection);
            insert_test_cash(user.id, CashSide::Expense, 20.0, date!(2025 - 01 - 09), &connection);
            user
        };

        let response = get_statement_page(State(state), Extension(user.id), month(2025, 1))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(must_select_text(&html, "h1"), ["Statement 2025-01"]);
        assert_eq!(must_select_text(&html, "[data-statement-holder]"), ["test name"]);
        let account_rows = html
            .select(&Selector::parse("#statement-accounts tr[data-statement-row]").unwrap())
            .count();
        assert_eq!(account_rows, 1);
        let cash_dates: Vec<String> = html
            .select(&Selector::parse("#statement-cash tr[data-statement-row] td:first-child").unwrap())
            .map(|cell| cell.text().collect())
            .collect();
        assert_eq!(cash_dates, ["2025-01-03", "2025-01-09"]);
        assert_eq!(
            must_select_text(&html, "[data-statement-total='total-assets'] td"),
            [format_currency(1_030.0)]
        );
        let print_button = html
            .select(&Selector::parse("button[onclick='window.print()']").unwrap())
            .next()
            .unwrap();
        assert_eq!(print_button.text().collect::<String>(), "Print / Save as PDF");
        let styles: String = html
            .select(&Selector::parse("style").unwrap())
            .map(|style| style.inner_html())
            .collect();
        assert!(styles.contains("@media print"));
    }

    #[tokio::test]
    async fn invalid_month_is_an_error() {
        let state = get_state();
        let user = insert_test_user("test", &state.db_connection.lock().unwrap());

        let result = get_statement_page(State(state), Extension(user.id), month(2025, 0)).await;

        assert_eq!(result.err(), Some(Error::InvalidMonth(2025, 0)));
    }
}
