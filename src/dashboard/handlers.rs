//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The route handler for displaying the dashboard
//! - HTML view functions for rendering the dashboard UI
//! - State and query types used by the handler

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use time::{Date, macros::format_description};

use crate::{
    AppState, Error, UserID,
    book::get_ledger_entries,
    category::CategoryKind,
    dashboard::{
        aggregation::{
            calculate_totals, expense_by_category, monthly_totals, recent_of_kind,
            reportable_entries,
        },
        charts::{DashboardChart, category_chart, charts_script, charts_view, monthly_chart},
        tables::{category_table, monthly_table, recent_table, summary_table},
    },
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, base, link},
    navigation::NavBar,
    period::YearMonth,
    timezone::local_today,
};

/// The number of rows in the recent income and expense tables.
const RECENT_ROWS: usize = 10;

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading both ledgers.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Seoul".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The optional date range. Blank or malformed dates fall back to the
/// current month.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn parse_date(text: Option<&str>) -> Option<Date> {
    text.and_then(|text| Date::parse(text.trim(), format_description!("[year]-[month]-[day]")).ok())
}

/// Resolve the inclusive date range to report on.
///
/// # Errors
///
/// Returns [Error::InvalidDateRange] if the end is before the start.
fn resolve_range(query: &DashboardQuery, today: Date) -> Result<(Date, Date), Error> {
    let month = YearMonth::containing(today);
    let start = parse_date(query.start_date.as_deref()).unwrap_or_else(|| month.first_day());
    let end = parse_date(query.end_date.as_deref()).unwrap_or_else(|| month.last_day());

    if end < start {
        return Err(Error::InvalidDateRange(start, end));
    }

    Ok((start, end))
}

/// Display a page with an overview of the user's income and expenses.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let (start, end) = resolve_range(&query, today)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entries = get_ledger_entries(user_id, start, end, &connection)
        .inspect_err(|error| tracing::error!("could not get ledger entries: {error}"))?;
    let entries = reportable_entries(entries);

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    if entries.is_empty() {
        return Ok(dashboard_no_data_view(nav_bar, start, end).into_response());
    }

    let totals = calculate_totals(&entries);
    let categories = expense_by_category(&entries);
    let series = monthly_totals(&entries, start, end);

    let charts = [
        DashboardChart::new("monthly-chart", monthly_chart(&series)),
        DashboardChart::new("category-chart", category_chart(&categories)),
    ];
    let tables = [
        summary_table(&totals),
        category_table(&categories),
        monthly_table(&series),
        recent_table(
            "recent-income",
            "Recent Income",
            &recent_of_kind(&entries, CategoryKind::Income, RECENT_ROWS),
        ),
        recent_table(
            "recent-expenses",
            "Recent Expenses",
            &recent_of_kind(&entries, CategoryKind::Expense, RECENT_ROWS),
        ),
    ];

    Ok(dashboard_view(nav_bar, start, end, &charts, &tables).into_response())
}

fn range_form(start: Date, end: Date) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::DASHBOARD_VIEW)
            class="flex flex-wrap items-end gap-4 mb-6"
        {
            div
            {
                label for="start_date" class=(FORM_LABEL_STYLE) { "From" }
                input id="start_date" type="date" name="start_date" value=(start) required class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end_date" class=(FORM_LABEL_STYLE) { "To" }
                input id="end_date" type="date" name="end_date" value=(end) required class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply" }
            }
        }
    }
}

/// Renders the dashboard page when there is nothing in the range.
fn dashboard_no_data_view(nav_bar: NavBar, start: Date, end: Date) -> Markup {
    let nav_bar = nav_bar.into_html();
    let book_link = link(endpoints::BOOK_VIEW, "account book");
    let accounts_link = link(endpoints::ACCOUNTS_VIEW, "bank accounts");

    let content = html!(
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            (range_form(start, end))

            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Charts will show up here once you record some transactions.
                You can record cash in the " (book_link) " or deposits and
                withdrawals on your " (accounts_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

/// Renders the main dashboard page with charts and tables.
fn dashboard_view(
    nav_bar: NavBar,
    start: Date,
    end: Date,
    charts: &[DashboardChart],
    tables: &[Markup],
) -> Markup {
    let nav_bar = nav_bar.into_html();

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (range_form(start, end))

            (charts_view(charts))

            section id="tables" class="w-full grid grid-cols-1 xl:grid-cols-2 gap-4 mb-8"
            {
                @for table in tables {
                    (table)
                }
            }
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(charts),
    ];

    base("Dashboard", &scripts, &content)
}

#[cfg(test)]
mod dashboard_tests {
    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use scraper::Selector;
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{
        Error,
        account::test_utils::insert_test_account,
        cash::{CashSide, test_utils::insert_test_cash},
        test_utils::{
            assert_valid_html, get_shared_test_connection, insert_test_user, must_select_text,
            parse_html_document,
        },
        transfer::{TransferRequest, create_transfer},
    };

    use super::{DashboardQuery, DashboardState, get_dashboard_page, resolve_range};

    fn get_state() -> DashboardState {
        DashboardState {
            db_connection: get_shared_test_connection(),
            local_timezone: "Asia/Seoul".to_owned(),
        }
    }

    fn range(start: &str, end: &str) -> DashboardQuery {
        DashboardQuery {
            start_date: Some(start.to_owned()),
            end_date: Some(end.to_owned()),
        }
    }

    #[test]
    fn range_defaults_to_current_month() {
        let today = date!(2025 - 02 - 14);

        assert_eq!(
            resolve_range(&DashboardQuery::default(), today),
            Ok((date!(2025 - 02 - 01), date!(2025 - 02 - 28)))
        );
        assert_eq!(
            resolve_range(&range("", "garbage"), today),
            Ok((date!(2025 - 02 - 01), date!(2025 - 02 - 28)))
        );
        assert_eq!(
            resolve_range(&range("2025-01-10", "2025-01-20"), today),
            Ok((date!(2025 - 01 - 10), date!(2025 - 01 - 20)))
        );
    }

    #[tokio::test]
    async fn end_before_start_is_bad_request() {
        let state = get_state();
        let user = insert_test_user("test", &state.db_connection.lock().unwrap());

        let result = get_dashboard_page(
            State(state),
            Extension(user.id),
            Query(range("2025-03-10", "2025-03-01")),
        )
        .await;

        let error = result.unwrap_err();
        assert_eq!(
            error,
            Error::InvalidDateRange(date!(2025 - 03 - 10), date!(2025 - 03 - 01))
        );
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn shows_empty_state_without_entries() {
        let state = get_state();
        let user = insert_test_user("test", &state.db_connection.lock().unwrap());

        let response = get_dashboard_page(
            State(state),
            Extension(user.id),
            Query(range("2024-01-01", "2024-01-31")),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(must_select_text(&html, "h2"), ["Nothing here yet..."]);
    }

    #[tokio::test]
    async fn totals_exclude_own_account_transfers() {
        let state = get_state();
        let today = OffsetDateTime::now_utc().date();
        let user = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user("test", &connection);
            let main = insert_test_account(user.id, "110-1", 1_000.0, &connection);
            insert_test_account(user.id, "110-2", 0.0, &connection);
            create_transfer(
                user.id,
                TransferRequest {
                    from_account_id: main.id,
                    pin: "1234".to_owned(),
                    to_account_number: "110-2".to_owned(),
                    amount: 400.0,
                    description: String::new(),
                },
                OffsetDateTime::now_utc(),
                &connection,
            )
            .unwrap();
            insert_test_cash(user.id, CashSide::Income, 250.0, today, &connection);
            insert_test_cash(user.id, CashSide::Expense, 75.0, today, &connection);
            user
        };

        let query = range(
            &(today - Duration::days(1)).to_string(),
            &today.to_string(),
        );
        let response = get_dashboard_page(State(state), Extension(user.id), Query(query))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(must_select_text(&html, "[data-total=income]"), ["$250.00"]);
        assert_eq!(must_select_text(&html, "[data-total=expense]"), ["$75.00"]);
        assert_eq!(must_select_text(&html, "[data-total=net]"), ["$175.00"]);
        assert_eq!(
            must_select_text(&html, "#expense-categories th[scope=row]"),
            ["Uncategorized"]
        );
        for id in ["#monthly-chart", "#category-chart"] {
            assert!(html.select(&Selector::parse(id).unwrap()).next().is_some());
        }
    }
}
