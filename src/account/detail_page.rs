//! The detail page for one bank account: its ledger, statistics and a form
//! for recording deposits and withdrawals.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error, UserID,
    account::{Account, AccountId, get_account},
    account_ledger::{
        AccountSide, AccountTransaction, MonthlyStatistics, get_account_transactions,
        get_monthly_statistics,
    },
    category::{Category, CategoryId, category_select, get_all_categories},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, EXPENSE_TEXT_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, INCOME_TEXT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
        format_description,
    },
    navigation::NavBar,
    period::YearMonth,
    timezone::local_today,
};

/// The number of months shown in the statistics table, including the current one.
const STATISTICS_MONTHS: u32 = 6;

#[derive(Debug, Clone)]
pub struct AccountDetailState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountDetailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the account detail page. Accounts owned by other users are not found.
pub async fn get_account_detail_page(
    State(state): State<AccountDetailState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account = get_account(account_id, user_id, &connection)?;
    let transactions = get_account_transactions(account.id, &connection)
        .inspect_err(|error| tracing::error!("could not get ledger for {account_id}: {error}"))?;
    let statistics_from = YearMonth::containing(today)
        .months_before(STATISTICS_MONTHS - 1)
        .first_day();
    let statistics = get_monthly_statistics(account.id, statistics_from, &connection)?;
    let categories = get_all_categories(user_id, &connection)?;

    Ok(account_detail_view(&account, &transactions, &statistics, &categories, today).into_response())
}

fn account_detail_view(
    account: &Account,
    transactions: &[AccountTransaction],
    statistics: &[MonthlyStatistics],
    categories: &[Category],
    today: Date,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();
    let category_name = |category_id: Option<CategoryId>| {
        categories
            .iter()
            .find(|category| Some(category.id) == category_id)
            .map(|category| category.name.as_ref().to_owned())
    };

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full lg:max-w-5xl space-y-8"
            {
                section id="account-info" class="space-y-2"
                {
                    h1 class="text-xl font-bold" { (account.bank.name()) " " (account.number) }

                    p { "Balance: " span class="font-semibold tabular-nums" data-balance { (format_currency(account.balance)) } }
                    p class="text-sm text-gray-500 dark:text-gray-400" { "Opened " (account.created_at) }

                    div class="flex gap-4"
                    {
                        a href=(format_endpoint(endpoints::ACCOUNT_PIN_VIEW, account.id)) class=(LINK_STYLE)
                        { "Change PIN" }
                        a href={ (endpoints::NEW_TRANSFER_VIEW) "?from=" (account.id) } class=(LINK_STYLE)
                        { "Transfer" }
                        a href={ (endpoints::TRANSFERS_VIEW) "?account=" (account.number) } class=(LINK_STYLE)
                        { "Transfer History" }
                    }
                }

                section class="space-y-4"
                {
                    h2 class="text-lg font-semibold" { "Record a Transaction" }
                    (record_form(account.id, categories, today))
                }

                section id="statistics" class="space-y-2"
                {
                    h2 class="text-lg font-semibold" { "Last " (STATISTICS_MONTHS) " Months" }
                    (statistics_table(statistics))
                }

                section id="ledger" class="space-y-2"
                {
                    h2 class="text-lg font-semibold" { "Transactions" }

                    div class="overflow-x-auto"
                    {
                        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                    th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                    th scope="col" class="px-6 py-3 text-right" { "Balance" }
                                }
                            }

                            tbody
                            {
                                @for transaction in transactions {
                                    tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
                                    {
                                        td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                        td class=(TABLE_CELL_STYLE) title=(transaction.description)
                                        { (format_description(&transaction.description)) }
                                        td class=(TABLE_CELL_STYLE)
                                        { (category_name(transaction.category_id).unwrap_or_default()) }
                                        (amount_cell(transaction.side, transaction.amount))
                                        td class="px-6 py-4 text-right tabular-nums"
                                        { (format_currency(transaction.balance)) }
                                    }
                                }

                                @if transactions.is_empty() {
                                    tr
                                    {
                                        td colspan="5" class="px-6 py-4 text-center"
                                        { "No transactions yet." }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Account", &[], &content)
}

/// A right aligned amount, signed and coloured by `side`.
fn amount_cell(side: AccountSide, amount: f64) -> Markup {
    let (style, signed_amount) = match side {
        AccountSide::Deposit => (INCOME_TEXT_STYLE, amount),
        AccountSide::Withdrawal => (EXPENSE_TEXT_STYLE, -amount),
    };

    html! {
        td class={ "px-6 py-4 text-right tabular-nums " (style) }
        { (format_currency(signed_amount)) }
    }
}

fn record_form(account_id: AccountId, categories: &[Category], today: Date) -> Markup {
    html! {
        form
            hx-post=(format_endpoint(endpoints::ACCOUNT_TRANSACTIONS_API, account_id))
            hx-target-error="#alert-container"
            class="grid gap-4 md:grid-cols-2"
        {
            div
            {
                label for="side" class=(FORM_LABEL_STYLE) { "Type" }
                select id="side" name="side" required class=(FORM_SELECT_STYLE)
                {
                    option value=(AccountSide::Deposit.as_str()) { (AccountSide::Deposit.label()) }
                    option value=(AccountSide::Withdrawal.as_str()) { (AccountSide::Withdrawal.label()) }
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

            div
            {
                (category_select(categories))
            }

            div class="md:col-span-2"
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                input id="description" type="text" name="description" class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="md:col-span-2"
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Record" }
            }
        }
    }
}

fn statistics_table(statistics: &[MonthlyStatistics]) -> Markup {
    html! {
        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Month" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                    th scope="col" class="px-6 py-3 text-right" { "Deposits" }
                    th scope="col" class="px-6 py-3 text-right" { "Withdrawals" }
                }
            }

            tbody
            {
                @for month in statistics {
                    tr class=(TABLE_ROW_STYLE)
                    {
                        td class=(TABLE_CELL_STYLE) { (month.year) "-" (format!("{:02}", month.month)) }
                        td class=(TABLE_CELL_STYLE) { (month.transaction_count) }
                        td class={ "px-6 py-4 text-right " (INCOME_TEXT_STYLE) } { (format_currency(month.deposits)) }
                        td class={ "px-6 py-4 text-right " (EXPENSE_TEXT_STYLE) } { (format_currency(month.withdrawals)) }
                    }
                }

                @if statistics.is_empty() {
                    tr { td colspan="4" class="px-6 py-4 text-center" { "No activity in this period." } }
                }
            }
        }
    }
}
