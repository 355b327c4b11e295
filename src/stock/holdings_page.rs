//! The stock holdings page with current valuations.

use std::{
    collections::BTreeMap,
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
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, EXPENSE_TEXT_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        INCOME_TEXT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, delete_action_link, format_currency,
        format_currency_rounded,
    },
    navigation::NavBar,
    stock::{
        Currency, CurrencyTotals, HoldingValuation, StockAccount, StoredQuotes, get_holdings,
        get_stock_accounts, totals_by_currency, value_holdings,
    },
};

#[derive(Debug, Clone)]
pub struct StocksPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StocksPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the user's brokerage accounts and holdings.
pub async fn get_stocks_page(
    State(state): State<StocksPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_stock_accounts(user_id, &connection)?;
    let holdings = get_holdings(user_id, &connection)?;
    let valuations = value_holdings(holdings, &StoredQuotes::new(&connection))
        .inspect_err(|error| tracing::error!("could not value holdings: {error}"))?;
    let totals = totals_by_currency(&valuations);

    Ok(stocks_view(&accounts, &valuations, &totals).into_response())
}

/// Won amounts have no minor unit.
pub(crate) fn format_money(amount: f64, currency: Currency) -> String {
    match currency {
        Currency::Krw => format_currency_rounded(amount).replacen('$', "₩", 1),
        Currency::Usd => format_currency(amount),
    }
}

fn rate_cell(rate: f64) -> Markup {
    let style = if rate < 0.0 {
        EXPENSE_TEXT_STYLE
    } else {
        INCOME_TEXT_STYLE
    };

    html! {
        span class=(style) { (format!("{rate:+.2}%")) }
    }
}

fn holdings_table(valuations: &[HoldingValuation]) -> Markup {
    html! {
        div class="overflow-x-auto"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Ticker" }
                        th scope="col" class="px-6 py-3 text-right" { "Shares" }
                        th scope="col" class="px-6 py-3 text-right" { "Avg. Price" }
                        th scope="col" class="px-6 py-3 text-right" { "Current Price" }
                        th scope="col" class="px-6 py-3 text-right" { "Value" }
                        th scope="col" class="px-6 py-3 text-right" { "Return" }
                        th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                    }
                }

                tbody
                {
                    @for valuation in valuations {
                        @let holding = &valuation.row.holding;

                        tr class=(TABLE_ROW_STYLE) data-holding-id=(holding.id)
                        {
                            td class=(TABLE_CELL_STYLE)
                            { (valuation.row.company) " " (valuation.row.account_number) }
                            th scope="row" class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                            { (holding.ticker) " " span class="text-xs" { (holding.currency) } }
                            td class="px-6 py-4 text-right tabular-nums" { (holding.shares) }
                            td class="px-6 py-4 text-right tabular-nums"
                            { (format_money(holding.purchase_price, holding.currency)) }

                            @match (valuation.current_price, valuation.current_value(), valuation.profit_rate()) {
                                (Some(price), Some(value), Some(rate)) => {
                                    td class="px-6 py-4 text-right tabular-nums"
                                    { (format_money(price, holding.currency)) }
                                    td class="px-6 py-4 text-right tabular-nums" data-value
                                    { (format_money(value, holding.currency)) }
                                    td class="px-6 py-4 text-right tabular-nums" data-profit-rate
                                    { (rate_cell(rate)) }
                                }
                                _ => {
                                    td colspan="3" class="px-6 py-4 text-right italic" data-no-quote
                                    { "No quote" }
                                }
                            }

                            td class=(TABLE_CELL_STYLE)
                            {
                                (delete_action_link(
                                    &format_endpoint(endpoints::DELETE_STOCK_HOLDING, holding.id),
                                    &format!("Are you sure you want to delete the {} holding?", holding.ticker),
                                    "closest tr",
                                    "delete",
                                ))
                            }
                        }
                    }

                    @if valuations.is_empty() {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td colspan="8" class="px-6 py-4 text-center"
                            {
                                "No holdings yet. "
                                a href=(endpoints::NEW_STOCK_HOLDING_VIEW) class=(LINK_STYLE) { "Add a holding" }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn totals_section(totals: &BTreeMap<Currency, CurrencyTotals>) -> Markup {
    html! {
        div class="grid gap-4 md:grid-cols-2"
        {
            @for (currency, total) in totals {
                div
                    class="p-4 rounded bg-white dark:bg-gray-800 shadow space-y-1"
                    data-currency-total=(currency.as_str())
                {
                    h3 class="font-semibold" { (currency) }
                    p { "Purchase amount: " span data-purchase { (format_money(total.purchase_amount, *currency)) } }
                    p { "Current value: " span data-current { (format_money(total.current_value, *currency)) } }
                    p { "Profit/loss: " span data-profit { (format_money(total.profit(), *currency)) } }
                    p { "Return: " (rate_cell(total.profit_rate())) }
                }
            }
        }
    }
}

fn quote_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::STOCK_QUOTES_API)
            hx-target-error="#alert-container"
            class="flex flex-wrap items-end gap-4"
        {
            div
            {
                label for="quote-ticker" class=(FORM_LABEL_STYLE) { "Ticker" }
                input id="quote-ticker" type="text" name="ticker" required class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="quote-price" class=(FORM_LABEL_STYLE) { "Price" }
                input id="quote-price" type="number" name="price" min="0" step="any" required class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Quote" }
            }
        }
    }
}

fn stocks_view(
    accounts: &[StockAccount],
    valuations: &[HoldingValuation],
    totals: &BTreeMap<Currency, CurrencyTotals>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::STOCKS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full lg:max-w-6xl space-y-8"
            {
                div class="flex justify-between items-center"
                {
                    h1 class="text-xl font-bold" { "Stocks" }

                    div class="flex gap-4"
                    {
                        a href=(endpoints::NEW_STOCK_ACCOUNT_VIEW) class=(LINK_STYLE) { "Add Stock Account" }
                        a href=(endpoints::NEW_STOCK_HOLDING_VIEW) class=(LINK_STYLE) { "Add Holding" }
                    }
                }

                section id="stock-accounts" class="space-y-2"
                {
                    h2 class="text-lg font-semibold" { "Accounts" }

                    @if accounts.is_empty() {
                        p { "No stock accounts yet." }
                    } @else {
                        ul class="list-disc pl-6"
                        {
                            @for account in accounts {
                                li data-stock-account-id=(account.id) { (account.company) " " (account.number) }
                            }
                        }
                    }
                }

                section id="totals" class="space-y-2"
                {
                    h2 class="text-lg font-semibold" { "Totals" }
                    (totals_section(totals))
                }

                section id="holdings" class="space-y-2"
                {
                    h2 class="text-lg font-semibold" { "Holdings" }
                    (holdings_table(valuations))
                }

                section id="quotes" class="space-y-2"
                {
                    h2 class="text-lg font-semibold" { "Record a Quote" }
                    (quote_form())
                }
            }
        }
    };

    base("Stocks", &[], &content)
}
