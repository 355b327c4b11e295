//! Displays the user's bank accounts and their total balance.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    account::{Account, get_accounts, get_total_account_balance},
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, delete_action_link, format_currency,
    },
    navigation::NavBar,
};

/// The state needed for the [get_accounts_page](crate::account::get_accounts_page) route handler.
#[derive(Debug, Clone)]
pub struct AccountsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn accounts_view(accounts: &[Account], total_assets: f64) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let table_row = |account: &Account| {
        let detail_url = format_endpoint(endpoints::ACCOUNT_VIEW, account.id);
        let delete_url = format_endpoint(endpoints::DELETE_ACCOUNT, account.id);

        html!(
            tr class=(TABLE_ROW_STYLE) data-account-id=(account.id)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (account.bank.name())
                }

                td class=(TABLE_CELL_STYLE)
                {
                    a href=(detail_url) class=(LINK_STYLE) { (account.number) }
                }

                td class="px-6 py-4 text-right tabular-nums"
                {
                    (format_currency(account.balance))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(account.created_at) { (account.created_at) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (delete_action_link(
                        &delete_url,
                        &format!(
                            "Are you sure you want to delete the account {}? \
                            Its transactions will be deleted too. This cannot be undone.",
                            account.number
                        ),
                        "closest tr",
                        "delete",
                    ))
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Accounts" }

                    a href=(endpoints::NEW_ACCOUNT_VIEW) class=(LINK_STYLE)
                    {
                        "Open Account"
                    }
                }

                p class="text-lg" data-total-assets
                {
                    "Total assets: "
                    span class="font-semibold tabular-nums" { (format_currency(total_assets)) }
                }

                div class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Bank" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Number" }
                                th scope="col" class="px-6 py-3 text-right" { "Balance" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Opened" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                (table_row(account))
                            }

                            @if accounts.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No accounts found. Open an account "
                                        a href=(endpoints::NEW_ACCOUNT_VIEW) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Accounts", &[], &content)
}

/// Renders the accounts page showing the user's accounts.
pub async fn get_accounts_page(
    State(state): State<AccountsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_accounts(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?;
    let total_assets = get_total_account_balance(user_id, &connection)?;

    Ok(accounts_view(&accounts, total_assets).into_response())
}
