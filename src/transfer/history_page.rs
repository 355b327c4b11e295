//! The transfer history page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserID,
    account::{Account, get_account_by_number},
    endpoints::{self, format_endpoint},
    html::{
        EXPENSE_TEXT_STYLE, INCOME_TEXT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    transfer::{TransferDetail, get_transfer_history},
};

#[derive(Debug, Clone)]
pub struct TransferHistoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransferHistoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TransferHistoryQuery {
    /// Only show transfers into or out of this account number.
    pub account: Option<String>,
}

/// Renders the user's transfers, newest first.
///
/// Filtering by an account the user does not own gives a 404.
pub async fn get_transfer_history_page(
    State(state): State<TransferHistoryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransferHistoryQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account = match query.account.as_deref().map(str::trim) {
        Some(number) if !number.is_empty() => {
            let account = get_account_by_number(number, &connection)?;
            if account.owner_id != user_id {
                return Err(Error::NotFound);
            }
            Some(account)
        }
        _ => None,
    };

    let transfers =
        get_transfer_history(user_id, account.as_ref().map(|account| account.id), &connection)?;

    Ok(transfer_history_view(&transfers, account.as_ref(), user_id).into_response())
}

/// Whether the transfer leaves the viewed account, or any of the user's accounts.
fn is_outgoing(transfer: &TransferDetail, account: Option<&Account>, user_id: UserID) -> bool {
    match account {
        Some(account) => transfer.from.account_id == account.id,
        None => transfer.is_sent_by(user_id),
    }
}

fn transfer_history_view(
    transfers: &[TransferDetail],
    account: Option<&Account>,
    user_id: UserID,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSFERS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full lg:max-w-5xl space-y-4"
            {
                div class="flex justify-between items-center"
                {
                    h1 class="text-xl font-bold"
                    {
                        "Transfer History"
                        @if let Some(account) = account {
                            " for " (account.number)
                        }
                    }

                    a href=(endpoints::NEW_TRANSFER_VIEW) class=(LINK_STYLE) { "Send Money" }
                }

                @if account.is_some() {
                    a href=(endpoints::TRANSFERS_VIEW) class=(LINK_STYLE) { "Show all accounts" }
                }

                div class="overflow-x-auto"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Direction" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Counterpart" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Memo" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for transfer in transfers {
                                @let outgoing = is_outgoing(transfer, account, user_id);
                                @let counterpart = if outgoing { &transfer.to } else { &transfer.from };

                                tr class=(TABLE_ROW_STYLE) data-transfer-id=(transfer.id)
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a href=(format_endpoint(endpoints::TRANSFER_VIEW, transfer.id)) class=(LINK_STYLE)
                                        { (transfer.created_at.date()) }
                                    }
                                    td class=(TABLE_CELL_STYLE) data-direction
                                    { @if outgoing { "Sent" } @else { "Received" } }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (counterpart.holder_name) " · "
                                        (counterpart.bank.name()) " " (counterpart.account_number)
                                    }
                                    td class=(TABLE_CELL_STYLE) { (transfer.description) }
                                    td
                                        class={
                                            "px-6 py-4 text-right tabular-nums "
                                            @if outgoing { (EXPENSE_TEXT_STYLE) } @else { (INCOME_TEXT_STYLE) }
                                        }
                                    {
                                        @if outgoing { "-" } @else { "+" }
                                        (format_currency(transfer.amount))
                                    }
                                }
                            }

                            @if transfers.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="5" class="px-6 py-4 text-center" { "No transfers yet." }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Transfers", &[], &content)
}
