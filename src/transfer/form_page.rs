//! The page for sending money from one of the user's accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserID,
    account::{Account, AccountId, get_accounts, pin_input},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, HeadElement, LINK_STYLE, base, format_currency, loading_spinner,
    },
    navigation::NavBar,
    transfer::MINIMUM_TRANSFER_AMOUNT,
};

#[derive(Debug, Clone)]
pub struct TransferFormState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransferFormState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TransferFormQuery {
    /// The account to preselect as the sender.
    pub from: Option<AccountId>,
}

/// Renders the transfer form. `?from=` preselects the sending account.
pub async fn get_transfer_page(
    State(state): State<TransferFormState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransferFormQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_accounts(user_id, &connection)?;

    Ok(transfer_view(&accounts, query.from).into_response())
}

fn transfer_view(accounts: &[Account], selected: Option<AccountId>) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSFER_VIEW).into_html();
    let head_elements = [HeadElement::ScriptSource(PreEscaped(
        include_str!("recipient_lookup.js").to_owned(),
    ))];

    let body = if accounts.is_empty() {
        html! {
            p
            {
                "You need a bank account to send money. "
                a href=(endpoints::NEW_ACCOUNT_VIEW) class=(LINK_STYLE) { "Open an account" }
            }
        }
    } else {
        transfer_form(accounts, selected)
    };

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full space-y-4"
            {
                h1 class="text-xl font-bold" { "Send Money" }
                (body)
            }
        }
    };

    base("Send Money", &head_elements, &content)
}

fn transfer_form(accounts: &[Account], selected: Option<AccountId>) -> Markup {
    html! {
        form
            hx-post=(endpoints::TRANSFERS_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="from_account_id" class=(FORM_LABEL_STYLE) { "From" }

                select id="from_account_id" name="from_account_id" required class=(FORM_SELECT_STYLE)
                {
                    @for account in accounts {
                        option value=(account.id) selected[Some(account.id) == selected]
                        {
                            (account.bank.name()) " " (account.number)
                            " (" (format_currency(account.balance)) ")"
                        }
                    }
                }
            }

            div
            {
                label for="to_account_number" class=(FORM_LABEL_STYLE) { "Recipient Account Number" }

                input
                    id="to_account_number"
                    type="text"
                    name="to_account_number"
                    data-lookup-url=(endpoints::ACCOUNT_LOOKUP_API)
                    autocomplete="off"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                p id="recipient-info" class="mt-1 text-sm text-gray-600 dark:text-gray-300" {}
            }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    id="amount"
                    type="number"
                    name="amount"
                    min=(MINIMUM_TRANSFER_AMOUNT)
                    step="1"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Memo" }

                input
                    id="description"
                    type="text"
                    name="description"
                    maxlength="100"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (pin_input("pin", "PIN"))

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                " Send"
            }
        }
    }
}
