//! The page and endpoint for registering a brokerage account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, UserID,
    account::{AccountPin, PIN_HASH_COST, PinHash, pin_input},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
    stock::{NewStockAccount, create_stock_account},
    timezone::local_today,
};

/// Brokerages offered in the form.
pub const STOCK_COMPANIES: [&str; 6] = [
    "Mirae Asset Securities",
    "Samsung Securities",
    "Kiwoom Securities",
    "Korea Investment & Securities",
    "NH Investment & Securities",
    "KB Securities",
];

fn create_stock_account_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_STOCK_ACCOUNT_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full space-y-4"
            {
                h1 class="text-xl font-bold" { "Add Stock Account" }

                form
                    hx-post=(endpoints::STOCK_ACCOUNTS_API)
                    hx-indicator="#indicator"
                    hx-disabled-elt="#submit-button"
                    hx-target-error="#alert-container"
                    class="w-full space-y-4 md:space-y-6"
                {
                    div
                    {
                        label for="company" class=(FORM_LABEL_STYLE) { "Brokerage" }

                        select id="company" name="company" required class=(FORM_SELECT_STYLE)
                        {
                            @for company in STOCK_COMPANIES {
                                option value=(company) { (company) }
                            }
                        }
                    }

                    div
                    {
                        label for="number" class=(FORM_LABEL_STYLE) { "Account Number" }

                        input
                            id="number"
                            type="text"
                            name="number"
                            required
                            autofocus
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    (pin_input("pin", "PIN"))
                    (pin_input("confirm_pin", "Confirm PIN"))

                    button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                        " Add Account"
                    }
                }
            }
        }
    };

    base("Add Stock Account", &[], &content)
}

/// Renders the form for registering a brokerage account.
pub async fn get_create_stock_account_page() -> Response {
    create_stock_account_view().into_response()
}

#[derive(Debug, Clone)]
pub struct CreateStockAccountState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateStockAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAccountForm {
    pub company: String,
    pub number: String,
    pub pin: String,
    pub confirm_pin: String,
}

/// Register a brokerage account and redirect to the stocks page.
pub async fn create_stock_account_endpoint(
    State(state): State<CreateStockAccountState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<StockAccountForm>,
) -> Response {
    let new_account = match validate_form(form, user_id, &state.local_timezone) {
        Ok(new_account) => new_account,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_stock_account(new_account, &connection) {
        Ok(account) => {
            tracing::info!("Added stock account {} for user {user_id}", account.id);
            (
                HxRedirect(endpoints::STOCKS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn validate_form(
    form: StockAccountForm,
    owner_id: UserID,
    local_timezone: &str,
) -> Result<NewStockAccount, Error> {
    let pin = AccountPin::confirmed(&form.pin, &form.confirm_pin)?;

    Ok(NewStockAccount {
        owner_id,
        company: form.company,
        number: form.number,
        pin_hash: PinHash::new(&pin, PIN_HASH_COST)?,
        created_at: local_today(local_timezone)?,
    })
}
