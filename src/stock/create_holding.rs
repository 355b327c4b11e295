//! The page and endpoint for adding a stock holding.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, UserID,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
    stock::{
        Currency, NewStockHolding, StockAccount, StockAccountId, add_stock_holding,
        get_stock_accounts,
    },
    timezone::local_today,
};

#[derive(Debug, Clone)]
pub struct StockHoldingState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StockHoldingState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the holding form, or redirects to the stock account form when
/// the user has nowhere to put a holding.
pub async fn get_create_holding_page(
    State(state): State<StockHoldingState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_stock_accounts(user_id, &connection)?;

    if accounts.is_empty() {
        return Ok(Redirect::to(endpoints::NEW_STOCK_ACCOUNT_VIEW).into_response());
    }

    Ok(create_holding_view(&accounts).into_response())
}

fn create_holding_view(accounts: &[StockAccount]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_STOCK_HOLDING_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full space-y-4"
            {
                h1 class="text-xl font-bold" { "Add Holding" }

                form
                    hx-post=(endpoints::STOCK_HOLDINGS_API)
                    hx-indicator="#indicator"
                    hx-disabled-elt="#submit-button"
                    hx-target-error="#alert-container"
                    class="w-full space-y-4 md:space-y-6"
                {
                    div
                    {
                        label for="stock_account_id" class=(FORM_LABEL_STYLE) { "Account" }

                        select id="stock_account_id" name="stock_account_id" required class=(FORM_SELECT_STYLE)
                        {
                            @for account in accounts {
                                option value=(account.id) { (account.company) " " (account.number) }
                            }
                        }
                    }

                    div
                    {
                        label for="ticker" class=(FORM_LABEL_STYLE) { "Ticker" }

                        input
                            id="ticker"
                            type="text"
                            name="ticker"
                            placeholder="005930 or AAPL"
                            required
                            autofocus
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="currency" class=(FORM_LABEL_STYLE) { "Currency" }

                        select id="currency" name="currency" required class=(FORM_SELECT_STYLE)
                        {
                            @for currency in Currency::ALL {
                                option value=(currency.as_str()) { (currency) }
                            }
                        }
                    }

                    div
                    {
                        label for="purchase_price" class=(FORM_LABEL_STYLE) { "Purchase Price" }

                        input
                            id="purchase_price"
                            type="number"
                            name="purchase_price"
                            min="0"
                            step="any"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="shares" class=(FORM_LABEL_STYLE) { "Shares" }

                        input
                            id="shares"
                            type="number"
                            name="shares"
                            min="0"
                            step="any"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                        " Add Holding"
                    }
                }
            }
        }
    };

    base("Add Holding", &[], &content)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockHoldingForm {
    pub stock_account_id: StockAccountId,
    pub ticker: String,
    pub currency: Currency,
    pub purchase_price: f64,
    pub shares: f64,
}

/// Add shares to a holding and redirect to the stocks page.
pub async fn create_holding_endpoint(
    State(state): State<StockHoldingState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<StockHoldingForm>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_holding = NewStockHolding {
        stock_account_id: form.stock_account_id,
        ticker: form.ticker,
        purchase_price: form.purchase_price,
        shares: form.shares,
        currency: form.currency,
        created_at: today,
    };

    match add_stock_holding(user_id, new_holding, &connection) {
        Ok(holding) => {
            tracing::info!(
                "Holding {} now has {} shares of {}",
                holding.id,
                holding.shares,
                holding.ticker
            );
            (
                HxRedirect(endpoints::STOCKS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod create_holding_tests {
    use axum::{Extension, Form, extract::State, http::StatusCode};

    use crate::{
        endpoints,
        stock::{Currency, get_holdings, test_utils::insert_test_stock_account},
        test_utils::{
            assert_form_input, assert_form_select, assert_hx_endpoint, assert_hx_redirect,
            assert_status, assert_valid_html, get_header, get_shared_test_connection,
            insert_test_user, must_get_form, parse_html_document,
        },
    };

    use super::{
        StockHoldingForm, StockHoldingState, create_holding_endpoint, get_create_holding_page,
    };

    fn get_state() -> StockHoldingState {
        StockHoldingState {
            local_timezone: "Asia/Seoul".to_owned(),
            db_connection: get_shared_test_connection(),
        }
    }

    #[tokio::test]
    async fn redirects_to_stock_account_form_without_accounts() {
        let state = get_state();
        let user = insert_test_user("investor", &state.db_connection.lock().unwrap());

        let response = get_create_holding_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_status(&response, StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, "location"), endpoints::NEW_STOCK_ACCOUNT_VIEW);
    }

    #[tokio::test]
    async fn renders_form_with_accounts() {
        let state = get_state();
        let user = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user("investor", &connection);
            insert_test_stock_account(user.id, "900-1", &connection);
            user
        };

        let response = get_create_holding_page(State(state), Extension(user.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::STOCK_HOLDINGS_API, "hx-post");
        assert_form_select(&form, "stock_account_id", &["Mirae Asset 900-1"]);
        assert_form_select(&form, "currency", &["KRW", "USD"]);
        assert_form_input(&form, "ticker", "text");
        assert_form_input(&form, "purchase_price", "number");
        assert_form_input(&form, "shares", "number");
    }

    #[tokio::test]
    async fn adds_holding_and_rejects_currency_mismatch() {
        let state = get_state();
        let (user, account) = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user("investor", &connection);
            let account = insert_test_stock_account(user.id, "900-1", &connection);
            (user, account)
        };
        let form = |currency| StockHoldingForm {
            stock_account_id: account.id,
            ticker: "005930".to_owned(),
            currency,
            purchase_price: 70_000.0,
            shares: 3.0,
        };

        let response = create_holding_endpoint(
            State(state.clone()),
            Extension(user.id),
            Form(form(Currency::Usd)),
        )
        .await;
        assert_status(&response, StatusCode::BAD_REQUEST);

        let response = create_holding_endpoint(
            State(state.clone()),
            Extension(user.id),
            Form(form(Currency::Krw)),
        )
        .await;
        assert_hx_redirect(&response, endpoints::STOCKS_VIEW);

        let holdings = get_holdings(user.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].holding.currency, Currency::Krw);
    }
}
