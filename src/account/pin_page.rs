//! The page and endpoint for changing an account PIN.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, UserID,
    account::{
        Account, AccountId, AccountPin, PinHash, create_page::pin_input, get_account,
        pin::PIN_HASH_COST, update_account_pin,
    },
    endpoints::{self, format_endpoint},
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, LINK_STYLE, base},
    navigation::NavBar,
};

/// The state needed for the PIN page and endpoint.
#[derive(Debug, Clone)]
pub struct AccountPinState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountPinState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn change_pin_view(account: &Account) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();
    let account_url = format_endpoint(endpoints::ACCOUNT_VIEW, account.id);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full space-y-4"
            {
                h1 class="text-xl font-bold" { "Change PIN" }
                p { (account.bank.name()) " " (account.number) }

                form
                    hx-put=(format_endpoint(endpoints::ACCOUNT_PIN_API, account.id))
                    hx-target-error="#alert-container"
                    class="space-y-4"
                {
                    (pin_input("current_pin", "Current PIN"))
                    (pin_input("new_pin", "New PIN"))
                    (pin_input("confirm_pin", "Confirm New PIN"))

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Change PIN" }
                }

                a href=(account_url) class=(LINK_STYLE) { "Back to account" }
            }
        }
    };

    base("Change PIN", &[], &content)
}

/// Renders the form for changing the PIN of an owned account.
pub async fn get_account_pin_page(
    State(state): State<AccountPinState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account = get_account(account_id, user_id, &connection)?;

    Ok(change_pin_view(&account).into_response())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePinForm {
    pub current_pin: String,
    pub new_pin: String,
    pub confirm_pin: String,
}

/// Replace the account PIN after checking the current one.
pub async fn change_account_pin_endpoint(
    State(state): State<AccountPinState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
    Form(form): Form<ChangePinForm>,
) -> Response {
    let new_pin_hash = match AccountPin::confirmed(&form.new_pin, &form.confirm_pin)
        .and_then(|pin| PinHash::new(&pin, PIN_HASH_COST))
    {
        Ok(pin_hash) => pin_hash,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = get_account(account_id, user_id, &connection)
        .and_then(|account| account.pin_hash.verify(&form.current_pin))
        .and_then(|()| update_account_pin(account_id, user_id, &new_pin_hash, &connection));

    match result {
        Ok(()) => {
            tracing::info!("Changed PIN for account {account_id}");
            (
                HxRedirect(format_endpoint(endpoints::ACCOUNT_VIEW, account_id)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod account_pin_tests {
    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        account::{Account, get_account, test_utils::insert_test_account},
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_hx_redirect, assert_valid_html,
            get_shared_test_connection, insert_test_user, must_get_form, parse_html_document,
        },
        user::UserID,
    };

    use super::{AccountPinState, ChangePinForm, change_account_pin_endpoint, get_account_pin_page};

    fn setup() -> (AccountPinState, UserID, Account) {
        let state = AccountPinState {
            db_connection: get_shared_test_connection(),
        };
        let (user, account) = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user("test", &connection);
            let account = insert_test_account(user.id, "110-1", 0.0, &connection);
            (user, account)
        };

        (state, user.id, account)
    }

    fn form(current_pin: &str, new_pin: &str, confirm_pin: &str) -> ChangePinForm {
        ChangePinForm {
            current_pin: current_pin.to_owned(),
            new_pin: new_pin.to_owned(),
            confirm_pin: confirm_pin.to_owned(),
        }
    }

    #[tokio::test]
    async fn page_renders_pin_form() {
        let (state, user_id, account) = setup();

        let response = get_account_pin_page(State(state), Extension(user_id), Path(account.id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::ACCOUNT_PIN_API, account.id),
            "hx-put",
        );
        assert_form_input(&form, "current_pin", "password");
        assert_form_input(&form, "new_pin", "password");
        assert_form_input(&form, "confirm_pin", "password");
    }

    #[tokio::test]
    async fn changes_pin() {
        let (state, user_id, account) = setup();

        let response = change_account_pin_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(account.id),
            Form(form("1234", "9876", "9876")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, &format_endpoint(endpoints::ACCOUNT_VIEW, account.id));
        let updated = get_account(account.id, user_id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(updated.pin_hash.verify("9876").is_ok());
    }

    #[tokio::test]
    async fn wrong_current_pin_is_rejected() {
        let (state, user_id, account) = setup();

        let response = change_account_pin_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(account.id),
            Form(form("0000", "9876", "9876")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let unchanged =
            get_account(account.id, user_id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(unchanged.pin_hash.verify("1234").is_ok());
    }

    #[tokio::test]
    async fn mismatched_new_pin_is_rejected() {
        let (state, user_id, account) = setup();

        let response = change_account_pin_endpoint(
            State(state),
            Extension(user_id),
            Path(account.id),
            Form(form("1234", "9876", "9875")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
