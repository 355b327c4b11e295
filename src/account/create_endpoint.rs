//! Defines the endpoint for opening a new bank account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, UserID,
    account::{
        AccountPin, Bank, NewAccount, PinHash, create_account, pin::PIN_HASH_COST,
        validate_account_number,
    },
    endpoints,
    timezone::local_today,
};

/// The state needed to open an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for opening an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountForm {
    pub bank: Bank,
    pub number: String,
    pub pin: String,
    pub confirm_pin: String,
    #[serde(default)]
    pub initial_balance: f64,
}

/// A route handler for opening a new account, redirects to the accounts page on success.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<AccountForm>,
) -> Response {
    let new_account = match validate_form(&form, user_id, &state.local_timezone) {
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

    match create_account(new_account, &connection) {
        Ok(account) => {
            tracing::info!("Opened account {} for user {user_id}", account.id);
            (
                HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not open account {}: {error}", form.number);
            error.into_alert_response()
        }
    }
}

fn validate_form(
    form: &AccountForm,
    owner_id: UserID,
    local_timezone: &str,
) -> Result<NewAccount, Error> {
    let number = validate_account_number(&form.number)?;
    let pin = AccountPin::confirmed(&form.pin, &form.confirm_pin)?;
    let pin_hash = PinHash::new(&pin, PIN_HASH_COST)?;

    Ok(NewAccount {
        owner_id,
        bank: form.bank,
        number,
        pin_hash,
        initial_balance: form.initial_balance,
        created_at: local_today(local_timezone)?,
    })
}
