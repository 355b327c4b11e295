//! The endpoint that sends a transfer.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, UserID,
    account::AccountId,
    endpoints::{self, format_endpoint},
    timezone::local_now,
    transfer::{TransferRequest, create_transfer},
};

#[derive(Debug, Clone)]
pub struct TransferState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransferState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferForm {
    pub from_account_id: AccountId,
    pub to_account_number: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    pub pin: String,
}

/// Send money and redirect to the transfer's confirmation page.
pub async fn create_transfer_endpoint(
    State(state): State<TransferState>,
    Extension(user_id): Extension<UserID>,
    axum::Form(form): axum::Form<TransferForm>,
) -> Response {
    let now = match local_now(&state.local_timezone) {
        Ok(now) => now,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let request = TransferRequest {
        from_account_id: form.from_account_id,
        pin: form.pin,
        to_account_number: form.to_account_number,
        amount: form.amount,
        description: form.description,
    };

    match create_transfer(user_id, request, now, &connection) {
        Ok(transfer) => {
            tracing::info!(
                "Transferred {} from account {} to account {}",
                transfer.amount,
                transfer.from_account_id,
                transfer.to_account_id
            );
            (
                HxRedirect(format_endpoint(endpoints::TRANSFER_VIEW, transfer.id)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::debug!("transfer rejected for user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}
