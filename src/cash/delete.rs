//! Deletes the cash rows ticked on the account book.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, UserID,
    cash::{CashTransactionId, delete_cash_transactions},
    endpoints,
    period::YearMonth,
};

#[derive(Debug, Clone)]
pub struct DeleteCashState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCashState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The selected row IDs, plus the month being viewed so the redirect can
/// return to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteCashForm {
    #[serde(default)]
    pub ids: Vec<CashTransactionId>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u8>,
}

/// Delete the caller's selected rows and redirect back to the account book.
pub async fn delete_cash_endpoint(
    State(state): State<DeleteCashState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<DeleteCashForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = delete_cash_transactions(user_id, &form.ids, &connection)
        .inspect(|deleted| tracing::info!("Deleted {deleted} cash rows for user {user_id}"))
    {
        return error.into_alert_response();
    }

    let redirect_url = match (form.year, form.month) {
        (Some(year), Some(month)) => match YearMonth::new(year, month) {
            Ok(month) => format!(
                "{}?year={}&month={}",
                endpoints::BOOK_VIEW,
                month.year,
                month.month_number()
            ),
            Err(_) => endpoints::BOOK_VIEW.to_owned(),
        },
        _ => endpoints::BOOK_VIEW.to_owned(),
    };

    (HxRedirect(redirect_url), StatusCode::SEE_OTHER).into_response()
}
