//! The single-entry form endpoint for the cash ledger.

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
use time::Date;

use crate::{
    AppState, Error, UserID,
    cash::{CashSide, NewCashTransaction, create_cash_transaction},
    category::CategoryId,
    endpoints,
    period::YearMonth,
    timezone::local_today,
};

#[derive(Debug, Clone)]
pub struct CreateCashState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCashState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashForm {
    pub side: CashSide,
    pub amount: f64,
    pub date: Date,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub asset_type: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

/// The account book URL for the month containing `date`.
pub(crate) fn book_url_for(date: Date) -> String {
    let month = YearMonth::containing(date);

    format!(
        "{}?year={}&month={}",
        endpoints::BOOK_VIEW,
        month.year,
        month.month_number()
    )
}

/// Record a cash row and redirect to the account book for its month.
pub async fn create_cash_endpoint(
    State(state): State<CreateCashState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<CashForm>,
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

    let new_transaction = NewCashTransaction {
        side: form.side,
        amount: form.amount,
        date: form.date,
        description: form.description.trim().to_owned(),
        memo: form.memo.trim().to_owned(),
        asset_type: form.asset_type.trim().to_owned(),
        category_id: form.category_id,
    };

    match create_cash_transaction(user_id, new_transaction, today, &connection) {
        Ok(created) => (
            HxRedirect(book_url_for(created.date)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
