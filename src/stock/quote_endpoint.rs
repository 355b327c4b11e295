//! The endpoint for recording a share price.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, endpoints, stock::upsert_quote, timezone::local_now};

#[derive(Debug, Clone)]
pub struct StockQuoteState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StockQuoteState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockQuoteForm {
    pub ticker: String,
    pub price: f64,
}

/// Set the latest price of a ticker and reload the stocks page.
///
/// Quotes are shared by all users.
pub async fn record_quote_endpoint(
    State(state): State<StockQuoteState>,
    Form(form): Form<StockQuoteForm>,
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

    match upsert_quote(&form.ticker, form.price, now, &connection) {
        Ok(quote) => {
            tracing::info!("Quote for {} set to {}", quote.ticker, quote.price);
            (
                HxRedirect(endpoints::STOCKS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}
