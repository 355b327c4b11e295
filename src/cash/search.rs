//! JSON search over the cash ledger.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use crate::{
    AppState, Error, UserID,
    cash::{CashLedgerRow, CashSearch, CashSide, search_cash_transactions},
    period::YearMonth,
};

#[derive(Debug, Clone)]
pub struct CashSearchState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CashSearchState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Raw query parameters. Values that do not parse are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CashSearchQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    pub kind: Option<String>,
    pub category: Option<String>,
    pub amount: Option<String>,
}

fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]")).ok()
}

fn parse_number<T: std::str::FromStr>(text: &Option<String>) -> Option<T> {
    text.as_deref()
        .map(|text| text.trim().replace(',', ""))
        .and_then(|text| text.parse().ok())
}

impl CashSearchQuery {
    /// An explicit date range wins over `year` and `month`.
    fn into_search(self) -> CashSearch {
        let date_range = match (
            self.start_date.as_deref().and_then(parse_date),
            self.end_date.as_deref().and_then(parse_date),
        ) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => parse_number(&self.year)
                .zip(parse_number(&self.month))
                .and_then(|(year, month)| YearMonth::new(year, month).ok())
                .map(|month| (month.first_day(), month.last_day())),
        };

        CashSearch {
            start_date: date_range.map(|(start, _)| start),
            end_date: date_range.map(|(_, end)| end),
            side: self.kind.as_deref().and_then(|kind| kind.parse().ok()),
            category_id: parse_number(&self.category),
            amount: parse_number(&self.amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashSearchRow {
    pub id: i64,
    pub date: String,
    pub side: CashSide,
    pub amount: f64,
    pub balance: f64,
    pub description: String,
    pub memo: String,
    pub asset_type: String,
    pub category_name: String,
}

impl From<CashLedgerRow> for CashSearchRow {
    fn from(row: CashLedgerRow) -> Self {
        let transaction = row.transaction;

        Self {
            id: transaction.id,
            date: transaction.date.to_string(),
            side: transaction.side,
            amount: transaction.amount,
            balance: transaction.balance,
            description: transaction.description,
            memo: transaction.memo,
            asset_type: transaction.asset_type,
            category_name: row.category_name.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CashSearchResponse {
    pub transactions: Vec<CashSearchRow>,
}

/// Search the caller's cash rows, newest first.
pub async fn search_cash_endpoint(
    State(state): State<CashSearchState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<CashSearchQuery>,
) -> Result<Response, Error> {
    let search = query.into_search();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = search_cash_transactions(user_id, &search, &connection)?
        .into_iter()
        .map(CashSearchRow::from)
        .collect();

    Ok(Json(CashSearchResponse { transactions }).into_response())
}
