//! Downloads the user's ledgers as CSV.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::{Date, macros::date};

use crate::{
    AppState, Error, UserID,
    book::{LedgerEntry, LedgerSource, get_ledger_entries},
    period::{MonthQuery, YearMonth},
};

const CSV_HEADER: [&str; 9] = [
    "Ledger",
    "Date",
    "Side",
    "Amount",
    "Balance",
    "Category",
    "Description",
    "Memo",
    "Account",
];

const FIRST_DATE: Date = date!(0001 - 01 - 01);
const LAST_DATE: Date = date!(9999 - 12 - 31);

#[derive(Debug, Clone)]
pub struct ExportState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The month to export, or `None` for everything. Both `year` and `month`
/// are needed to pick a month.
fn requested_month(query: MonthQuery) -> Result<Option<YearMonth>, Error> {
    match (query.year, query.month) {
        (Some(year), Some(month)) => YearMonth::new(year, month).map(Some),
        _ => Ok(None),
    }
}

/// Get the rows to export: account rows, then cash rows, each oldest first.
pub fn get_export_entries(
    user_id: UserID,
    month: Option<YearMonth>,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    let (start, end) = match month {
        Some(month) => (month.first_day(), month.last_day()),
        None => (FIRST_DATE, LAST_DATE),
    };

    let (account_rows, cash_rows): (Vec<LedgerEntry>, Vec<LedgerEntry>) =
        get_ledger_entries(user_id, start, end, connection)?
            .into_iter()
            .rev()
            .partition(|entry| entry.source == LedgerSource::Account);

    Ok(account_rows.into_iter().chain(cash_rows).collect())
}

/// Write `entries` as CSV with a header row.
pub fn write_csv(entries: &[LedgerEntry]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|error| Error::CsvError(error.to_string()))?;

    for entry in entries {
        writer
            .write_record([
                entry.source.label().to_owned(),
                entry.date.to_string(),
                entry.side_label.to_owned(),
                entry.amount.to_string(),
                entry.balance.to_string(),
                entry.category_name.clone().unwrap_or_default(),
                entry.description.clone(),
                entry.memo.clone(),
                entry.asset.clone(),
            ])
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))
}

fn export_filename(month: Option<YearMonth>) -> String {
    match month {
        Some(month) => format!(
            "transactions_{}_{}.csv",
            month.year,
            month.month_number()
        ),
        None => "transactions.csv".to_owned(),
    }
}

/// Download the user's transactions as CSV.
pub async fn export_csv_endpoint(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthQuery>,
) -> Result<Response, Error> {
    let month = requested_month(query)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entries = get_export_entries(user_id, month, &connection)?;
    let body = write_csv(&entries)
        .inspect_err(|error| tracing::error!("could not write CSV export: {error}"))?;

    tracing::debug!("Exported {} rows for user {user_id}", entries.len());

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export_filename(month)),
            ),
        ],
        body,
    )
        .into_response())
}
