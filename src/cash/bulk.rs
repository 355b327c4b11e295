//! Records many cash rows at once from the bulk entry table.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Date, macros::format_description};

use crate::{
    AppState, Error, UserID,
    cash::{CashSide, NewCashTransaction, create_cash_transactions},
    category::find_category_by_name,
    timezone::local_today,
};

#[derive(Debug, Clone)]
pub struct BulkCashState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BulkCashState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// One row of the bulk entry table. Every field is optional so that a bad
/// row can be skipped instead of failing the whole request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkCashItem {
    #[serde(rename = "type", default)]
    pub side: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub asset: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkCashRequest {
    #[serde(default)]
    pub transactions: Vec<BulkCashItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BulkCashResponse {
    Created {
        success: bool,
        created: usize,
        skipped: usize,
    },
    Failed {
        success: bool,
        error: String,
    },
}

fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().replace(',', "").parse().ok()?,
        _ => return None,
    };

    (amount.is_finite() && amount > 0.0).then_some(amount)
}

fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Turn a table row into a cash row, or `None` if it must be skipped.
///
/// Rows need a type, a positive amount and a date that is not in the
/// future. Unknown category names leave the row uncategorised.
fn parse_item(
    user_id: UserID,
    item: &BulkCashItem,
    today: Date,
    connection: &Connection,
) -> Result<Option<NewCashTransaction>, Error> {
    let Some(side) = item.side.as_deref().and_then(|side| side.parse::<CashSide>().ok()) else {
        return Ok(None);
    };
    let Some(amount) = item.amount.as_ref().and_then(parse_amount) else {
        return Ok(None);
    };
    let Some(date) = item.date.as_deref().and_then(parse_date) else {
        return Ok(None);
    };
    if date > today {
        return Ok(None);
    }

    let category_id = match item.category.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            find_category_by_name(user_id, name, side.category_kind(), connection)?
                .map(|category| category.id)
        }
        _ => None,
    };

    Ok(Some(NewCashTransaction {
        side,
        amount,
        date,
        description: item.content.as_deref().unwrap_or_default().trim().to_owned(),
        memo: item.memo.as_deref().unwrap_or_default().trim().to_owned(),
        asset_type: item.asset.as_deref().unwrap_or_default().trim().to_owned(),
        category_id,
    }))
}

/// Insert the valid rows of the request and report how many were skipped.
pub async fn create_bulk_cash_endpoint(
    State(state): State<BulkCashState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<BulkCashRequest>,
) -> Response {
    let result = local_today(&state.local_timezone).and_then(|today| {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let mut new_transactions = Vec::with_capacity(request.transactions.len());
        for item in &request.transactions {
            if let Some(new_transaction) = parse_item(user_id, item, today, &connection)? {
                new_transactions.push(new_transaction);
            }
        }

        create_cash_transactions(user_id, new_transactions, &connection)
    });

    match result {
        Ok(created) => {
            let skipped = request.transactions.len() - created.len();
            tracing::info!("Bulk created {} cash rows, skipped {skipped}", created.len());

            Json(BulkCashResponse::Created {
                success: true,
                created: created.len(),
                skipped,
            })
            .into_response()
        }
        Err(error) => {
            tracing::error!("could not bulk create cash rows: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BulkCashResponse::Failed {
                    success: false,
                    error: error.to_string(),
                }),
            )
                .into_response()
        }
    }
}
