//! The endpoint for deleting a stock holding.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    alert::Alert,
    stock::{StockHoldingId, delete_stock_holding},
};

#[derive(Debug, Clone)]
pub struct DeleteHoldingState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteHoldingState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn delete_holding_endpoint(
    State(state): State<DeleteHoldingState>,
    Extension(user_id): Extension<UserID>,
    Path(holding_id): Path<StockHoldingId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_stock_holding(holding_id, user_id, &connection) {
        Ok(()) => Alert::SuccessSimple {
            message: "Holding deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("Could not delete holding {holding_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_holding_tests {
    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::date;

    use crate::{
        stock::{
            Currency, NewStockHolding, add_stock_holding, get_holdings,
            test_utils::insert_test_stock_account,
        },
        test_utils::{assert_status, get_shared_test_connection, insert_test_user},
    };

    use super::{DeleteHoldingState, delete_holding_endpoint};

    #[tokio::test]
    async fn deletes_own_holding_only() {
        let state = DeleteHoldingState {
            db_connection: get_shared_test_connection(),
        };
        let (owner, other, holding) = {
            let connection = state.db_connection.lock().unwrap();
            let owner = insert_test_user("owner", &connection);
            let other = insert_test_user("other", &connection);
            let account = insert_test_stock_account(owner.id, "900-1", &connection);
            let holding = add_stock_holding(
                owner.id,
                NewStockHolding {
                    stock_account_id: account.id,
                    ticker: "AAPL".to_owned(),
                    purchase_price: 100.0,
                    shares: 1.0,
                    currency: Currency::Usd,
                    created_at: date!(2025 - 01 - 01),
                },
                &connection,
            )
            .unwrap();
            (owner, other, holding)
        };

        let response =
            delete_holding_endpoint(State(state.clone()), Extension(other.id), Path(holding.id))
                .await;
        assert_status(&response, StatusCode::NOT_FOUND);

        let response =
            delete_holding_endpoint(State(state.clone()), Extension(owner.id), Path(holding.id))
                .await;
        assert_status(&response, StatusCode::OK);
        assert!(
            get_holdings(owner.id, &state.db_connection.lock().unwrap())
                .unwrap()
                .is_empty()
        );
    }
}
