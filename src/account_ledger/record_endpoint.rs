//! The endpoint for recording a deposit or withdrawal from the account page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
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
    account::AccountId,
    account_ledger::{AccountEntry, AccountSide, record_account_transaction},
    category::CategoryId,
    endpoints::{self, format_endpoint},
    timezone::local_today,
};

/// The state needed to record an account transaction.
#[derive(Debug, Clone)]
pub struct RecordAccountTransactionState {
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RecordAccountTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for a deposit or withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTransactionForm {
    pub side: AccountSide,
    pub amount: f64,
    pub date: Date,
    #[serde(default)]
    pub description: String,
    /// An empty select value means no category.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

/// Record a deposit or withdrawal and redirect back to the account page.
pub async fn record_account_transaction_endpoint(
    Path(account_id): Path<AccountId>,
    State(state): State<RecordAccountTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<AccountTransactionForm>,
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

    let entry = AccountEntry {
        side: form.side,
        amount: form.amount,
        date: form.date,
        description: form.description,
        category_id: form.category_id,
    };

    match record_account_transaction(account_id, user_id, entry, today, &connection) {
        Ok(row) => {
            tracing::info!(
                "Recorded {} of {} for account {account_id}",
                row.side.as_str(),
                row.amount
            );
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
mod record_account_transaction_endpoint_tests {
    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use time::{Duration, OffsetDateTime};

    use crate::{
        account::{get_account, test_utils::insert_test_account},
        account_ledger::{AccountSide, get_account_transactions},
        endpoints::{self, format_endpoint},
        test_utils::{assert_hx_redirect, get_shared_test_connection, insert_test_user},
    };

    use super::{
        AccountTransactionForm, RecordAccountTransactionState,
        record_account_transaction_endpoint,
    };

    fn form(side: AccountSide, amount: f64) -> AccountTransactionForm {
        AccountTransactionForm {
            side,
            amount,
            // A day in the past in every timezone.
            date: OffsetDateTime::now_utc().date() - Duration::days(2),
            description: "groceries".to_owned(),
            category_id: None,
        }
    }

    #[tokio::test]
    async fn records_withdrawal_and_redirects() {
        let state = RecordAccountTransactionState {
            local_timezone: "Asia/Seoul".to_owned(),
            db_connection: get_shared_test_connection(),
        };
        let (user, account) = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user("test", &connection);
            let account = insert_test_account(user.id, "110-1", 1_000.0, &connection);
            (user, account)
        };

        let response = record_account_transaction_endpoint(
            Path(account.id),
            State(state.clone()),
            Extension(user.id),
            Form(form(AccountSide::Withdrawal, 250.0)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, &format_endpoint(endpoints::ACCOUNT_VIEW, account.id));
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_account(account.id, user.id, &connection).unwrap().balance,
            750.0
        );
        assert_eq!(get_account_transactions(account.id, &connection).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn overdraft_returns_bad_request() {
        let state = RecordAccountTransactionState {
            local_timezone: "Asia/Seoul".to_owned(),
            db_connection: get_shared_test_connection(),
        };
        let (user, account) = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user("test", &connection);
            let account = insert_test_account(user.id, "110-1", 100.0, &connection);
            (user, account)
        };

        let response = record_account_transaction_endpoint(
            Path(account.id),
            State(state.clone()),
            Extension(user.id),
            Form(form(AccountSide::Withdrawal, 250.0)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_account(account.id, user.id, &connection).unwrap().balance,
            100.0
        );
    }

    #[tokio::test]
    async fn invalid_timezone_returns_error() {
        let state = RecordAccountTransactionState {
            local_timezone: "Mars/Olympus_Mons".to_owned(),
            db_connection: get_shared_test_connection(),
        };

        let response = record_account_transaction_endpoint(
            Path(1),
            State(state),
            Extension(crate::UserID::new(1)),
            Form(form(AccountSide::Deposit, 250.0)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
