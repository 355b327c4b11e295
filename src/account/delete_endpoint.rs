//! Defines the endpoint for deleting a bank account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    account::{AccountId, delete_account},
    alert::Alert,
};

/// The state needed to delete an account.
#[derive(Debug, Clone)]
pub struct DeleteAccountState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an account and its ledger, responds with an alert.
pub async fn delete_account_endpoint(
    State(state): State<DeleteAccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_account(account_id, user_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: "Account deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("Could not delete account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_account_endpoint_tests {
    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };

    use crate::{
        Error,
        account::{get_account, test_utils::insert_test_account},
        test_utils::{get_shared_test_connection, insert_test_user},
    };

    use super::{DeleteAccountState, delete_account_endpoint};

    #[tokio::test]
    async fn deletes_owned_account() {
        let state = DeleteAccountState {
            db_connection: get_shared_test_connection(),
        };
        let (user, account) = {
            let connection = state.db_connection.lock().unwrap();
            let user = insert_test_user("test", &connection);
            let account = insert_test_account(user.id, "110-1", 10.0, &connection);
            (user, account)
        };

        let response =
            delete_account_endpoint(State(state.clone()), Extension(user.id), Path(account.id))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            get_account(account.id, user.id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn cannot_delete_other_users_account() {
        let state = DeleteAccountState {
            db_connection: get_shared_test_connection(),
        };
        let (alice, bob, account) = {
            let connection = state.db_connection.lock().unwrap();
            let alice = insert_test_user("alice", &connection);
            let bob = insert_test_user("bob", &connection);
            let account = insert_test_account(alice.id, "110-1", 10.0, &connection);
            (alice, bob, account)
        };

        let response =
            delete_account_endpoint(State(state.clone()), Extension(bob.id), Path(account.id))
                .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(get_account(account.id, alice.id, &state.db_connection.lock().unwrap()).is_ok());
    }
}
