//! Looks up who holds an account number for the transfer form.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, account::get_account_by_number, user::get_user_by_id};

#[derive(Debug, Clone)]
pub struct AccountLookupState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountLookupState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AccountLookupQuery {
    #[serde(default)]
    pub account_number: String,
}

/// The JSON body of a lookup response. Never includes the balance.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountLookupResponse {
    Found {
        success: bool,
        account_holder: String,
        bank_name: String,
    },
    Failed {
        success: bool,
        error: String,
    },
}

impl AccountLookupResponse {
    fn failed(error: &str) -> Self {
        Self::Failed {
            success: false,
            error: error.to_owned(),
        }
    }
}

/// Returns the holder name and bank of any account number.
pub async fn lookup_account_endpoint(
    State(state): State<AccountLookupState>,
    Query(query): Query<AccountLookupQuery>,
) -> Response {
    let number = query.account_number.trim();
    if number.is_empty() {
        return Json(AccountLookupResponse::failed("Enter an account number.")).into_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Json(AccountLookupResponse::failed(&Error::DatabaseLockError.to_string()))
                .into_response();
        }
    };

    let result = get_account_by_number(number, &connection).and_then(|account| {
        get_user_by_id(account.owner_id, &connection).map(|owner| (account, owner))
    });

    let body = match result {
        Ok((account, owner)) => AccountLookupResponse::Found {
            success: true,
            account_holder: owner.name,
            bank_name: account.bank.name().to_owned(),
        },
        Err(Error::NotFound) => AccountLookupResponse::failed("Account not found."),
        Err(error) => {
            tracing::error!("could not look up account {number}: {error}");
            AccountLookupResponse::failed("Something went wrong, try again later.")
        }
    };

    Json(body).into_response()
}

#[cfg(test)]
mod lookup_account_tests {
    use axum::extract::{Query, State};
    use serde_json::json;

    use crate::{
        account::test_utils::insert_test_account,
        test_utils::{get_shared_test_connection, insert_test_user, parse_json_body},
    };

    use super::{AccountLookupQuery, AccountLookupState, lookup_account_endpoint};

    fn query(account_number: &str) -> Query<AccountLookupQuery> {
        Query(AccountLookupQuery {
            account_number: account_number.to_owned(),
        })
    }

    #[tokio::test]
    async fn finds_holder_without_balance() {
        let state = AccountLookupState {
            db_connection: get_shared_test_connection(),
        };
        {
            let connection = state.db_connection.lock().unwrap();
            let bob = insert_test_user("bob", &connection);
            insert_test_account(bob.id, "220-1", 99_000.0, &connection);
        }

        let response = lookup_account_endpoint(State(state), query(" 220-1 ")).await;

        let body = parse_json_body(response).await;
        assert_eq!(
            body,
            json!({
                "success": true,
                "account_holder": "bob name",
                "bank_name": "Shinhan Bank",
            })
        );
    }

    #[tokio::test]
    async fn unknown_number_fails() {
        let state = AccountLookupState {
            db_connection: get_shared_test_connection(),
        };

        let response = lookup_account_endpoint(State(state), query("999-9")).await;

        let body = parse_json_body(response).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Account not found."));
    }

    #[tokio::test]
    async fn empty_number_fails() {
        let state = AccountLookupState {
            db_connection: get_shared_test_connection(),
        };

        let response = lookup_account_endpoint(State(state), query("")).await;

        let body = parse_json_body(response).await;
        assert_eq!(body["success"], json!(false));
    }
}
