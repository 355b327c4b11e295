//! JSON list of categories used by the ledger forms to fill their category
//! drop-downs after the user picks income or expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, UserID,
    category::{CategoryId, CategoryKind, get_categories_by_kind},
};

/// The state needed for listing categories as JSON.
#[derive(Debug, Clone)]
pub struct CategoriesJsonState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesJsonState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct CategoryJson {
    id: CategoryId,
    name: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct CategoriesJson {
    categories: Vec<CategoryJson>,
}

/// List the categories of the requested kind that the user can see.
///
/// A missing or unknown kind gives an empty list rather than an error.
pub async fn get_categories_json(
    State(state): State<CategoriesJsonState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<CategoriesQuery>,
) -> Response {
    let Some(kind) = query
        .kind
        .as_deref()
        .and_then(|kind| kind.parse::<CategoryKind>().ok())
    else {
        return Json(CategoriesJson { categories: vec![] }).into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_categories_by_kind(user_id, kind, &connection) {
        Ok(categories) => Json(CategoriesJson {
            categories: categories
                .into_iter()
                .map(|category| CategoryJson {
                    id: category.id,
                    name: category.name.to_string(),
                })
                .collect(),
        })
        .into_response(),
        Err(error) => {
            tracing::error!("Could not list {} categories: {error}", kind.as_str());
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod categories_json_tests {
    use axum::{
        Extension,
        extract::{Query, State},
    };

    use crate::{
        category::{CategoryKind, CategoryName, create_category},
        test_utils::{
            assert_status_ok, get_shared_test_connection, insert_test_user, parse_json_body,
        },
    };

    use super::{CategoriesJsonState, CategoriesQuery, get_categories_json};

    /// List the categories mina sees. jun owns a "Golf" expense category.
    async fn get_category_names(kind: Option<&str>) -> Vec<String> {
        let db_connection = get_shared_test_connection();
        let mina = {
            let connection = db_connection.lock().unwrap();
            let mina = insert_test_user("mina", &connection).id;
            let jun = insert_test_user("jun", &connection).id;
            create_category(
                jun,
                CategoryName::new_unchecked("Golf"),
                CategoryKind::Expense,
                &connection,
            )
            .unwrap();
            mina
        };
        let state = CategoriesJsonState { db_connection };

        let response = get_categories_json(
            State(state),
            Extension(mina),
            Query(CategoriesQuery {
                kind: kind.map(str::to_owned),
            }),
        )
        .await;

        assert_status_ok(&response);
        let body = parse_json_body(response).await;
        body["categories"]
            .as_array()
            .expect("categories should be an array")
            .iter()
            .map(|category| {
                assert!(category["id"].is_i64());
                category["name"].as_str().unwrap().to_owned()
            })
            .collect()
    }

    #[tokio::test]
    async fn lists_income_categories() {
        let names = get_category_names(Some("income")).await;

        assert_eq!(names, ["Allowance", "Bonus", "Interest", "Other", "Salary"]);
    }

    #[tokio::test]
    async fn lists_expense_categories() {
        let names = get_category_names(Some("expense")).await;

        assert_eq!(names.len(), 12);
        assert!(names.contains(&"Food".to_owned()));
        assert!(!names.contains(&"Golf".to_owned()));
    }

    #[tokio::test]
    async fn unknown_or_missing_kind_gives_empty_list() {
        assert!(get_category_names(Some("transfer")).await.is_empty());
        assert!(get_category_names(None).await.is_empty());
    }
}
