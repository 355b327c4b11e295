//! Category deletion endpoint.

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
    category::{CategoryId, delete_category},
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete one of the current user's categories. Ledger rows using the
/// category keep their amounts but lose the category.
///
/// Default categories and other users' categories cannot be deleted.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<DeleteCategoryEndpointState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(user_id, category_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Category deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error @ (Error::DeleteMissingCategory | Error::DeleteDefaultCategory)) => {
            tracing::warn!("User {user_id} could not delete category {category_id}: {error}");
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, UserID,
        category::{
            Category, CategoryKind, CategoryName, create_category, db::get_category,
            find_category_by_name,
        },
        test_utils::{
            assert_valid_html, get_shared_test_connection, insert_test_user, parse_html_fragment,
        },
    };

    use super::{DeleteCategoryEndpointState, delete_category_endpoint};

    struct Fixture {
        connection: Arc<Mutex<Connection>>,
        alice: UserID,
        bob: UserID,
        alice_pets: Category,
    }

    /// Alice owns "Pets" and has a cash expense filed under it.
    fn fixture() -> Fixture {
        let connection = get_shared_test_connection();
        let (alice, bob, alice_pets) = {
            let connection = connection.lock().unwrap();
            let alice = insert_test_user("alice", &connection).id;
            let bob = insert_test_user("bob", &connection).id;
            let pets = create_category(
                alice,
                CategoryName::new_unchecked("Pets"),
                CategoryKind::Expense,
                &connection,
            )
            .unwrap();
            insert_cash_expense(alice, pets.id, &connection);
            (alice, bob, pets)
        };

        Fixture {
            connection,
            alice,
            bob,
            alice_pets,
        }
    }

    fn insert_cash_expense(user_id: UserID, category_id: i64, connection: &Connection) {
        connection
            .execute(
                "INSERT INTO cash_transaction
                    (user_id, side, amount, date, balance, description, memo, asset_type, category_id)
                VALUES (?1, 'expense', 1000.0, ?2, -1000.0, 'Vet', '', 'Cash', ?3)",
                (user_id.as_i64(), date!(2025 - 03 - 01), category_id),
            )
            .unwrap();
    }

    fn cash_category(user_id: UserID, connection: &Connection) -> Option<i64> {
        connection
            .query_row(
                "SELECT category_id FROM cash_transaction WHERE user_id = ?1",
                [user_id.as_i64()],
                |row| row.get(0),
            )
            .unwrap()
    }

    async fn delete_as(fixture: &Fixture, user_id: UserID, category_id: i64) -> StatusCode {
        let state = DeleteCategoryEndpointState {
            db_connection: fixture.connection.clone(),
        };

        delete_category_endpoint(Path(category_id), State(state), Extension(user_id))
            .await
            .status()
    }

    #[tokio::test]
    async fn owner_delete_uncategorises_transactions() {
        let fixture = fixture();

        let status = delete_as(&fixture, fixture.alice, fixture.alice_pets.id).await;

        assert_eq!(status, StatusCode::OK);
        let connection = fixture.connection.lock().unwrap();
        assert_eq!(
            get_category(fixture.alice, fixture.alice_pets.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(cash_category(fixture.alice, &connection), None);
    }

    #[tokio::test]
    async fn other_user_cannot_delete_category() {
        let fixture = fixture();

        let status = delete_as(&fixture, fixture.bob, fixture.alice_pets.id).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let connection = fixture.connection.lock().unwrap();
        assert_eq!(
            get_category(fixture.alice, fixture.alice_pets.id, &connection),
            Ok(fixture.alice_pets.clone())
        );
        assert_eq!(
            cash_category(fixture.alice, &connection),
            Some(fixture.alice_pets.id)
        );
    }

    #[tokio::test]
    async fn default_category_cannot_be_deleted() {
        let fixture = fixture();
        let food = {
            let connection = fixture.connection.lock().unwrap();
            let food =
                find_category_by_name(fixture.alice, "Food", CategoryKind::Expense, &connection)
                    .unwrap()
                    .unwrap();
            insert_cash_expense(fixture.bob, food.id, &connection);
            food
        };

        let status = delete_as(&fixture, fixture.bob, food.id).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let connection = fixture.connection.lock().unwrap();
        assert!(get_category(fixture.alice, food.id, &connection).is_ok());
        assert_eq!(cash_category(fixture.bob, &connection), Some(food.id));
    }

    #[tokio::test]
    async fn delete_missing_category_is_not_found() {
        let fixture = fixture();
        let state = DeleteCategoryEndpointState {
            db_connection: fixture.connection.clone(),
        };

        let response =
            delete_category_endpoint(Path(999_999), State(state), Extension(fixture.alice)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
    }
}
