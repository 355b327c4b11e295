//! Category creation endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    category::{CategoryName, create_category, domain::CategoryFormData, page::category_form},
    endpoints,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create a category owned by the current user.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryEndpointState>,
    Extension(user_id): Extension<UserID>,
    Form(new_category): Form<CategoryFormData>,
) -> Response {
    let name = match CategoryName::new(&new_category.name) {
        Ok(name) => name,
        Err(error) => {
            return category_form(&format!("Error: {error}")).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(user_id, name, new_category.kind, &connection) {
        Ok(category) => {
            tracing::info!("Created {} category {}", category.kind.as_str(), category.name);
            (
                HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::DuplicateCategory(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");
            error.into_alert_response()
        }
    }
}
