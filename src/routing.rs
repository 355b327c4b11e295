//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{
        change_account_pin_endpoint, create_account_endpoint, delete_account_endpoint,
        get_account_detail_page, get_account_pin_page, get_accounts_page,
        get_create_account_page, lookup_account_endpoint,
    },
    account_ledger::record_account_transaction_endpoint,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    book::get_book_page,
    cash::{
        create_bulk_cash_endpoint, create_cash_endpoint, delete_cash_endpoint,
        search_cash_endpoint,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_json,
        get_categories_page,
    },
    dashboard::get_dashboard_page,
    endpoints,
    export::{export_csv_endpoint, get_statement_page},
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    stock::{
        create_holding_endpoint, create_stock_account_endpoint, delete_holding_endpoint,
        get_create_holding_page, get_create_stock_account_page, get_stocks_page,
        record_quote_endpoint,
    },
    transfer::{
        create_transfer_endpoint, get_transfer_detail_page, get_transfer_history_page,
        get_transfer_page,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::BOOK_VIEW, get(get_book_page))
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::NEW_ACCOUNT_VIEW, get(get_create_account_page))
        .route(endpoints::ACCOUNT_VIEW, get(get_account_detail_page))
        .route(endpoints::ACCOUNT_PIN_VIEW, get(get_account_pin_page))
        .route(endpoints::TRANSFERS_VIEW, get(get_transfer_history_page))
        .route(endpoints::NEW_TRANSFER_VIEW, get(get_transfer_page))
        .route(endpoints::TRANSFER_VIEW, get(get_transfer_detail_page))
        .route(endpoints::STOCKS_VIEW, get(get_stocks_page))
        .route(
            endpoints::NEW_STOCK_ACCOUNT_VIEW,
            get(get_create_stock_account_page),
        )
        .route(
            endpoints::NEW_STOCK_HOLDING_VIEW,
            get(get_create_holding_page),
        )
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::EXPORT_CSV, get(export_csv_endpoint))
        .route(endpoints::EXPORT_STATEMENT_VIEW, get(get_statement_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes are called by htmx and need the HX-REDIRECT header for auth redirects to work.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::ACCOUNTS_API, post(create_account_endpoint))
            .route(endpoints::DELETE_ACCOUNT, delete(delete_account_endpoint))
            .route(
                endpoints::ACCOUNT_TRANSACTIONS_API,
                post(record_account_transaction_endpoint),
            )
            .route(endpoints::ACCOUNT_PIN_API, put(change_account_pin_endpoint))
            .route(endpoints::ACCOUNT_LOOKUP_API, get(lookup_account_endpoint))
            .route(endpoints::TRANSFERS_API, post(create_transfer_endpoint))
            .route(endpoints::CASH_API, post(create_cash_endpoint))
            .route(endpoints::CASH_BULK_API, post(create_bulk_cash_endpoint))
            .route(endpoints::CASH_DELETE_API, post(delete_cash_endpoint))
            .route(endpoints::CASH_SEARCH_API, get(search_cash_endpoint))
            .route(
                endpoints::CATEGORIES_API,
                get(get_categories_json).post(create_category_endpoint),
            )
            .route(endpoints::DELETE_CATEGORY, delete(delete_category_endpoint))
            .route(
                endpoints::STOCK_ACCOUNTS_API,
                post(create_stock_account_endpoint),
            )
            .route(endpoints::STOCK_HOLDINGS_API, post(create_holding_endpoint))
            .route(
                endpoints::DELETE_STOCK_HOLDING,
                delete(delete_holding_endpoint),
            )
            .route(endpoints::STOCK_QUOTES_API, post(record_quote_endpoint))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
