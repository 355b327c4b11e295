//! The route paths for pages and API endpoints.
//!
//! For endpoints that take a parameter, e.g., '/accounts/{account_id}', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The monthly account book combining cash and bank transactions.
pub const BOOK_VIEW: &str = "/book";
/// The page listing the user's bank accounts.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for opening a new bank account.
pub const NEW_ACCOUNT_VIEW: &str = "/accounts/new";
/// The detail page for a single bank account.
pub const ACCOUNT_VIEW: &str = "/accounts/{account_id}";
/// The page for changing an account PIN.
pub const ACCOUNT_PIN_VIEW: &str = "/accounts/{account_id}/pin";
/// The transfer history page.
pub const TRANSFERS_VIEW: &str = "/transfers";
/// The page for sending money to another account.
pub const NEW_TRANSFER_VIEW: &str = "/transfers/new";
/// The page shown after a transfer succeeds.
pub const TRANSFER_VIEW: &str = "/transfers/{transfer_id}";
/// The page listing stock holdings and their valuation.
pub const STOCKS_VIEW: &str = "/stocks";
/// The page for registering a brokerage account.
pub const NEW_STOCK_ACCOUNT_VIEW: &str = "/stocks/accounts/new";
/// The page for adding a stock holding.
pub const NEW_STOCK_HOLDING_VIEW: &str = "/stocks/holdings/new";
/// The page for listing and creating categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The CSV download of the user's transactions.
pub const EXPORT_CSV: &str = "/export/transactions.csv";
/// The printable monthly statement.
pub const EXPORT_STATEMENT_VIEW: &str = "/export/statement";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to create users.
pub const USERS: &str = "/api/users";
/// The route to create bank accounts.
pub const ACCOUNTS_API: &str = "/api/accounts";
/// The route to delete a bank account.
pub const DELETE_ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to record a deposit or withdrawal.
pub const ACCOUNT_TRANSACTIONS_API: &str = "/api/accounts/{account_id}/transactions";
/// The route to change an account PIN.
pub const ACCOUNT_PIN_API: &str = "/api/accounts/{account_id}/pin";
/// The route to look up the holder of an account number.
pub const ACCOUNT_LOOKUP_API: &str = "/api/account_lookup";
/// The route to send a transfer.
pub const TRANSFERS_API: &str = "/api/transfers";
/// The route to record a cash transaction.
pub const CASH_API: &str = "/api/cash";
/// The route to record many cash transactions from JSON.
pub const CASH_BULK_API: &str = "/api/cash/bulk";
/// The route to delete selected cash transactions.
pub const CASH_DELETE_API: &str = "/api/cash/delete";
/// The route to search cash transactions.
pub const CASH_SEARCH_API: &str = "/api/cash/search";
/// The route to create and list categories.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route to delete a category.
pub const DELETE_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to create stock accounts.
pub const STOCK_ACCOUNTS_API: &str = "/api/stock_accounts";
/// The route to add stock holdings.
pub const STOCK_HOLDINGS_API: &str = "/api/stock_holdings";
/// The route to delete a stock holding.
pub const DELETE_STOCK_HOLDING: &str = "/api/stock_holdings/{holding_id}";
/// The route to record the latest price of a ticker.
pub const STOCK_QUOTES_API: &str = "/api/stock_quotes";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with a right brace, for
/// example '{account_id}' in '/accounts/{account_id}'. Only the first
/// parameter is replaced.
///
/// If no parameter is found in `endpoint_path`, the original path is returned.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map(|offset| start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!("{}{}{}", &endpoint_path[..start], id, &endpoint_path[end..])
}

// These tests are here so that we know routing and redirects will not panic on a bad URI.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        let all = [
            endpoints::ROOT,
            endpoints::DASHBOARD_VIEW,
            endpoints::BOOK_VIEW,
            endpoints::ACCOUNTS_VIEW,
            endpoints::NEW_ACCOUNT_VIEW,
            endpoints::ACCOUNT_VIEW,
            endpoints::ACCOUNT_PIN_VIEW,
            endpoints::TRANSFERS_VIEW,
            endpoints::NEW_TRANSFER_VIEW,
            endpoints::TRANSFER_VIEW,
            endpoints::STOCKS_VIEW,
            endpoints::NEW_STOCK_ACCOUNT_VIEW,
            endpoints::NEW_STOCK_HOLDING_VIEW,
            endpoints::CATEGORIES_VIEW,
            endpoints::EXPORT_CSV,
            endpoints::EXPORT_STATEMENT_VIEW,
            endpoints::REGISTER_VIEW,
            endpoints::LOG_IN_VIEW,
            endpoints::INTERNAL_ERROR_VIEW,
            endpoints::STATIC,
            endpoints::LOG_IN_API,
            endpoints::LOG_OUT,
            endpoints::USERS,
            endpoints::ACCOUNTS_API,
            endpoints::DELETE_ACCOUNT,
            endpoints::ACCOUNT_TRANSACTIONS_API,
            endpoints::ACCOUNT_PIN_API,
            endpoints::ACCOUNT_LOOKUP_API,
            endpoints::TRANSFERS_API,
            endpoints::CASH_API,
            endpoints::CASH_BULK_API,
            endpoints::CASH_DELETE_API,
            endpoints::CASH_SEARCH_API,
            endpoints::CATEGORIES_API,
            endpoints::DELETE_CATEGORY,
            endpoints::STOCK_ACCOUNTS_API,
            endpoints::STOCK_HOLDINGS_API,
            endpoints::DELETE_STOCK_HOLDING,
            endpoints::STOCK_QUOTES_API,
        ];

        for endpoint in all {
            assert_endpoint_is_valid_uri(endpoint);
            assert_endpoint_is_valid_uri(&format_endpoint(endpoint, 42));
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert_endpoint_is_valid_uri(&formatted_path);
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::ACCOUNT_PIN_VIEW, 7);

        assert_eq!(formatted_path, "/accounts/7/pin");
    }
}
