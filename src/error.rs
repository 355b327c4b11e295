//! The application-wide error type and how it is turned into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use time::Date;

use crate::{
    alert::Alert, category::CategoryId, internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of login ID and password.
    #[error("invalid login ID or password")]
    InvalidCredentials,

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The login ID is already used by another user.
    #[error("the login ID \"{0}\" is already taken")]
    DuplicateLoginId(String),

    /// The email address is already used by another user.
    #[error("the email address \"{0}\" is already registered")]
    DuplicateEmail(String),

    /// The category ID does not refer to a category, or refers to a category
    /// of the wrong kind for the transaction.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// A category with the same name and kind already exists.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategory(String),

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// A transaction amount was zero, negative or not a number.
    #[error("the amount must be greater than zero")]
    NonPositiveAmount,

    /// An account PIN was not exactly four digits.
    #[error("the PIN must be exactly four digits")]
    InvalidAccountPin,

    /// The PIN did not match the one stored for the account.
    #[error("the account PIN is incorrect")]
    WrongAccountPin,

    /// The PIN and its confirmation differ.
    #[error("the PINs do not match")]
    PinMismatch,

    /// The account number contains characters other than digits and hyphens.
    #[error("the account number \"{0}\" is not valid")]
    InvalidAccountNumber(String),

    /// The bank account number already exists in the database.
    #[error("the account \"{0}\" already exists in the database")]
    DuplicateAccountNumber(String),

    /// The stock account number already exists in the database.
    #[error("the stock account \"{0}\" already exists in the database")]
    DuplicateStockAccountNumber(String),

    /// A withdrawal or transfer is larger than the account balance.
    #[error("insufficient funds: the balance is {balance} but {requested} was requested")]
    InsufficientFunds {
        /// The balance of the account at the time of the request.
        balance: f64,
        /// The amount the user tried to take out.
        requested: f64,
    },

    /// The transfer amount is below [crate::transfer::MINIMUM_TRANSFER_AMOUNT].
    #[error("the transfer amount {0} is below the minimum")]
    TransferAmountTooSmall(f64),

    /// The sending and receiving accounts are the same.
    #[error("cannot transfer money to the same account")]
    SelfTransfer,

    /// No account has the given number.
    #[error("could not find an account with the number \"{0}\"")]
    UnknownAccountNumber(String),

    /// An empty ticker code was used for a stock holding.
    #[error("the ticker code cannot be empty")]
    EmptyTicker,

    /// The currency chosen for a holding does not match its ticker.
    #[error("{0}")]
    CurrencyMismatch(String),

    /// The end of a date range is before its start.
    #[error("the end date {1} is before the start date {0}")]
    InvalidDateRange(Date, Date),

    /// A month outside 1-12 or a year/month that cannot form a date.
    #[error("invalid month {1} for year {0}")]
    InvalidMonth(i32, u8),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Writing the CSV export failed.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to delete one of the categories every user shares.
    #[error("default categories cannot be deleted")]
    DeleteDefaultCategory,

    /// Tried to delete a stock holding that does not exist
    #[error("tried to delete a stock holding that is not in the database")]
    DeleteMissingHolding,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// Returns true if `error` is a SQLite UNIQUE constraint violation on `column`.
///
/// `column` should be of the form "table.column".
pub(crate) fn is_unique_violation(error: &rusqlite::Error, column: &str) -> bool {
    // Code 2067 occurs when a UNIQUE constraint failed.
    matches!(
        error,
        rusqlite::Error::SqliteFailure(sql_error, Some(desc))
            if sql_error.extended_code == 2067 && desc.contains(column)
    )
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidDateRange(..) | Error::InvalidMonth(..) => {
                let description = self.to_string();
                InternalServerError {
                    description: &description,
                    fix: "Check the dates in the address bar and try again.",
                }
                .into_response_with_status(StatusCode::BAD_REQUEST)
            }
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an alert for HTMX requests.
    ///
    /// Validation errors produce a 400 response, missing rows a 404 and
    /// everything else a generic 500 alert.
    pub(crate) fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                        ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::FutureDate(date) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid transaction date".to_owned(),
                    details: format!(
                        "{date} is a date in the future, which is not allowed. \
                        Change the date to today or earlier."
                    ),
                },
            ),
            Error::NonPositiveAmount => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: "The amount must be a number greater than zero.".to_owned(),
                },
            ),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category".to_owned(),
                    details: match category_id {
                        Some(id) => format!(
                            "The category with the ID {id} does not exist or does not match \
                            the transaction type."
                        ),
                        None => "The category does not exist.".to_owned(),
                    },
                },
            ),
            Error::DuplicateCategory(name) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Category".to_owned(),
                    details: format!("The category \"{name}\" already exists."),
                },
            ),
            Error::InvalidAccountPin | Error::PinMismatch | Error::WrongAccountPin => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: capitalise(&self.to_string()),
                },
            ),
            Error::InvalidAccountNumber(number) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid Account Number".to_owned(),
                    details: format!(
                        "\"{number}\" is not a valid account number. \
                        Use only digits and hyphens, e.g. 110-123-456789."
                    ),
                },
            ),
            Error::DuplicateAccountNumber(number) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Account Number".to_owned(),
                    details: format!(
                        "The account {number} already exists in the database. \
                        Check the account number, or delete the existing account."
                    ),
                },
            ),
            Error::DuplicateStockAccountNumber(number) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Stock Account Number".to_owned(),
                    details: format!(
                        "The stock account {number} is already registered. \
                        Enter a different account number."
                    ),
                },
            ),
            Error::InsufficientFunds { balance, requested } => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Insufficient funds".to_owned(),
                    details: format!(
                        "The amount {} is larger than the balance {}.",
                        crate::html::format_currency(requested),
                        crate::html::format_currency(balance)
                    ),
                },
            ),
            Error::TransferAmountTooSmall(_) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Transfer amount too small".to_owned(),
                    details: format!(
                        "The minimum transfer amount is {}.",
                        crate::html::format_currency(crate::transfer::MINIMUM_TRANSFER_AMOUNT)
                    ),
                },
            ),
            Error::SelfTransfer => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid recipient".to_owned(),
                    details: "The recipient account must be different from the sending account."
                        .to_owned(),
                },
            ),
            Error::UnknownAccountNumber(number) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Recipient not found".to_owned(),
                    details: format!(
                        "Could not find the account {number}. Check the account details and try again."
                    ),
                },
            ),
            Error::EmptyTicker | Error::EmptyCategoryName => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: self.to_string(),
                },
            ),
            Error::CurrencyMismatch(details) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Currency does not match ticker".to_owned(),
                    details,
                },
            ),
            Error::InvalidDateRange(..) | Error::InvalidMonth(..) => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: capitalise(&self.to_string()),
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Not found".to_owned(),
                    details: "The requested item could not be found.".to_owned(),
                },
            ),
            Error::UpdateMissingAccount => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update account".to_owned(),
                    details: "The account could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingAccount => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete account".to_owned(),
                    details: "The account could not be found. \
                    Try refreshing the page to see if the account has already been deleted."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category could not be found. \
                    Try refreshing the page to see if the category has already been deleted."
                        .to_owned(),
                },
            ),
            Error::DeleteDefaultCategory => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "Default categories are shared by every user and cannot be deleted."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingHolding => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete holding".to_owned(),
                    details: "The stock holding could not be found. \
                    Try refreshing the page to see if the holding has already been deleted."
                        .to_owned(),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details: "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                    },
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}

fn capitalise(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use time::macros::date;

    use crate::Error;

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let cases = [
            Error::FutureDate(date!(2099 - 01 - 01)),
            Error::NonPositiveAmount,
            Error::WrongAccountPin,
            Error::SelfTransfer,
            Error::TransferAmountTooSmall(1.0),
            Error::InsufficientFunds {
                balance: 1.0,
                requested: 2.0,
            },
        ];

        for error in cases {
            let response = error.into_alert_response();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn missing_rows_are_not_found_alerts() {
        let response = Error::DeleteMissingCategory.into_alert_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn deleting_default_category_is_bad_request() {
        let response = Error::DeleteDefaultCategory.into_alert_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_month_page_is_bad_request() {
        let response = Error::InvalidMonth(2025, 13).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unexpected_errors_are_internal_server_errors() {
        let response = Error::DatabaseLockError.into_alert_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
