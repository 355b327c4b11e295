//! Where current share prices come from.

use rusqlite::{Connection, OptionalExtension};
use time::OffsetDateTime;

use crate::Error;

/// Looks up the latest price of a ticker.
pub trait QuoteSource {
    /// The latest known price, or `None` if the ticker has never been quoted.
    fn latest_price(&self, ticker: &str) -> Result<Option<f64>, Error>;
}

/// Quotes recorded in the `stock_quote` table.
pub struct StoredQuotes<'a> {
    connection: &'a Connection,
}

impl<'a> StoredQuotes<'a> {
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }
}

impl QuoteSource for StoredQuotes<'_> {
    fn latest_price(&self, ticker: &str) -> Result<Option<f64>, Error> {
        self.connection
            .query_row(
                "SELECT price FROM stock_quote WHERE ticker = ?1",
                [ticker],
                |row| row.get(0),
            )
            .optional()
            .map_err(Error::from)
    }
}

/// A price recorded for a ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct StockQuote {
    pub ticker: String,
    pub price: f64,
    pub updated_at: OffsetDateTime,
}

/// Insert or replace the price of a ticker.
///
/// # Errors
///
/// Returns [Error::EmptyTicker] for a blank ticker and
/// [Error::NonPositiveAmount] if the price is not positive.
pub fn upsert_quote(
    raw_ticker: &str,
    price: f64,
    updated_at: OffsetDateTime,
    connection: &Connection,
) -> Result<StockQuote, Error> {
    let ticker = raw_ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(Error::EmptyTicker);
    }

    if !price.is_finite() || price <= 0.0 {
        return Err(Error::NonPositiveAmount);
    }

    connection.execute(
        "INSERT INTO stock_quote (ticker, price, updated_at) VALUES (?1, ?2, ?3)
        ON CONFLICT(ticker) DO UPDATE SET price = excluded.price, updated_at = excluded.updated_at",
        (&ticker, price, updated_at),
    )?;

    Ok(StockQuote {
        ticker,
        price,
        updated_at,
    })
}


#[cfg(test)]
mod quote_tests {
    use time::macros::datetime;

    use crate::{
        Error,
        stock::{QuoteSource, StoredQuotes, upsert_quote},
        test_utils::get_test_connection,
    };

    #[test]
    fn upsert_replaces_existing_price() {
        let connection = get_test_connection();

        upsert_quote("aapl", 180.0, datetime!(2025-03-01 09:00 +9), &connection).unwrap();
        upsert_quote("AAPL", 190.5, datetime!(2025-03-02 09:00 +9), &connection).unwrap();

        let quotes = StoredQuotes::new(&connection);
        assert_eq!(quotes.latest_price("AAPL"), Ok(Some(190.5)));
        assert_eq!(quotes.latest_price("MSFT"), Ok(None));
    }

    #[test]
    fn upsert_rejects_bad_input() {
        let connection = get_test_connection();
        let now = datetime!(2025-03-01 09:00 +9);

        assert_eq!(upsert_quote(" ", 1.0, now, &connection), Err(Error::EmptyTicker));
        assert_eq!(
            upsert_quote("AAPL", 0.0, now, &connection),
            Err(Error::NonPositiveAmount)
        );
    }
}
