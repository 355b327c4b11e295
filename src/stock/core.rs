//! Brokerage accounts and the stock holdings in them.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, UserID,
    account::{PinHash, validate_account_number},
    error::is_unique_violation,
};

pub type StockAccountId = i64;
pub type StockHoldingId = i64;

/// The currency a holding is priced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[serde(alias = "krw")]
    Krw,
    #[serde(alias = "usd")]
    Usd,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Krw, Currency::Usd];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Krw => "KRW",
            Currency::Usd => "USD",
        }
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KRW" => Ok(Currency::Krw),
            "USD" => Ok(Currency::Usd),
            other => Err(Error::CurrencyMismatch(format!("unknown currency \"{other}\""))),
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pairs quoted in won even though the ticker is not numeric.
const KRW_QUOTED_PAIRS: [&str; 3] = ["BTC/KRW", "ETH/KRW", "USD/KRW"];

/// Upper-case `raw_ticker` and check that `currency` suits it.
///
/// Domestic listings use all-digit codes and trade in KRW. Everything else
/// trades in USD apart from a few won-quoted pairs.
///
/// # Errors
///
/// Returns [Error::EmptyTicker] for a blank ticker and
/// [Error::CurrencyMismatch] if the currency does not suit the ticker.
pub fn validate_ticker(raw_ticker: &str, currency: Currency) -> Result<String, Error> {
    let ticker = raw_ticker.trim().to_uppercase();

    if ticker.is_empty() {
        return Err(Error::EmptyTicker);
    }

    let expected = if ticker.chars().all(|c| c.is_ascii_digit())
        || KRW_QUOTED_PAIRS.contains(&ticker.as_str())
    {
        Currency::Krw
    } else {
        Currency::Usd
    };

    if currency != expected {
        return Err(Error::CurrencyMismatch(format!(
            "{ticker} is traded in {expected}, not {currency}."
        )));
    }

    Ok(ticker)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockAccount {
    pub id: StockAccountId,
    pub owner_id: UserID,
    /// The brokerage holding the account.
    pub company: String,
    pub number: String,
    pub pin_hash: PinHash,
    pub created_at: Date,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStockAccount {
    pub owner_id: UserID,
    pub company: String,
    pub number: String,
    pub pin_hash: PinHash,
    pub created_at: Date,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockHolding {
    pub id: StockHoldingId,
    pub stock_account_id: StockAccountId,
    pub ticker: String,
    /// The average price paid per share.
    pub purchase_price: f64,
    pub shares: f64,
    pub currency: Currency,
    pub created_at: Date,
}

impl StockHolding {
    /// The amount paid for all shares.
    pub fn cost(&self) -> f64 {
        self.purchase_price * self.shares
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStockHolding {
    pub stock_account_id: StockAccountId,
    pub ticker: String,
    pub purchase_price: f64,
    pub shares: f64,
    pub currency: Currency,
    pub created_at: Date,
}

/// A holding with the account it is held in.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingRow {
    pub holding: StockHolding,
    pub company: String,
    pub account_number: String,
}

pub fn create_stock_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS stock_account (
            id INTEGER PRIMARY KEY,
            owner_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            company TEXT NOT NULL,
            number TEXT NOT NULL UNIQUE,
            pin TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS stock_holding (
            id INTEGER PRIMARY KEY,
            stock_account_id INTEGER NOT NULL REFERENCES stock_account(id) ON DELETE CASCADE,
            ticker TEXT NOT NULL,
            purchase_price REAL NOT NULL,
            shares REAL NOT NULL,
            currency TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(stock_account_id, ticker, currency)
        );

        CREATE TABLE IF NOT EXISTS stock_quote (
            ticker TEXT PRIMARY KEY,
            price REAL NOT NULL,
            updated_at TEXT NOT NULL
        );",
    )?;

    Ok(())
}

/// Register a brokerage account.
///
/// # Errors
///
/// Returns [Error::DuplicateStockAccountNumber] if the number is taken and
/// [Error::InvalidAccountNumber] if it is malformed.
pub fn create_stock_account(
    new_account: NewStockAccount,
    connection: &Connection,
) -> Result<StockAccount, Error> {
    let number = validate_account_number(&new_account.number)?;
    let company = new_account.company.trim().to_owned();

    connection
        .execute(
            "INSERT INTO stock_account (owner_id, company, number, pin, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                new_account.owner_id.as_i64(),
                &company,
                &number,
                new_account.pin_hash.as_ref(),
                new_account.created_at,
            ),
        )
        .map_err(|error| {
            if is_unique_violation(&error, "stock_account.number") {
                Error::DuplicateStockAccountNumber(number.clone())
            } else {
                error.into()
            }
        })?;

    Ok(StockAccount {
        id: connection.last_insert_rowid(),
        owner_id: new_account.owner_id,
        company,
        number,
        pin_hash: new_account.pin_hash,
        created_at: new_account.created_at,
    })
}

fn map_stock_account(row: &Row) -> Result<StockAccount, rusqlite::Error> {
    let raw_pin_hash: String = row.get(4)?;

    Ok(StockAccount {
        id: row.get(0)?,
        owner_id: UserID::new(row.get(1)?),
        company: row.get(2)?,
        number: row.get(3)?,
        pin_hash: PinHash::new_unchecked(&raw_pin_hash),
        created_at: row.get(5)?,
    })
}

/// Get the brokerage accounts of `owner_id`, oldest first.
pub fn get_stock_accounts(
    owner_id: UserID,
    connection: &Connection,
) -> Result<Vec<StockAccount>, Error> {
    connection
        .prepare(
            "SELECT id, owner_id, company, number, pin, created_at
            FROM stock_account WHERE owner_id = ?1 ORDER BY id ASC",
        )?
        .query_map([owner_id.as_i64()], map_stock_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

fn map_holding(row: &Row, offset: usize) -> Result<StockHolding, rusqlite::Error> {
    let raw_currency: String = row.get(offset + 5)?;
    let currency = raw_currency.parse().map_err(|_| {
        rusqlite::Error::InvalidColumnType(offset + 5, "currency".to_owned(), Type::Text)
    })?;

    Ok(StockHolding {
        id: row.get(offset)?,
        stock_account_id: row.get(offset + 1)?,
        ticker: row.get(offset + 2)?,
        purchase_price: row.get(offset + 3)?,
        shares: row.get(offset + 4)?,
        currency,
        created_at: row.get(offset + 6)?,
    })
}

/// Add shares to one of `owner_id`'s brokerage accounts.
///
/// Buying more of a ticker already held in the same account and currency
/// merges into the existing holding at the weighted average price.
///
/// # Errors
///
/// Returns:
/// - [Error::NotFound] if the account does not belong to `owner_id`,
/// - [Error::NonPositiveAmount] if the price or share count is not positive,
/// - [Error::EmptyTicker] or [Error::CurrencyMismatch] for a bad ticker.
pub fn add_stock_holding(
    owner_id: UserID,
    new_holding: NewStockHolding,
    connection: &Connection,
) -> Result<StockHolding, Error> {
    let ticker = validate_ticker(&new_holding.ticker, new_holding.currency)?;

    if !(new_holding.purchase_price.is_finite() && new_holding.purchase_price > 0.0)
        || !(new_holding.shares.is_finite() && new_holding.shares > 0.0)
    {
        return Err(Error::NonPositiveAmount);
    }

    let transaction = connection.unchecked_transaction()?;

    transaction.query_row(
        "SELECT id FROM stock_account WHERE id = ?1 AND owner_id = ?2",
        (new_holding.stock_account_id, owner_id.as_i64()),
        |row| row.get::<_, StockAccountId>(0),
    )?;

    let existing = transaction
        .prepare(
            "SELECT id, stock_account_id, ticker, purchase_price, shares, currency, created_at
            FROM stock_holding
            WHERE stock_account_id = ?1 AND ticker = ?2 AND currency = ?3",
        )?
        .query_row(
            (
                new_holding.stock_account_id,
                &ticker,
                new_holding.currency.as_str(),
            ),
            |row| map_holding(row, 0),
        );

    let holding = match existing {
        Ok(existing) => {
            let shares = existing.shares + new_holding.shares;
            let purchase_price = (existing.cost()
                + new_holding.purchase_price * new_holding.shares)
                / shares;

            transaction.execute(
                "UPDATE stock_holding SET shares = ?1, purchase_price = ?2 WHERE id = ?3",
                (shares, purchase_price, existing.id),
            )?;

            StockHolding {
                shares,
                purchase_price,
                ..existing
            }
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            transaction.execute(
                "INSERT INTO stock_holding
                    (stock_account_id, ticker, purchase_price, shares, currency, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (
                    new_holding.stock_account_id,
                    &ticker,
                    new_holding.purchase_price,
                    new_holding.shares,
                    new_holding.currency.as_str(),
                    new_holding.created_at,
                ),
            )?;

            StockHolding {
                id: transaction.last_insert_rowid(),
                stock_account_id: new_holding.stock_account_id,
                ticker,
                purchase_price: new_holding.purchase_price,
                shares: new_holding.shares,
                currency: new_holding.currency,
                created_at: new_holding.created_at,
            }
        }
        Err(error) => return Err(error.into()),
    };

    transaction.commit()?;

    Ok(holding)
}

/// Get every holding across `owner_id`'s brokerage accounts.
pub fn get_holdings(owner_id: UserID, connection: &Connection) -> Result<Vec<HoldingRow>, Error> {
    connection
        .prepare(
            "SELECT h.id, h.stock_account_id, h.ticker, h.purchase_price, h.shares,
                h.currency, h.created_at, a.company, a.number
            FROM stock_holding h
            INNER JOIN stock_account a ON a.id = h.stock_account_id
            WHERE a.owner_id = ?1
            ORDER BY a.id ASC, h.ticker ASC",
        )?
        .query_map([owner_id.as_i64()], |row| {
            Ok(HoldingRow {
                holding: map_holding(row, 0)?,
                company: row.get(7)?,
                account_number: row.get(8)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

/// Delete a holding in one of `owner_id`'s accounts.
///
/// # Errors
///
/// Returns [Error::DeleteMissingHolding] if no such holding belongs to the user.
pub fn delete_stock_holding(
    holding_id: StockHoldingId,
    owner_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let deleted = connection.execute(
        "DELETE FROM stock_holding
        WHERE id = ?1
            AND stock_account_id IN (SELECT id FROM stock_account WHERE owner_id = ?2)",
        (holding_id, owner_id.as_i64()),
    )?;

    if deleted == 0 {
        return Err(Error::DeleteMissingHolding);
    }

    Ok(())
}
