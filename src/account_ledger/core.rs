//! The per-account ledger: deposits and withdrawals with the balance
//! snapshot taken when each row was written.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, UserID,
    account::{AccountId, Bank, get_account, set_account_balance},
    category::{CategoryId, CategoryKind, validate_category},
};

pub type AccountTransactionId = i64;

/// The direction money moves for an account ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountSide {
    Deposit,
    Withdrawal,
}

impl AccountSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountSide::Deposit => "deposit",
            AccountSide::Withdrawal => "withdrawal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccountSide::Deposit => "Deposit",
            AccountSide::Withdrawal => "Withdrawal",
        }
    }

    /// Deposits are income and withdrawals are expenses.
    pub fn category_kind(&self) -> CategoryKind {
        match self {
            AccountSide::Deposit => CategoryKind::Income,
            AccountSide::Withdrawal => CategoryKind::Expense,
        }
    }

    /// Apply a movement of `amount` to `balance`.
    pub fn apply(&self, balance: f64, amount: f64) -> f64 {
        match self {
            AccountSide::Deposit => balance + amount,
            AccountSide::Withdrawal => balance - amount,
        }
    }
}

impl FromStr for AccountSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(AccountSide::Deposit),
            "withdrawal" => Ok(AccountSide::Withdrawal),
            _ => Err(Error::NotFound),
        }
    }
}

impl Display for AccountSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A row in an account's ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountTransaction {
    pub id: AccountTransactionId,
    pub account_id: AccountId,
    /// The other account for transfers.
    pub counterpart_account_id: Option<AccountId>,
    pub side: AccountSide,
    /// Always positive, see `side` for the direction.
    pub amount: f64,
    /// The account balance right after this row was recorded.
    pub balance: f64,
    pub description: String,
    pub date: Date,
    pub category_id: Option<CategoryId>,
}

/// A ledger row before it is written to the database.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccountTransaction {
    pub account_id: AccountId,
    pub counterpart_account_id: Option<AccountId>,
    pub side: AccountSide,
    pub amount: f64,
    pub balance: f64,
    pub description: String,
    pub date: Date,
    pub category_id: Option<CategoryId>,
}

/// A deposit or withdrawal entered by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountEntry {
    pub side: AccountSide,
    pub amount: f64,
    pub date: Date,
    pub description: String,
    pub category_id: Option<CategoryId>,
}

pub fn create_account_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS account_transaction (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
            counterpart_account_id INTEGER REFERENCES account(id) ON DELETE SET NULL,
            side TEXT NOT NULL CHECK (side IN ('deposit', 'withdrawal')),
            amount REAL NOT NULL CHECK (amount > 0),
            balance REAL NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_account_transaction_account_date
            ON account_transaction(account_id, date);",
    )?;

    Ok(())
}

/// Write a ledger row as is. The caller is responsible for the snapshot and
/// for updating the account balance.
pub(crate) fn insert_account_transaction(
    new_transaction: NewAccountTransaction,
    connection: &Connection,
) -> Result<AccountTransaction, Error> {
    connection.execute(
        "INSERT INTO account_transaction
            (account_id, counterpart_account_id, side, amount, balance, description, date, category_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            new_transaction.account_id,
            new_transaction.counterpart_account_id,
            new_transaction.side.as_str(),
            new_transaction.amount,
            new_transaction.balance,
            &new_transaction.description,
            new_transaction.date,
            new_transaction.category_id,
        ),
    )?;

    Ok(AccountTransaction {
        id: connection.last_insert_rowid(),
        account_id: new_transaction.account_id,
        counterpart_account_id: new_transaction.counterpart_account_id,
        side: new_transaction.side,
        amount: new_transaction.amount,
        balance: new_transaction.balance,
        description: new_transaction.description,
        date: new_transaction.date,
        category_id: new_transaction.category_id,
    })
}

/// Check the amount and date shared by every ledger.
///
/// # Errors
///
/// Returns [Error::NonPositiveAmount] or [Error::FutureDate].
pub fn validate_amount_and_date(amount: f64, date: Date, today: Date) -> Result<(), Error> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::NonPositiveAmount);
    }

    if date > today {
        return Err(Error::FutureDate(date));
    }

    Ok(())
}

/// Record a deposit or withdrawal for an account owned by `owner_id`.
///
/// The account balance and the new ledger row are written in one SQL
/// transaction. The row's snapshot is the new balance.
///
/// # Errors
///
/// Returns:
/// - [Error::NonPositiveAmount] or [Error::FutureDate] for invalid input,
/// - [Error::InvalidCategory] if the category is missing or of the wrong kind,
/// - [Error::NotFound] if the account does not belong to `owner_id`,
/// - [Error::InsufficientFunds] if a withdrawal exceeds the balance.
pub fn record_account_transaction(
    account_id: AccountId,
    owner_id: UserID,
    entry: AccountEntry,
    today: Date,
    connection: &Connection,
) -> Result<AccountTransaction, Error> {
    validate_amount_and_date(entry.amount, entry.date, today)?;

    let transaction = connection.unchecked_transaction()?;

    validate_category(
        owner_id,
        entry.category_id,
        entry.side.category_kind(),
        &transaction,
    )?;
    let account = get_account(account_id, owner_id, &transaction)?;

    if entry.side == AccountSide::Withdrawal && entry.amount > account.balance {
        return Err(Error::InsufficientFunds {
            balance: account.balance,
            requested: entry.amount,
        });
    }

    let new_balance = entry.side.apply(account.balance, entry.amount);
    set_account_balance(account.id, new_balance, &transaction)?;

    let row = insert_account_transaction(
        NewAccountTransaction {
            account_id: account.id,
            counterpart_account_id: None,
            side: entry.side,
            amount: entry.amount,
            balance: new_balance,
            description: entry.description.trim().to_owned(),
            date: entry.date,
            category_id: entry.category_id,
        },
        &transaction,
    )?;

    transaction.commit()?;

    Ok(row)
}

fn parse_side(row: &Row, index: usize) -> Result<AccountSide, rusqlite::Error> {
    let raw_side: String = row.get(index)?;

    raw_side
        .parse()
        .map_err(|_| rusqlite::Error::InvalidColumnType(index, "side".to_owned(), Type::Text))
}

fn map_row(row: &Row) -> Result<AccountTransaction, rusqlite::Error> {
    Ok(AccountTransaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        counterpart_account_id: row.get(2)?,
        side: parse_side(row, 3)?,
        amount: row.get(4)?,
        balance: row.get(5)?,
        description: row.get(6)?,
        date: row.get(7)?,
        category_id: row.get(8)?,
    })
}

/// Get the ledger of one account, newest first.
///
/// The caller must check that the account belongs to the user.
pub fn get_account_transactions(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<AccountTransaction>, Error> {
    connection
        .prepare(
            "SELECT id, account_id, counterpart_account_id, side, amount, balance, description, date, category_id
            FROM account_transaction
            WHERE account_id = ?1
            ORDER BY date DESC, id DESC",
        )?
        .query_map([account_id], map_row)?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

/// An account ledger row with the details needed to show it next to cash rows.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountLedgerRow {
    pub id: AccountTransactionId,
    pub account_id: AccountId,
    pub account_number: String,
    pub bank: Bank,
    pub side: AccountSide,
    pub amount: f64,
    pub balance: f64,
    pub description: String,
    pub date: Date,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    /// Whether this row is one leg of a transfer between two of the user's
    /// own accounts.
    pub is_internal_transfer: bool,
}

/// Get the ledger rows of every account owned by `owner_id` dated within
/// `start..=end`, oldest first.
pub fn get_account_ledger_rows(
    owner_id: UserID,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<AccountLedgerRow>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.account_id, a.number, a.bank, t.side, t.amount, t.balance,
                t.description, t.date, t.category_id, c.name,
                COALESCE(counterpart.owner_id = a.owner_id, 0)
            FROM account_transaction t
            INNER JOIN account a ON a.id = t.account_id
            LEFT JOIN account counterpart ON counterpart.id = t.counterpart_account_id
            LEFT JOIN category c ON c.id = t.category_id
            WHERE a.owner_id = ?1 AND t.date BETWEEN ?2 AND ?3
            ORDER BY t.date ASC, t.id ASC",
        )?
        .query_map((owner_id.as_i64(), start, end), |row| {
            let raw_bank: String = row.get(3)?;
            let bank = raw_bank.parse().map_err(|_| {
                rusqlite::Error::InvalidColumnType(3, "bank".to_owned(), Type::Text)
            })?;

            Ok(AccountLedgerRow {
                id: row.get(0)?,
                account_id: row.get(1)?,
                account_number: row.get(2)?,
                bank,
                side: parse_side(row, 4)?,
                amount: row.get(5)?,
                balance: row.get(6)?,
                description: row.get(7)?,
                date: row.get(8)?,
                category_id: row.get(9)?,
                category_name: row.get(10)?,
                is_internal_transfer: row.get(11)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

/// The sum of the latest snapshot dated on or before `date` for each
/// account owned by `owner_id`.
///
/// Accounts without a ledger row by then count as zero.
pub fn get_bank_balance_at(
    owner_id: UserID,
    date: Date,
    connection: &Connection,
) -> Result<f64, Error> {
    let balance = connection.query_row(
        "SELECT COALESCE(SUM(t.balance), 0)
        FROM account_transaction t
        INNER JOIN account a ON a.id = t.account_id
        WHERE a.owner_id = ?1
            AND t.id = (
                SELECT latest.id FROM account_transaction latest
                WHERE latest.account_id = t.account_id AND latest.date <= ?2
                ORDER BY latest.date DESC, latest.id DESC
                LIMIT 1
            )",
        (owner_id.as_i64(), date),
        |row| row.get(0),
    )?;

    Ok(balance)
}

/// Per-month totals for one account.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyStatistics {
    pub year: i32,
    pub month: u8,
    pub transaction_count: u32,
    pub deposits: f64,
    pub withdrawals: f64,
}

/// Totals for each month from the month of `from` onwards, oldest first.
/// Months without rows are omitted.
pub fn get_monthly_statistics(
    account_id: AccountId,
    from: Date,
    connection: &Connection,
) -> Result<Vec<MonthlyStatistics>, Error> {
    let first_of_month = from.replace_day(1).unwrap_or(from);

    connection
        .prepare(
            "SELECT CAST(strftime('%Y', date) AS INTEGER), CAST(strftime('%m', date) AS INTEGER),
                COUNT(1),
                COALESCE(SUM(CASE WHEN side = 'deposit' THEN amount END), 0),
                COALESCE(SUM(CASE WHEN side = 'withdrawal' THEN amount END), 0)
            FROM account_transaction
            WHERE account_id = ?1 AND date >= ?2
            GROUP BY strftime('%Y-%m', date)
            ORDER BY strftime('%Y-%m', date) ASC",
        )?
        .query_map((account_id, first_of_month), |row| {
            Ok(MonthlyStatistics {
                year: row.get(0)?,
                month: row.get(1)?,
                transaction_count: row.get(2)?,
                deposits: row.get(3)?,
                withdrawals: row.get(4)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}
