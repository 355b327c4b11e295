//! The cash ledger: income and expenses paid in cash or by card, each row
//! carrying the running cash balance at the time it was written.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row, ToSql, types::Type};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, UserID,
    account_ledger::validate_amount_and_date,
    category::{CategoryId, CategoryKind, validate_category},
};

pub type CashTransactionId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashSide {
    Income,
    Expense,
}

impl CashSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashSide::Income => "income",
            CashSide::Expense => "expense",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CashSide::Income => "Income",
            CashSide::Expense => "Expense",
        }
    }

    pub fn category_kind(&self) -> CategoryKind {
        match self {
            CashSide::Income => CategoryKind::Income,
            CashSide::Expense => CategoryKind::Expense,
        }
    }

    /// Apply a movement of `amount` to `balance`.
    pub fn apply(&self, balance: f64, amount: f64) -> f64 {
        match self {
            CashSide::Income => balance + amount,
            CashSide::Expense => balance - amount,
        }
    }
}

impl FromStr for CashSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(CashSide::Income),
            "expense" => Ok(CashSide::Expense),
            _ => Err(Error::NotFound),
        }
    }
}

impl Display for CashSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A row in a user's cash ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct CashTransaction {
    pub id: CashTransactionId,
    pub user_id: UserID,
    pub side: CashSide,
    pub amount: f64,
    pub date: Date,
    /// The user's cash balance right after this row was recorded.
    pub balance: f64,
    pub description: String,
    pub memo: String,
    /// Free text describing how the money moved, e.g. "Cash" or "Card".
    pub asset_type: String,
    pub category_id: Option<CategoryId>,
}

/// A cash row before it is written to the database.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCashTransaction {
    pub side: CashSide,
    pub amount: f64,
    pub date: Date,
    pub description: String,
    pub memo: String,
    pub asset_type: String,
    pub category_id: Option<CategoryId>,
}

/// A cash row with its category name.
#[derive(Debug, Clone, PartialEq)]
pub struct CashLedgerRow {
    pub transaction: CashTransaction,
    pub category_name: Option<String>,
}

pub fn create_cash_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS cash_transaction (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            side TEXT NOT NULL CHECK (side IN ('income', 'expense')),
            amount REAL NOT NULL CHECK (amount > 0),
            date TEXT NOT NULL,
            balance REAL NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            memo TEXT NOT NULL DEFAULT '',
            asset_type TEXT NOT NULL DEFAULT '',
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_cash_transaction_user_date
            ON cash_transaction(user_id, date);",
    )?;

    Ok(())
}

/// The snapshot of the user's most recent cash row, or zero without any rows.
pub fn get_latest_cash_balance(user_id: UserID, connection: &Connection) -> Result<f64, Error> {
    let balance = connection.query_row(
        "SELECT COALESCE((
            SELECT balance FROM cash_transaction
            WHERE user_id = ?1
            ORDER BY date DESC, id DESC
            LIMIT 1
        ), 0)",
        [user_id.as_i64()],
        |row| row.get(0),
    )?;

    Ok(balance)
}

/// The snapshot of the user's last cash row dated on or before `date`.
pub fn get_cash_balance_at(
    user_id: UserID,
    date: Date,
    connection: &Connection,
) -> Result<f64, Error> {
    let balance = connection.query_row(
        "SELECT COALESCE((
            SELECT balance FROM cash_transaction
            WHERE user_id = ?1 AND date <= ?2
            ORDER BY date DESC, id DESC
            LIMIT 1
        ), 0)",
        (user_id.as_i64(), date),
        |row| row.get(0),
    )?;

    Ok(balance)
}

fn insert_cash_transaction(
    user_id: UserID,
    new_transaction: NewCashTransaction,
    balance: f64,
    connection: &Connection,
) -> Result<CashTransaction, Error> {
    connection.execute(
        "INSERT INTO cash_transaction
            (user_id, side, amount, date, balance, description, memo, asset_type, category_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        (
            user_id.as_i64(),
            new_transaction.side.as_str(),
            new_transaction.amount,
            new_transaction.date,
            balance,
            &new_transaction.description,
            &new_transaction.memo,
            &new_transaction.asset_type,
            new_transaction.category_id,
        ),
    )?;

    Ok(CashTransaction {
        id: connection.last_insert_rowid(),
        user_id,
        side: new_transaction.side,
        amount: new_transaction.amount,
        date: new_transaction.date,
        balance,
        description: new_transaction.description,
        memo: new_transaction.memo,
        asset_type: new_transaction.asset_type,
        category_id: new_transaction.category_id,
    })
}

/// Record a single cash row. Its snapshot is the latest snapshot plus or
/// minus the amount.
///
/// # Errors
///
/// Returns [Error::NonPositiveAmount], [Error::FutureDate] or
/// [Error::InvalidCategory] for invalid input.
pub fn create_cash_transaction(
    user_id: UserID,
    new_transaction: NewCashTransaction,
    today: Date,
    connection: &Connection,
) -> Result<CashTransaction, Error> {
    validate_amount_and_date(new_transaction.amount, new_transaction.date, today)?;

    let transaction = connection.unchecked_transaction()?;

    validate_category(
        user_id,
        new_transaction.category_id,
        new_transaction.side.category_kind(),
        &transaction,
    )?;
    let balance = new_transaction
        .side
        .apply(get_latest_cash_balance(user_id, &transaction)?, new_transaction.amount);
    let created = insert_cash_transaction(user_id, new_transaction, balance, &transaction)?;

    transaction.commit()?;

    Ok(created)
}

/// Insert many cash rows in date order inside one SQL transaction so that
/// their snapshots chain from the current balance.
///
/// The rows are expected to be validated already.
pub fn create_cash_transactions(
    user_id: UserID,
    mut new_transactions: Vec<NewCashTransaction>,
    connection: &Connection,
) -> Result<Vec<CashTransaction>, Error> {
    new_transactions.sort_by_key(|new_transaction| new_transaction.date);

    let transaction = connection.unchecked_transaction()?;
    let mut balance = get_latest_cash_balance(user_id, &transaction)?;
    let mut created = Vec::with_capacity(new_transactions.len());

    for new_transaction in new_transactions {
        balance = new_transaction.side.apply(balance, new_transaction.amount);
        created.push(insert_cash_transaction(
            user_id,
            new_transaction,
            balance,
            &transaction,
        )?);
    }

    transaction.commit()?;

    Ok(created)
}

/// Delete the rows in `ids` that belong to `user_id`, returning how many were deleted.
pub fn delete_cash_transactions(
    user_id: UserID,
    ids: &[CashTransactionId],
    connection: &Connection,
) -> Result<usize, Error> {
    let transaction = connection.unchecked_transaction()?;
    let mut deleted = 0;

    {
        let mut statement =
            transaction.prepare("DELETE FROM cash_transaction WHERE id = ?1 AND user_id = ?2")?;
        for id in ids {
            deleted += statement.execute((id, user_id.as_i64()))?;
        }
    }

    transaction.commit()?;

    Ok(deleted)
}

/// Filters for [search_cash_transactions]. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CashSearch {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub side: Option<CashSide>,
    pub category_id: Option<CategoryId>,
    pub amount: Option<f64>,
}

fn map_row(row: &Row) -> Result<CashLedgerRow, rusqlite::Error> {
    let raw_side: String = row.get(2)?;
    let side = raw_side
        .parse()
        .map_err(|_| rusqlite::Error::InvalidColumnType(2, "side".to_owned(), Type::Text))?;

    Ok(CashLedgerRow {
        transaction: CashTransaction {
            id: row.get(0)?,
            user_id: UserID::new(row.get(1)?),
            side,
            amount: row.get(3)?,
            date: row.get(4)?,
            balance: row.get(5)?,
            description: row.get(6)?,
            memo: row.get(7)?,
            asset_type: row.get(8)?,
            category_id: row.get(9)?,
        },
        category_name: row.get(10)?,
    })
}

/// Get the user's cash rows matching `search`, newest first.
pub fn search_cash_transactions(
    user_id: UserID,
    search: &CashSearch,
    connection: &Connection,
) -> Result<Vec<CashLedgerRow>, Error> {
    let mut sql = String::from(
        "SELECT t.id, t.user_id, t.side, t.amount, t.date, t.balance, t.description, t.memo,
            t.asset_type, t.category_id, c.name
        FROM cash_transaction t
        LEFT JOIN category c ON c.id = t.category_id
        WHERE t.user_id = ?1",
    );
    let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(user_id.as_i64())];

    if let Some(start_date) = search.start_date {
        params.push(Box::new(start_date));
        sql.push_str(&format!(" AND t.date >= ?{}", params.len()));
    }

    if let Some(end_date) = search.end_date {
        params.push(Box::new(end_date));
        sql.push_str(&format!(" AND t.date <= ?{}", params.len()));
    }

    if let Some(side) = search.side {
        params.push(Box::new(side.as_str()));
        sql.push_str(&format!(" AND t.side = ?{}", params.len()));
    }

    if let Some(category_id) = search.category_id {
        params.push(Box::new(category_id));
        sql.push_str(&format!(" AND t.category_id = ?{}", params.len()));
    }

    if let Some(amount) = search.amount {
        params.push(Box::new(amount));
        sql.push_str(&format!(" AND t.amount = ?{}", params.len()));
    }

    sql.push_str(" ORDER BY t.date DESC, t.id DESC");

    let param_refs: Vec<&dyn ToSql> = params.iter().map(|param| param.as_ref()).collect();

    connection
        .prepare(&sql)?
        .query_map(param_refs.as_slice(), map_row)?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_utils {
    use rusqlite::Connection;
    use time::Date;

    use crate::{
        UserID,
        cash::{CashSide, NewCashTransaction, create_cash_transactions},
    };

    use super::CashTransaction;

    /// Insert an uncategorised cash row without validation.
    #[track_caller]
    pub(crate) fn insert_test_cash(
        user_id: UserID,
        side: CashSide,
        amount: f64,
        date: Date,
        connection: &Connection,
    ) -> CashTransaction {
        create_cash_transactions(
            user_id,
            vec![NewCashTransaction {
                side,
                amount,
                date,
                description: "test".to_owned(),
                memo: String::new(),
                asset_type: "Cash".to_owned(),
                category_id: None,
            }],
            connection,
        )
        .expect("Could not insert test cash transaction")
        .remove(0)
    }
}

#[cfg(test)]
mod cash_tests {
    use time::macros::date;

    use crate::{
        Error,
        cash::{
            CashSearch, CashSide, NewCashTransaction, create_cash_transaction,
            create_cash_transactions, delete_cash_transactions, get_cash_balance_at,
            search_cash_transactions, test_utils::insert_test_cash,
        },
        category::{CategoryKind, find_category_by_name},
        test_utils::{get_test_connection, insert_test_user},
    };

    use super::get_latest_cash_balance;

    const TODAY: time::Date = date!(2025 - 06 - 30);

    fn new_cash(side: CashSide, amount: f64, date: time::Date) -> NewCashTransaction {
        NewCashTransaction {
            side,
            amount,
            date,
            description: "lunch".to_owned(),
            memo: String::new(),
            asset_type: "Card".to_owned(),
            category_id: None,
        }
    }

    #[test]
    fn snapshots_chain_from_latest_balance() {
        let connection = get_test_connection();
        let user = insert_test_user("test", &connection);

        let first = create_cash_transaction(
            user.id,
            new_cash(CashSide::Income, 1_000.0, date!(2025 - 06 - 01)),
            TODAY,
            &connection,
        )
        .unwrap();
        let second = create_cash_transaction(
            user.id,
            new_cash(CashSide::Expense, 300.0, date!(2025 - 06 - 02)),
            TODAY,
            &connection,
        )
        .unwrap();

        assert_eq!(first.balance, 1_000.0);
        assert_eq!(second.balance, 700.0);
        assert_eq!(get_latest_cash_balance(user.id, &connection), Ok(700.0));
    }

    #[test]
    fn balances_are_per_user() {
        let connection = get_test_connection();
        let alice = insert_test_user("alice", &connection);
        let bob = insert_test_user("bob", &connection);
        insert_test_cash(alice.id, CashSide::Income, 500.0, date!(2025 - 06 - 01), &connection);

        let bob_row = insert_test_cash(bob.id, CashSide::Income, 10.0, date!(2025 - 06 - 01), &connection);

        assert_eq!(bob_row.balance, 10.0);
    }

    #[test]
    fn rejects_invalid_rows() {
        let connection = get_test_connection();
        let user = insert_test_user("test", &connection);
        let salary = find_category_by_name(user.id, "Salary", CategoryKind::Income, &connection)
            .unwrap()
            .unwrap();
        let mut expense_with_income_category =
            new_cash(CashSide::Expense, 10.0, date!(2025 - 06 - 01));
        expense_with_income_category.category_id = Some(salary.id);

        let cases = [
            (
                new_cash(CashSide::Expense, -5.0, date!(2025 - 06 - 01)),
                Error::NonPositiveAmount,
            ),
            (
                new_cash(CashSide::Expense, 5.0, date!(2025 - 07 - 01)),
                Error::FutureDate(date!(2025 - 07 - 01)),
            ),
            (
                expense_with_income_category,
                Error::InvalidCategory(Some(salary.id)),
            ),
        ];

        for (new_transaction, want) in cases {
            assert_eq!(
                create_cash_transaction(user.id, new_transaction, TODAY, &connection),
                Err(want)
            );
        }
    }

    #[test]
    fn bulk_insert_chains_in_date_order() {
        let connection = get_test_connection();
        let user = insert_test_user("test", &connection);

        let created = create_cash_transactions(
            user.id,
            vec![
                new_cash(CashSide::Expense, 100.0, date!(2025 - 06 - 03)),
                new_cash(CashSide::Income, 1_000.0, date!(2025 - 06 - 01)),
            ],
            &connection,
        )
        .unwrap();

        let snapshots: Vec<(time::Date, f64)> =
            created.iter().map(|row| (row.date, row.balance)).collect();
        assert_eq!(
            snapshots,
            [(date!(2025 - 06 - 01), 1_000.0), (date!(2025 - 06 - 03), 900.0)]
        );
    }

    #[test]
    fn balance_at_date_uses_last_row_on_or_before() {
        let connection = get_test_connection();
        let user = insert_test_user("test", &connection);
        insert_test_cash(user.id, CashSide::Income, 1_000.0, date!(2025 - 05 - 10), &connection);
        insert_test_cash(user.id, CashSide::Expense, 400.0, date!(2025 - 06 - 10), &connection);

        assert_eq!(get_cash_balance_at(user.id, date!(2025 - 04 - 30), &connection), Ok(0.0));
        assert_eq!(get_cash_balance_at(user.id, date!(2025 - 05 - 31), &connection), Ok(1_000.0));
        assert_eq!(get_cash_balance_at(user.id, date!(2025 - 06 - 30), &connection), Ok(600.0));
    }

    #[test]
    fn delete_only_removes_own_rows() {
        let connection = get_test_connection();
        let alice = insert_test_user("alice", &connection);
        let bob = insert_test_user("bob", &connection);
        let alice_row =
            insert_test_cash(alice.id, CashSide::Income, 10.0, date!(2025 - 06 - 01), &connection);
        let bob_row =
            insert_test_cash(bob.id, CashSide::Income, 10.0, date!(2025 - 06 - 01), &connection);

        let deleted =
            delete_cash_transactions(alice.id, &[alice_row.id, bob_row.id], &connection).unwrap();

        assert_eq!(deleted, 1);
        let bob_rows = search_cash_transactions(bob.id, &CashSearch::default(), &connection).unwrap();
        assert_eq!(bob_rows.len(), 1);
    }

    #[test]
    fn search_combines_filters() {
        let connection = get_test_connection();
        let user = insert_test_user("test", &connection);
        insert_test_cash(user.id, CashSide::Income, 1_000.0, date!(2025 - 05 - 31), &connection);
        insert_test_cash(user.id, CashSide::Expense, 50.0, date!(2025 - 06 - 01), &connection);
        insert_test_cash(user.id, CashSide::Expense, 70.0, date!(2025 - 06 - 15), &connection);
        insert_test_cash(user.id, CashSide::Income, 70.0, date!(2025 - 06 - 20), &connection);

        let june_expenses = search_cash_transactions(
            user.id,
            &CashSearch {
                start_date: Some(date!(2025 - 06 - 01)),
                end_date: Some(date!(2025 - 06 - 30)),
                side: Some(CashSide::Expense),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();
        let seventies = search_cash_transactions(
            user.id,
            &CashSearch {
                amount: Some(70.0),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        let amounts: Vec<f64> = june_expenses
            .iter()
            .map(|row| row.transaction.amount)
            .collect();
        assert_eq!(amounts, [70.0, 50.0]);
        let dates: Vec<time::Date> = seventies.iter().map(|row| row.transaction.date).collect();
        assert_eq!(dates, [date!(2025 - 06 - 20), date!(2025 - 06 - 15)]);
    }
}
