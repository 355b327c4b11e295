//! A single view over both ledgers, used wherever cash and account rows are
//! shown or summed together.

use rusqlite::Connection;
use time::Date;

use crate::{
    Error, UserID,
    account_ledger::{AccountLedgerRow, get_account_ledger_rows},
    cash::{CashLedgerRow, CashSearch, search_cash_transactions},
    category::{CategoryId, CategoryKind},
};

/// Which ledger a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerSource {
    Cash,
    Account,
}

impl LedgerSource {
    pub fn label(&self) -> &'static str {
        match self {
            LedgerSource::Cash => "Cash",
            LedgerSource::Account => "Account",
        }
    }
}

/// A row from either ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub source: LedgerSource,
    /// The row ID within its own ledger.
    pub id: i64,
    pub date: Date,
    /// Income for cash income and deposits, expense for the rest.
    pub kind: CategoryKind,
    /// "Income"/"Expense" for cash rows, "Deposit"/"Withdrawal" for account rows.
    pub side_label: &'static str,
    pub amount: f64,
    pub balance: f64,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub description: String,
    pub memo: String,
    /// The asset type of a cash row or the bank and number of an account row.
    pub asset: String,
    /// Set for the legs of a transfer between two of the user's own accounts.
    pub is_internal_transfer: bool,
}

impl LedgerEntry {
    /// The amount with a negative sign for expenses.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            CategoryKind::Income => self.amount,
            CategoryKind::Expense => -self.amount,
        }
    }
}

impl From<CashLedgerRow> for LedgerEntry {
    fn from(row: CashLedgerRow) -> Self {
        let transaction = row.transaction;
        let kind = transaction.side.category_kind();

        Self {
            source: LedgerSource::Cash,
            id: transaction.id,
            date: transaction.date,
            kind,
            side_label: transaction.side.label(),
            amount: transaction.amount,
            balance: transaction.balance,
            category_id: transaction.category_id,
            category_name: row.category_name,
            description: transaction.description,
            memo: transaction.memo,
            asset: transaction.asset_type,
            is_internal_transfer: false,
        }
    }
}

impl From<AccountLedgerRow> for LedgerEntry {
    fn from(row: AccountLedgerRow) -> Self {
        Self {
            source: LedgerSource::Account,
            id: row.id,
            date: row.date,
            kind: row.side.category_kind(),
            side_label: row.side.label(),
            amount: row.amount,
            balance: row.balance,
            category_id: row.category_id,
            category_name: row.category_name,
            description: row.description,
            memo: String::new(),
            asset: format!("{} {}", row.bank.name(), row.account_number),
            is_internal_transfer: row.is_internal_transfer,
        }
    }
}

/// Get the rows of both ledgers dated within `start..=end`, newest first.
///
/// Rows on the same date keep account rows before cash rows.
pub fn get_ledger_entries(
    user_id: UserID,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    let cash_rows = search_cash_transactions(
        user_id,
        &CashSearch {
            start_date: Some(start),
            end_date: Some(end),
            ..Default::default()
        },
        connection,
    )?;
    let account_rows = get_account_ledger_rows(user_id, start, end, connection)?;

    let mut entries: Vec<LedgerEntry> = account_rows
        .into_iter()
        .rev()
        .map(LedgerEntry::from)
        .chain(cash_rows.into_iter().map(LedgerEntry::from))
        .collect();
    // Stable sort, each ledger is already newest first.
    entries.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(entries)
}

#[cfg(test)]
mod ledger_entry_tests {
    use time::macros::date;

    use crate::{
        account::test_utils::insert_test_account,
        book::{LedgerSource, get_ledger_entries},
        cash::{CashSide, test_utils::insert_test_cash},
        category::CategoryKind,
        test_utils::{get_test_connection, insert_test_user},
    };

    #[test]
    fn combines_both_ledgers_newest_first() {
        let connection = get_test_connection();
        let user = insert_test_user("test", &connection);
        // Opens with a deposit dated 2025-01-01.
        insert_test_account(user.id, "110-1", 1_000.0, &connection);
        insert_test_cash(user.id, CashSide::Expense, 30.0, date!(2025 - 01 - 05), &connection);
        insert_test_cash(user.id, CashSide::Income, 5.0, date!(2024 - 12 - 31), &connection);

        let entries =
            get_ledger_entries(user.id, date!(2025 - 01 - 01), date!(2025 - 01 - 31), &connection)
                .unwrap();

        let summary: Vec<(LedgerSource, CategoryKind, f64)> = entries
            .iter()
            .map(|entry| (entry.source, entry.kind, entry.signed_amount()))
            .collect();
        assert_eq!(
            summary,
            [
                (LedgerSource::Cash, CategoryKind::Expense, -30.0),
                (LedgerSource::Account, CategoryKind::Income, 1_000.0),
            ]
        );
        assert_eq!(entries[1].asset, "Shinhan Bank 110-1");
    }
}
