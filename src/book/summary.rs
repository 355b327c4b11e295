//! Monthly totals and balances for the account book.

use rusqlite::Connection;

use crate::{
    Error, UserID,
    account_ledger::get_bank_balance_at,
    book::{LedgerEntry, get_ledger_entries},
    cash::get_cash_balance_at,
    category::CategoryKind,
    period::YearMonth,
};

/// Everything the account book shows for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub month: YearMonth,
    /// Rows from both ledgers, newest first.
    pub entries: Vec<LedgerEntry>,
    /// Cash income plus every deposit, transfer legs included.
    pub income: f64,
    /// Cash expenses plus every withdrawal, transfer legs included.
    pub expense: f64,
    /// The last cash snapshot on or before the end of the month.
    pub cash_balance: f64,
    /// The sum of each account's last snapshot on or before the end of the month.
    pub bank_balance: f64,
}

impl MonthSummary {
    pub fn total_assets(&self) -> f64 {
        self.cash_balance + self.bank_balance
    }
}

/// Sum the amounts of `kind` in `entries`.
///
/// The book mirrors the ledgers, so both legs of a transfer between the
/// user's own accounts count. The dashboard is where they are left out.
pub fn total_of_kind(entries: &[LedgerEntry], kind: CategoryKind) -> f64 {
    entries
        .iter()
        .filter(|entry| entry.kind == kind)
        .map(|entry| entry.amount)
        .sum()
}

pub fn get_month_summary(
    user_id: UserID,
    month: YearMonth,
    connection: &Connection,
) -> Result<MonthSummary, Error> {
    let entries = get_ledger_entries(user_id, month.first_day(), month.last_day(), connection)?;

    Ok(MonthSummary {
        month,
        income: total_of_kind(&entries, CategoryKind::Income),
        expense: total_of_kind(&entries, CategoryKind::Expense),
        cash_balance: get_cash_balance_at(user_id, month.last_day(), connection)?,
        bank_balance: get_bank_balance_at(user_id, month.last_day(), connection)?,
        entries,
    })
}
