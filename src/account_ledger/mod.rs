//! Deposits, withdrawals and transfer legs for bank accounts.

mod core;
mod record_endpoint;

pub use core::{
    AccountEntry, AccountLedgerRow, AccountSide, AccountTransaction, MonthlyStatistics,
    NewAccountTransaction, create_account_transaction_table, get_account_ledger_rows,
    get_account_transactions, get_bank_balance_at, get_monthly_statistics,
    record_account_transaction, validate_amount_and_date,
};
pub(crate) use core::insert_account_transaction;
pub use record_endpoint::record_account_transaction_endpoint;
