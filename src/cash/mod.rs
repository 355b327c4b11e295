//! The cash ledger and its endpoints.

mod bulk;
mod core;
mod create;
mod delete;
mod search;

pub use bulk::create_bulk_cash_endpoint;
#[cfg(test)]
pub(crate) use core::test_utils;
pub use core::{
    CashLedgerRow, CashSearch, CashSide, CashTransactionId, NewCashTransaction,
    create_cash_transaction, create_cash_transaction_table, create_cash_transactions,
    delete_cash_transactions, get_cash_balance_at, search_cash_transactions,
};
pub use create::create_cash_endpoint;
pub use delete::delete_cash_endpoint;
pub use search::search_cash_endpoint;
