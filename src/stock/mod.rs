//! Brokerage accounts, holdings and their valuation.

mod core;
mod create_account;
mod create_holding;
mod delete_holding;
mod holdings_page;
mod quote;
mod quote_endpoint;
mod valuation;

#[cfg(test)]
pub(crate) use core::test_utils;
pub use core::{
    Currency, HoldingRow, NewStockAccount, NewStockHolding, StockAccount, StockAccountId,
    StockHoldingId, add_stock_holding, create_stock_account, create_stock_tables,
    delete_stock_holding, get_holdings, get_stock_accounts,
};
pub use create_account::{create_stock_account_endpoint, get_create_stock_account_page};
pub use create_holding::{create_holding_endpoint, get_create_holding_page};
pub use delete_holding::delete_holding_endpoint;
pub use holdings_page::get_stocks_page;
pub use quote::{QuoteSource, StoredQuotes, upsert_quote};
pub use quote_endpoint::record_quote_endpoint;
pub use valuation::{CurrencyTotals, HoldingValuation, totals_by_currency, value_holdings};
