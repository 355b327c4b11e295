//! The monthly account book that combines the cash and account ledgers.

mod entry;
mod page;
mod summary;

pub use entry::{LedgerEntry, LedgerSource, get_ledger_entries};
pub use page::get_book_page;
pub use summary::{MonthSummary, get_month_summary};
