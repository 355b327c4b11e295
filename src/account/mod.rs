//! Bank accounts with PINs, and the pages for managing them.

mod accounts_page;
mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod detail_page;
mod lookup;
mod pin;
mod pin_page;

pub use accounts_page::get_accounts_page;
pub(crate) use core::set_account_balance;
#[cfg(test)]
pub(crate) use core::test_utils;
pub use core::{
    Account, AccountId, Bank, NewAccount, create_account, create_account_table, delete_account,
    get_account, get_account_by_number, get_accounts, get_total_account_balance,
    update_account_pin, validate_account_number,
};
pub use create_endpoint::create_account_endpoint;
pub(crate) use create_page::pin_input;
pub use create_page::get_create_account_page;
pub use delete_endpoint::delete_account_endpoint;
pub use detail_page::get_account_detail_page;
pub use lookup::lookup_account_endpoint;
pub use pin::{AccountPin, PIN_HASH_COST, PinHash};
pub use pin_page::{change_account_pin_endpoint, get_account_pin_page};
