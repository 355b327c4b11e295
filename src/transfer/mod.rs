//! Sending money between bank accounts.

mod core;
mod form_page;
mod history_page;
mod success_page;
mod transfer_endpoint;

pub use core::{
    MINIMUM_TRANSFER_AMOUNT, TransferDetail, TransferId, TransferParty, TransferRequest,
    create_transfer, create_transfer_table, get_transfer, get_transfer_history,
};
pub use form_page::get_transfer_page;
pub use history_page::get_transfer_history_page;
pub use success_page::get_transfer_detail_page;
pub use transfer_endpoint::create_transfer_endpoint;
