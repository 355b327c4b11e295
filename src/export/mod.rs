//! Downloads and printable reports of the user's ledgers.

mod csv_export;
mod statement;

pub use csv_export::export_csv_endpoint;
pub use statement::get_statement_page;
