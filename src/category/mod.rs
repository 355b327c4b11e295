//! Income and expense categories for labelling ledger rows.

mod create;
mod db;
mod delete;
mod domain;
mod json;
mod page;

pub use create::create_category_endpoint;
pub use db::{
    count_transactions_per_category, create_category, create_category_table, delete_category,
    find_category_by_name, get_all_categories, get_categories_by_kind, seed_default_categories,
    validate_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryId, CategoryKind, CategoryName};
pub use json::get_categories_json;
pub(crate) use page::category_select;
pub use page::get_categories_page;
