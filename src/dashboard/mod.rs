//! Dashboard module
//!
//! Provides an overview page with income and expense totals and charts for a
//! date range.

mod aggregation;
mod charts;
mod handlers;
mod tables;

pub use handlers::get_dashboard_page;
