//! Table views for dashboard data display.
//!
//! Provides the summary, category, monthly and recent transaction tables.

use maud::{Markup, html};

use crate::{
    book::LedgerEntry,
    dashboard::aggregation::{CategoryTotal, MonthlyTotals, Totals, UNCATEGORIZED},
    html::{TABLE_CELL_STYLE, TABLE_ROW_STYLE, format_currency, format_description},
};

// Table cell styles
const TABLE_HEAD_STYLE: &str =
    "text-xs text-gray-900 uppercase bg-gray-100 dark:bg-gray-700 dark:text-gray-400";
const TABLE_HEADER_CELL_STYLE: &str = "px-3 py-3 text-center min-w-[100px]";
const TABLE_STICKY_CELL_STYLE: &str = "px-3 py-4 font-medium text-gray-900 dark:text-white sticky left-0 bg-white dark:bg-gray-800 z-10";
const TABLE_DATA_CELL_STYLE: &str = "text-center whitespace-nowrap";
const TABLE_CELL_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const TABLE_CELL_RED_STYLE: &str = "text-red-600 dark:text-red-400";

/// Gets the CSS class for coloring amounts (green for positive, red for negative).
fn amount_color_class(amount: f64) -> &'static str {
    if amount >= 0.0 {
        TABLE_CELL_GREEN_STYLE
    } else {
        TABLE_CELL_RED_STYLE
    }
}

/// Total income, expense and net balance for the range.
pub(super) fn summary_table(totals: &Totals) -> Markup {
    html! {
        div id="summary" {
            h3 class="text-xl font-semibold mb-4" { "Summary" }

            div class="overflow-x-auto rounded-lg shadow" {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" {
                    tbody {
                        tr class=(TABLE_ROW_STYLE) {
                            th scope="row" class=(TABLE_STICKY_CELL_STYLE) { "Income" }
                            td class={(TABLE_CELL_STYLE) " " (TABLE_DATA_CELL_STYLE) " " (TABLE_CELL_GREEN_STYLE)}
                                data-total="income"
                            { (format_currency(totals.income)) }
                        }
                        tr class=(TABLE_ROW_STYLE) {
                            th scope="row" class=(TABLE_STICKY_CELL_STYLE) { "Expenses" }
                            td class={(TABLE_CELL_STYLE) " " (TABLE_DATA_CELL_STYLE) " " (TABLE_CELL_RED_STYLE)}
                                data-total="expense"
                            { (format_currency(totals.expense)) }
                        }
                        tr class=(TABLE_ROW_STYLE) {
                            th scope="row" class=(TABLE_STICKY_CELL_STYLE) { "Net" }
                            td class={(TABLE_CELL_STYLE) " " (TABLE_DATA_CELL_STYLE) " font-bold " (amount_color_class(totals.net()))}
                                data-total="net"
                            { (format_currency(totals.net())) }
                        }
                    }
                }
            }
        }
    }
}

pub(super) fn category_table(totals: &[CategoryTotal]) -> Markup {
    html! {
        div id="expense-categories" {
            h3 class="text-xl font-semibold mb-4" { "Expenses by Category" }

            div class="overflow-x-auto rounded-lg shadow" {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" {
                    thead class=(TABLE_HEAD_STYLE) {
                        tr {
                            th scope="col" class=(TABLE_HEADER_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_HEADER_CELL_STYLE) { "Total" }
                        }
                    }
                    tbody {
                        @for total in totals {
                            tr class=(TABLE_ROW_STYLE) data-category=(total.name) {
                                th scope="row" class=(TABLE_STICKY_CELL_STYLE) { (total.name) }
                                td class={(TABLE_CELL_STYLE) " " (TABLE_DATA_CELL_STYLE)} { (format_currency(total.total)) }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Income, expenses and net income for each month in the range.
pub(super) fn monthly_table(series: &[MonthlyTotals]) -> Markup {
    html! {
        div {
            h3 class="text-xl font-semibold mb-4" { "Monthly Summary" }

            div
                id="monthly-summary-table"
                class="overflow-x-auto rounded-lg shadow"
                dir="rtl"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" dir="ltr" {
                    thead class=(TABLE_HEAD_STYLE) {
                        tr {
                            th scope="col" class=(TABLE_HEADER_CELL_STYLE) { "" }
                            @for totals in series {
                                th scope="col" class={(TABLE_HEADER_CELL_STYLE) " font-semibold"} {
                                    (totals.month.label())
                                }
                            }
                        }
                    }
                    tbody {
                        tr class=(TABLE_ROW_STYLE) {
                            th scope="row" class=(TABLE_STICKY_CELL_STYLE) { "Income" }
                            @for totals in series {
                                td class={(TABLE_CELL_STYLE) " " (TABLE_DATA_CELL_STYLE) " " (TABLE_CELL_GREEN_STYLE)} {
                                    (format_currency(totals.income))
                                }
                            }
                        }

                        tr class=(TABLE_ROW_STYLE) {
                            th scope="row" class=(TABLE_STICKY_CELL_STYLE) { "Expenses" }
                            @for totals in series {
                                td class={(TABLE_CELL_STYLE) " " (TABLE_DATA_CELL_STYLE) " " (TABLE_CELL_RED_STYLE)} {
                                    (format_currency(totals.expense))
                                }
                            }
                        }

                        tr class=(TABLE_ROW_STYLE) {
                            th scope="row" class=(TABLE_STICKY_CELL_STYLE) { "Net Income" }
                            @for totals in series {
                                @let net = totals.income - totals.expense;
                                td class={(TABLE_CELL_STYLE) " " (TABLE_DATA_CELL_STYLE) " " (amount_color_class(net))} {
                                    (format_currency(net))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// The latest entries of one kind, e.g. recent income.
pub(super) fn recent_table(id: &str, title: &str, entries: &[&LedgerEntry]) -> Markup {
    html! {
        div id=(id) {
            h3 class="text-xl font-semibold mb-4" { (title) }

            div class="overflow-x-auto rounded-lg shadow" {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" {
                    thead class=(TABLE_HEAD_STYLE) {
                        tr {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class="px-6 py-3 text-right" { "Amount" }
                        }
                    }
                    tbody {
                        @for entry in entries {
                            tr class=(TABLE_ROW_STYLE) {
                                td class=(TABLE_CELL_STYLE) { (entry.date) }
                                td class=(TABLE_CELL_STYLE) title=(entry.description) {
                                    (format_description(&entry.description))
                                }
                                td class=(TABLE_CELL_STYLE) {
                                    (entry.category_name.as_deref().unwrap_or(UNCATEGORIZED))
                                }
                                td class="px-6 py-4 text-right tabular-nums" { (format_currency(entry.amount)) }
                            }
                        }

                        @if entries.is_empty() {
                            tr class=(TABLE_ROW_STYLE) {
                                td colspan="4" class="px-6 py-4 text-center" { "Nothing in this period." }
                            }
                        }
                    }
                }
            }
        }
    }
}
