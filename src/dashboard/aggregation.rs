//! Sums ledger entries into the figures shown on the dashboard.

use std::collections::HashMap;

use time::Date;

use crate::{book::LedgerEntry, category::CategoryKind, period::YearMonth};

/// The label for entries without a category.
pub(super) const UNCATEGORIZED: &str = "Uncategorized";

/// Income and expense over the whole range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct Totals {
    pub income: f64,
    pub expense: f64,
}

impl Totals {
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct CategoryTotal {
    pub name: String,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct MonthlyTotals {
    pub month: YearMonth,
    pub income: f64,
    pub expense: f64,
}

/// Drop the legs of transfers between the user's own accounts.
pub(super) fn reportable_entries(entries: Vec<LedgerEntry>) -> Vec<LedgerEntry> {
    entries
        .into_iter()
        .filter(|entry| !entry.is_internal_transfer)
        .collect()
}

pub(super) fn calculate_totals(entries: &[LedgerEntry]) -> Totals {
    entries.iter().fold(Totals::default(), |mut totals, entry| {
        match entry.kind {
            CategoryKind::Income => totals.income += entry.amount,
            CategoryKind::Expense => totals.expense += entry.amount,
        }
        totals
    })
}

/// Expense totals per category, largest first.
pub(super) fn expense_by_category(entries: &[LedgerEntry]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for entry in entries {
        if entry.kind != CategoryKind::Expense {
            continue;
        }

        let name = entry.category_name.as_deref().unwrap_or(UNCATEGORIZED);
        *totals.entry(name).or_default() += entry.amount;
    }

    let mut totals: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(name, total)| CategoryTotal {
            name: name.to_owned(),
            total,
        })
        .collect();

    totals.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    totals
}

/// Income and expense for every month touching `start..=end`, oldest first.
///
/// Months without entries are included with zero totals.
pub(super) fn monthly_totals(entries: &[LedgerEntry], start: Date, end: Date) -> Vec<MonthlyTotals> {
    let last = YearMonth::containing(end);
    let mut month = YearMonth::containing(start);
    let mut series = Vec::new();

    loop {
        series.push(MonthlyTotals {
            month,
            income: 0.0,
            expense: 0.0,
        });

        if month.first_day() >= last.first_day() {
            break;
        }
        month = month.next();
    }

    for entry in entries {
        let month = YearMonth::containing(entry.date);
        if let Some(totals) = series.iter_mut().find(|totals| totals.month == month) {
            match entry.kind {
                CategoryKind::Income => totals.income += entry.amount,
                CategoryKind::Expense => totals.expense += entry.amount,
            }
        }
    }

    series
}

/// The newest `limit` entries of one kind. `entries` must be newest first.
pub(super) fn recent_of_kind(
    entries: &[LedgerEntry],
    kind: CategoryKind,
    limit: usize,
) -> Vec<&LedgerEntry> {
    entries
        .iter()
        .filter(|entry| entry.kind == kind)
        .take(limit)
        .collect()
}
