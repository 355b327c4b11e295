//! Values holdings against current quotes.

use std::collections::BTreeMap;

use crate::{
    Error,
    stock::{Currency, HoldingRow, QuoteSource},
};

/// A holding with its current price, if one is known.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingValuation {
    pub row: HoldingRow,
    pub current_price: Option<f64>,
}

impl HoldingValuation {
    pub fn cost(&self) -> f64 {
        self.row.holding.cost()
    }

    pub fn current_value(&self) -> Option<f64> {
        self.current_price
            .map(|price| price * self.row.holding.shares)
    }

    /// Gain or loss as a percentage of the cost.
    pub fn profit_rate(&self) -> Option<f64> {
        self.current_value()
            .map(|value| profit_rate(self.cost(), value))
    }
}

/// The totals of the quoted holdings in one currency.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CurrencyTotals {
    pub purchase_amount: f64,
    pub current_value: f64,
}

impl CurrencyTotals {
    pub fn profit(&self) -> f64 {
        self.current_value - self.purchase_amount
    }

    pub fn profit_rate(&self) -> f64 {
        profit_rate(self.purchase_amount, self.current_value)
    }
}

fn profit_rate(cost: f64, value: f64) -> f64 {
    if cost == 0.0 {
        0.0
    } else {
        (value - cost) / cost * 100.0
    }
}

/// Look up a price for each holding.
pub fn value_holdings(
    rows: Vec<HoldingRow>,
    quotes: &impl QuoteSource,
) -> Result<Vec<HoldingValuation>, Error> {
    rows.into_iter()
        .map(|row| {
            let current_price = quotes.latest_price(&row.holding.ticker)?;
            Ok(HoldingValuation { row, current_price })
        })
        .collect()
}

/// Sum the quoted holdings per currency. Unquoted holdings are left out.
pub fn totals_by_currency(valuations: &[HoldingValuation]) -> BTreeMap<Currency, CurrencyTotals> {
    let mut totals: BTreeMap<Currency, CurrencyTotals> = BTreeMap::new();

    for valuation in valuations {
        if let Some(value) = valuation.current_value() {
            let entry = totals.entry(valuation.row.holding.currency).or_default();
            entry.purchase_amount += valuation.cost();
            entry.current_value += value;
        }
    }

    totals
}
