//! Calendar month helpers shared by the account book, exports and statistics.

use serde::Deserialize;
use time::{Date, Month};

use crate::Error;

/// The `year` and `month` query parameters used by month based pages.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u8>,
}

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: Month,
}

impl YearMonth {
    /// # Errors
    ///
    /// Returns [Error::InvalidMonth] if `month` is not in 1-12 or the year is out of range.
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        let month_value = Month::try_from(month).map_err(|_| Error::InvalidMonth(year, month))?;
        Date::from_calendar_date(year, month_value, 1)
            .map_err(|_| Error::InvalidMonth(year, month))?;

        Ok(Self {
            year,
            month: month_value,
        })
    }

    pub fn containing(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Resolve the query to a month, defaulting to the month of `today` when
    /// either parameter is missing.
    pub fn from_query(query: MonthQuery, today: Date) -> Result<Self, Error> {
        match (query.year, query.month) {
            (Some(year), Some(month)) => Self::new(year, month),
            _ => Ok(Self::containing(today)),
        }
    }

    pub fn month_number(&self) -> u8 {
        self.month as u8
    }

    pub fn first_day(&self) -> Date {
        Date::from_calendar_date(self.year, self.month, 1).unwrap_or(Date::MIN)
    }

    pub fn last_day(&self) -> Date {
        let day = self.month.length(self.year);
        Date::from_calendar_date(self.year, self.month, day).unwrap_or(Date::MAX)
    }

    pub fn previous(&self) -> Self {
        match self.month {
            Month::January => Self {
                year: self.year - 1,
                month: Month::December,
            },
            month => Self {
                year: self.year,
                month: month.previous(),
            },
        }
    }

    pub fn next(&self) -> Self {
        match self.month {
            Month::December => Self {
                year: self.year + 1,
                month: Month::January,
            },
            month => Self {
                year: self.year,
                month: month.next(),
            },
        }
    }

    /// The month `count` months before this one.
    pub fn months_before(&self, count: u32) -> Self {
        (0..count).fold(*self, |month, _| month.previous())
    }

    /// A short label such as "2025-03".
    pub fn label(&self) -> String {
        format!("{}-{:02}", self.year, self.month_number())
    }
}

#[cfg(test)]
mod tests {
    use time::{Month, macros::date};

    use crate::Error;

    use super::{MonthQuery, YearMonth};

    #[test]
    fn month_bounds() {
        let february = YearMonth::new(2024, 2).unwrap();

        assert_eq!(february.first_day(), date!(2024 - 02 - 01));
        assert_eq!(february.last_day(), date!(2024 - 02 - 29));
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert_eq!(YearMonth::new(2025, 13), Err(Error::InvalidMonth(2025, 13)));
        assert_eq!(YearMonth::new(2025, 0), Err(Error::InvalidMonth(2025, 0)));
    }

    #[test]
    fn navigation_wraps_years() {
        let january = YearMonth::new(2025, 1).unwrap();

        assert_eq!(january.previous(), YearMonth::new(2024, 12).unwrap());
        assert_eq!(january.previous().next(), january);
        assert_eq!(january.months_before(5), YearMonth::new(2024, 8).unwrap());
    }

    #[test]
    fn query_defaults_to_current_month() {
        let today = date!(2025 - 06 - 15);

        let month = YearMonth::from_query(MonthQuery::default(), today).unwrap();
        let only_year = YearMonth::from_query(
            MonthQuery {
                year: Some(2020),
                month: None,
            },
            today,
        )
        .unwrap();

        assert_eq!(month.month, Month::June);
        assert_eq!(only_year, month);
        assert_eq!(month.label(), "2025-06");
    }
}
