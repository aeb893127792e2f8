use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A calendar month in which an account is reconciled.
///
/// Years at or below [`AccountingPeriod::OPENING_YEAR`] denote the opening
/// balances entered before tracking began; such a period contains no dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountingPeriod {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for AccountingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opening_balances() {
            write!(f, "Opening balances")
        } else {
            write!(f, "{:04}-{:02}", self.year, self.month)
        }
    }
}

impl AccountingPeriod {
    pub const OPENING_YEAR: i32 = 1;

    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(AccountingPeriod { year, month })
        } else {
            None
        }
    }

    pub fn opening_balances() -> Self {
        AccountingPeriod {
            year: Self::OPENING_YEAR,
            month: 1,
        }
    }

    pub fn containing(date: NaiveDate) -> Self {
        AccountingPeriod {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn is_opening_balances(self) -> bool {
        self.year <= Self::OPENING_YEAR
    }

    pub fn start_date(self) -> Option<NaiveDate> {
        if self.is_opening_balances() {
            return None;
        }
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Last day of the month (inclusive, matching [`DateRange::contains`]).
    pub fn end_date(self) -> Option<NaiveDate> {
        self.next()?.start_date()?.pred_opt()
    }

    pub fn date_range(self) -> Option<DateRange> {
        Some(DateRange::new(self.start_date()?, self.end_date()?))
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        self.date_range().is_some_and(|r| r.contains(date))
    }

    /// The following month. Opening balances have no successor of their own.
    pub fn next(self) -> Option<Self> {
        if self.is_opening_balances() {
            return None;
        }
        if self.month == 12 {
            Some(AccountingPeriod {
                year: self.year.checked_add(1)?,
                month: 1,
            })
        } else {
            Some(AccountingPeriod {
                year: self.year,
                month: self.month + 1,
            })
        }
    }

    pub fn previous(self) -> Option<Self> {
        if self.is_opening_balances() {
            return None;
        }
        let prev = if self.month == 1 {
            AccountingPeriod {
                year: self.year - 1,
                month: 12,
            }
        } else {
            AccountingPeriod {
                year: self.year,
                month: self.month - 1,
            }
        };
        Some(prev)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_rejects_bad_months() {
        assert!(AccountingPeriod::new(2024, 0).is_none());
        assert!(AccountingPeriod::new(2024, 13).is_none());
        assert!(AccountingPeriod::new(2024, 12).is_some());
    }

    #[test]
    fn display() {
        assert_eq!(AccountingPeriod::new(2024, 3).unwrap().to_string(), "2024-03");
        assert_eq!(AccountingPeriod::opening_balances().to_string(), "Opening balances");
    }

    #[test]
    fn year_one_and_below_are_opening_balances() {
        assert!(AccountingPeriod::new(1, 6).unwrap().is_opening_balances());
        assert!(AccountingPeriod::new(0, 1).unwrap().is_opening_balances());
        assert!(!AccountingPeriod::new(2, 1).unwrap().is_opening_balances());
    }

    #[test]
    fn month_boundaries() {
        let feb = AccountingPeriod::new(2024, 2).unwrap();
        assert_eq!(feb.start_date(), Some(date(2024, 2, 1)));
        assert_eq!(feb.end_date(), Some(date(2024, 2, 29)));
        let dec = AccountingPeriod::new(2023, 12).unwrap();
        assert_eq!(dec.end_date(), Some(date(2023, 12, 31)));
    }

    #[test]
    fn contains_is_inclusive() {
        let jan = AccountingPeriod::new(2024, 1).unwrap();
        assert!(jan.contains(date(2024, 1, 1)));
        assert!(jan.contains(date(2024, 1, 31)));
        assert!(!jan.contains(date(2024, 2, 1)));
        assert!(!jan.contains(date(2023, 12, 31)));
    }

    #[test]
    fn opening_balances_contain_nothing() {
        let opening = AccountingPeriod::opening_balances();
        assert!(!opening.contains(date(1, 1, 1)));
        assert_eq!(opening.date_range(), None);
        assert_eq!(opening.next(), None);
    }

    #[test]
    fn next_and_previous_wrap_years() {
        let dec = AccountingPeriod::new(2023, 12).unwrap();
        let jan = AccountingPeriod::new(2024, 1).unwrap();
        assert_eq!(dec.next(), Some(jan));
        assert_eq!(jan.previous(), Some(dec));
    }

    #[test]
    fn last_representable_month_has_no_successor() {
        let last = AccountingPeriod::new(i32::MAX, 12).unwrap();
        assert_eq!(last.next(), None);
        assert_eq!(last.end_date(), None);
        assert!(!last.contains(date(2024, 12, 1)));
        assert_eq!(
            AccountingPeriod::new(i32::MAX, 11).unwrap().next(),
            Some(AccountingPeriod::new(i32::MAX, 12).unwrap())
        );
    }

    #[test]
    fn containing_date() {
        assert_eq!(
            AccountingPeriod::containing(date(2024, 7, 19)),
            AccountingPeriod::new(2024, 7).unwrap()
        );
    }

    #[test]
    fn date_range_display() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 12, 31));
        assert_eq!(range.to_string(), "2024-01-01 to 2024-12-31");
    }
}
