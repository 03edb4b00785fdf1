// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// A calendar month. Internally the first day of that month, so every value is a valid date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    pub fn of(date: NaiveDate) -> Self {
        Self(date - Duration::days(i64::from(date.day0())))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        self.0
            .checked_add_months(Months::new(1))
            .map(|next| next - Duration::days(1))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Shift by `n` months; negative values go backwards. Wraps year boundaries
    /// and saturates at the first or last representable month.
    pub fn add_months(&self, n: i32) -> Self {
        let months = Months::new(n.unsigned_abs());
        if n >= 0 {
            self.0
                .checked_add_months(months)
                .map(Self)
                .unwrap_or_else(|| Self::of(NaiveDate::MAX))
        } else {
            self.0
                .checked_sub_months(months)
                .map(Self)
                .unwrap_or_else(|| Self::of(NaiveDate::MIN))
        }
    }

    pub fn next(&self) -> Self {
        self.add_months(1)
    }

    pub fn prev(&self) -> Self {
        self.add_months(-1)
    }

    /// Day `day` of this month with overflow rolling forward, the way a date
    /// constructor fed an out-of-range day behaves: day 31 of a 30-day month is
    /// the 1st of the next month and day 0 is the last day of the previous one.
    pub fn rolled_day(&self, day: u32) -> NaiveDate {
        self.0
            .checked_add_signed(Duration::days(i64::from(day) - 1))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Day `day` of this month, clamped into `1..=last_day`.
    pub fn clamped_day(&self, day: u32) -> NaiveDate {
        let last = self.last_day();
        if day >= last.day() {
            last
        } else {
            self.rolled_day(day.max(1))
        }
    }

    /// Months from `self` to `other` inclusive, ascending. Empty when `other < self`.
    pub fn range_inclusive(self, other: YearMonth) -> Vec<YearMonth> {
        let mut out = Vec::new();
        let mut cur = self;
        while cur <= other {
            out.push(cur);
            cur = cur.next();
        }
        out
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| LedgerError::InvalidMonth(s.to_string()))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Same day-of-month `n` months after `date`, clamped to the target month's length.
/// Saturates at the last representable date.
pub fn add_months(date: NaiveDate, n: u32) -> NaiveDate {
    date.checked_add_months(Months::new(n))
        .unwrap_or(NaiveDate::MAX)
}
