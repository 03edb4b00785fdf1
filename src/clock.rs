// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Local, NaiveDate};

use crate::calendar::YearMonth;

/// Source of "today". Engine functions take the date as an argument; command
/// handlers obtain it from a `Clock` so tests can pin it.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn current_month(&self) -> YearMonth {
        YearMonth::of(self.today())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock {
    today: NaiveDate,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }
}
