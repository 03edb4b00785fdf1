// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly planning profiles: expected income and planned spending per
//! category for one month, compared with what the ledger shows for it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::budget::Budget;
use crate::calendar::YearMonth;
use crate::error::LedgerError;
use crate::models::{ensure_non_negative, Id, Ledger};
use crate::summary::{category_breakdown, summarize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanningProfile {
    pub id: Id,
    pub month: YearMonth,
    pub expected_income: Decimal,
    pub planned: BTreeMap<String, Decimal>,
}

impl PlanningProfile {
    /// New plan for `month` with the standing budget as its planned spending.
    pub fn draft(id: Id, month: YearMonth, expected_income: Decimal, budget: &Budget) -> Self {
        Self {
            id,
            month,
            expected_income,
            planned: budget.allocations.clone(),
        }
    }

    /// Sets a category's planned amount; zero removes the line.
    pub fn set_line(&mut self, category: &str, amount: Decimal) -> Result<(), LedgerError> {
        let amount = ensure_non_negative(amount)?;
        let key = self
            .planned
            .keys()
            .find(|c| c.eq_ignore_ascii_case(category))
            .cloned()
            .unwrap_or_else(|| category.trim().to_string());
        if amount.is_zero() {
            self.planned.remove(&key);
        } else {
            self.planned.insert(key, amount);
        }
        Ok(())
    }

    pub fn total_planned(&self) -> Decimal {
        self.planned.values().copied().sum()
    }

    pub fn projected_balance(&self) -> Decimal {
        self.expected_income - self.total_planned()
    }

    /// Share of the expected income left after planned spending, in percent.
    pub fn savings_rate(&self) -> Decimal {
        savings_rate(self.expected_income, self.projected_balance())
    }
}

fn savings_rate(income: Decimal, balance: Decimal) -> Decimal {
    if income > Decimal::ZERO {
        (balance / income * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    }
}

/// Stores `profile`, replacing any plan for the same month. The stored plan
/// keeps the id it already had. Result is ordered by month.
pub fn upsert(profiles: &[PlanningProfile], profile: PlanningProfile) -> Vec<PlanningProfile> {
    let mut out: Vec<PlanningProfile> = Vec::with_capacity(profiles.len() + 1);
    let mut profile = profile;
    for p in profiles {
        if p.month == profile.month {
            profile.id = p.id.clone();
        } else {
            out.push(p.clone());
        }
    }
    out.push(profile);
    out.sort_by_key(|p| p.month);
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanLine {
    pub category: String,
    pub planned: Decimal,
    pub actual: Decimal,
    /// Planned minus actual; negative when spending ran over.
    pub difference: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanComparison {
    pub month: YearMonth,
    pub expected_income: Decimal,
    pub actual_income: Decimal,
    pub total_planned: Decimal,
    pub total_actual: Decimal,
    pub projected_balance: Decimal,
    pub actual_balance: Decimal,
    pub planned_savings_rate: Decimal,
    pub actual_savings_rate: Decimal,
    pub lines: Vec<PlanLine>,
}

/// Planned figures next to the month's summary. Categories spent on but not
/// planned show up with a planned amount of zero.
pub fn compare(ledger: &Ledger, profile: &PlanningProfile, today: NaiveDate) -> PlanComparison {
    let summary = summarize(ledger, profile.month, today);
    let report = category_breakdown(ledger, profile.month, profile.month, today);

    let mut lines: Vec<PlanLine> = profile
        .planned
        .iter()
        .map(|(category, planned)| PlanLine {
            category: category.clone(),
            planned: *planned,
            actual: Decimal::ZERO,
            difference: Decimal::ZERO,
        })
        .collect();
    for row in &report.rows {
        let spent = row.by_month.get(&profile.month).copied().unwrap_or_default();
        match lines
            .iter_mut()
            .find(|l| l.category.eq_ignore_ascii_case(&row.category))
        {
            Some(line) => line.actual += spent,
            None => lines.push(PlanLine {
                category: row.category.clone(),
                planned: Decimal::ZERO,
                actual: spent,
                difference: Decimal::ZERO,
            }),
        }
    }
    for line in &mut lines {
        line.difference = line.planned - line.actual;
    }
    lines.sort_by(|a, b| a.category.cmp(&b.category));

    PlanComparison {
        month: profile.month,
        expected_income: profile.expected_income,
        actual_income: summary.income,
        total_planned: profile.total_planned(),
        total_actual: summary.expense,
        projected_balance: profile.projected_balance(),
        actual_balance: summary.balance,
        planned_savings_rate: profile.savings_rate(),
        actual_savings_rate: savings_rate(summary.income, summary.balance),
        lines,
    }
}
