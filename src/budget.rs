// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Standing monthly budget per category, checked against a month's actuals.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::calendar::YearMonth;
use crate::models::Ledger;
use crate::summary::category_breakdown;

/// Allocation per category plus the salary the allocations are carved from.
/// The same budget applies to every month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Budget {
    pub salary: Option<Decimal>,
    pub allocations: BTreeMap<String, Decimal>,
}

impl Budget {
    pub fn total_budgeted(&self) -> Decimal {
        self.allocations.values().copied().sum()
    }

    /// Salary not assigned to any category. Negative when over-allocated.
    pub fn unallocated(&self) -> Option<Decimal> {
        self.salary.map(|s| s - self.total_budgeted())
    }

    pub fn allocation(&self, category: &str) -> Option<Decimal> {
        self.allocations
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(category))
            .map(|(_, a)| *a)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetLine {
    pub category: String,
    pub budget: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percentage: Decimal,
    pub over_budget: bool,
}

/// Budgeted categories against the expenses counting in `month`, most
/// consumed first. Spending follows the same rules as the category report:
/// effective month for card purchases, pending subscriptions from the current
/// month on. Category names match ignoring ASCII case.
pub fn budget_vs_actual(
    ledger: &Ledger,
    budget: &Budget,
    month: YearMonth,
    today: NaiveDate,
) -> Vec<BudgetLine> {
    let report = category_breakdown(ledger, month, month, today);
    let mut lines: Vec<BudgetLine> = budget
        .allocations
        .iter()
        .map(|(category, amount)| {
            let spent: Decimal = report
                .rows
                .iter()
                .filter(|r| r.category.eq_ignore_ascii_case(category))
                .filter_map(|r| r.by_month.get(&month))
                .copied()
                .sum();
            let percentage = if *amount > Decimal::ZERO {
                (spent / *amount * Decimal::ONE_HUNDRED).round_dp(2)
            } else {
                Decimal::ZERO
            };
            BudgetLine {
                category: category.clone(),
                budget: *amount,
                spent,
                remaining: (*amount - spent).max(Decimal::ZERO),
                percentage,
                over_budget: spent > *amount,
            }
        })
        .collect();
    lines.sort_by(|a, b| {
        b.percentage
            .cmp(&a.percentage)
            .then_with(|| a.category.cmp(&b.category))
    });
    lines
}
