// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::calendar::YearMonth;
use crate::effective_date::effective_month;
use crate::models::{Ledger, TransactionKind};
use crate::recurrence::projected_occurrences;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub month: YearMonth,
    pub income: Decimal,
    pub expense: Decimal,
    pub investment: Decimal,
    /// Part of `expense` coming from subscriptions not launched yet.
    pub projected_expense: Decimal,
    pub balance: Decimal,
}

/// Totals for the financial month `target`.
///
/// Real transactions count in the month their effective date falls in. For the
/// current month and later, pending subscription occurrences are added to the
/// expense total, so past months read as actuals and future months as a
/// projection.
pub fn summarize(ledger: &Ledger, target: YearMonth, today: NaiveDate) -> MonthSummary {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    let mut investment = Decimal::ZERO;

    for t in &ledger.transactions {
        if effective_month(t, &ledger.payment_methods, &ledger.preferences) != target {
            continue;
        }
        match t.kind {
            TransactionKind::Income => income += t.amount,
            TransactionKind::Expense => expense += t.amount,
            TransactionKind::Investment => investment += t.amount,
        }
    }

    let projected_expense: Decimal = if target >= YearMonth::of(today) {
        projected_occurrences(ledger, target)
            .iter()
            .map(|o| o.amount)
            .sum()
    } else {
        Decimal::ZERO
    };
    expense += projected_expense;

    MonthSummary {
        month: target,
        income,
        expense,
        investment,
        projected_expense,
        balance: income - expense - investment,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRow {
    pub category: String,
    pub by_month: BTreeMap<YearMonth, Decimal>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub months: Vec<YearMonth>,
    pub rows: Vec<CategoryRow>,
}

impl CategoryReport {
    pub fn month_total(&self, month: YearMonth) -> Decimal {
        self.rows
            .iter()
            .filter_map(|r| r.by_month.get(&month))
            .copied()
            .sum()
    }
}

/// Expenses bucketed by category and effective month over `from..=to`.
pub fn category_breakdown(
    ledger: &Ledger,
    from: YearMonth,
    to: YearMonth,
    today: NaiveDate,
) -> CategoryReport {
    let months = from.range_inclusive(to);
    let current = YearMonth::of(today);
    let mut buckets: BTreeMap<String, BTreeMap<YearMonth, Decimal>> = BTreeMap::new();

    for t in ledger.transactions.iter().filter(|t| t.is_expense()) {
        let month = effective_month(t, &ledger.payment_methods, &ledger.preferences);
        if month < from || month > to {
            continue;
        }
        *buckets
            .entry(t.category.clone())
            .or_default()
            .entry(month)
            .or_insert(Decimal::ZERO) += t.amount;
    }

    for month in months.iter().copied().filter(|m| *m >= current) {
        for occ in projected_occurrences(ledger, month) {
            *buckets
                .entry(occ.category)
                .or_default()
                .entry(month)
                .or_insert(Decimal::ZERO) += occ.amount;
        }
    }

    let rows = buckets
        .into_iter()
        .map(|(category, by_month)| CategoryRow {
            total: by_month.values().copied().sum(),
            category,
            by_month,
        })
        .collect();

    CategoryReport { months, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CreditCardLogic, Id, Lifetime, Origin, PaymentMethod, Subscription, Transaction,
        UserPreferences,
    };

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn tx(id: &str, kind: TransactionKind, amount: i64, date: NaiveDate, pm: &str, cat: &str) -> Transaction {
        Transaction::new(
            Id::from_string(id),
            kind,
            Decimal::from(amount),
            date,
            id,
            cat,
            Id::from_string(pm),
        )
        .unwrap()
    }

    fn ledger() -> Ledger {
        Ledger {
            payment_methods: vec![
                PaymentMethod::other(Id::from_string("pix"), "Pix"),
                PaymentMethod::credit_card(Id::from_string("visa"), "Visa", 25, 5).unwrap(),
            ],
            preferences: UserPreferences {
                credit_card_logic: CreditCardLogic::ClosingDay,
            },
            ..Ledger::default()
        }
    }

    #[test]
    fn balance_is_income_minus_expense_and_investment() {
        let mut l = ledger();
        l.transactions = vec![
            tx("salary", TransactionKind::Income, 5000, d(2024, 3, 5), "pix", "Salary"),
            tx("rent", TransactionKind::Expense, 3000, d(2024, 3, 10), "pix", "Home"),
            tx("fund", TransactionKind::Investment, 500, d(2024, 3, 12), "pix", "Investments"),
        ];
        let s = summarize(&l, ym(2024, 3), d(2024, 6, 1));
        assert_eq!(s.income, Decimal::from(5000));
        assert_eq!(s.expense, Decimal::from(3000));
        assert_eq!(s.investment, Decimal::from(500));
        assert_eq!(s.balance, Decimal::from(1500));
    }

    #[test]
    fn card_expenses_count_in_due_month() {
        let mut l = ledger();
        l.transactions = vec![tx("shoes", TransactionKind::Expense, 200, d(2024, 3, 10), "visa", "Shopping")];
        let today = d(2024, 1, 1);
        assert_eq!(summarize(&l, ym(2024, 3), today).expense, Decimal::ZERO);
        assert_eq!(summarize(&l, ym(2024, 4), today).expense, Decimal::from(200));
    }

    #[test]
    fn projections_only_for_current_and_future_months() {
        let mut l = ledger();
        l.subscriptions = vec![Subscription::new(
            Id::from_string("music"),
            "Music",
            Decimal::from(20),
            "Leisure",
            Id::from_string("pix"),
            d(2023, 1, 8),
            Lifetime::Indefinite,
            None,
        )
        .unwrap()];
        let today = d(2024, 5, 15);
        assert_eq!(summarize(&l, ym(2024, 4), today).projected_expense, Decimal::ZERO);
        let may = summarize(&l, ym(2024, 5), today);
        assert_eq!(may.projected_expense, Decimal::from(20));
        assert_eq!(may.balance, Decimal::from(-20));

        let mut launched = tx("launch", TransactionKind::Expense, 20, d(2024, 5, 8), "pix", "Leisure");
        launched.origin = Origin::Subscription {
            subscription_id: Id::from_string("music"),
            month: ym(2024, 5),
        };
        l.transactions.push(launched);
        let may = summarize(&l, ym(2024, 5), today);
        assert_eq!(may.projected_expense, Decimal::ZERO);
        assert_eq!(may.expense, Decimal::from(20));
    }

    #[test]
    fn breakdown_buckets_by_category_and_effective_month() {
        let mut l = ledger();
        l.transactions = vec![
            tx("a", TransactionKind::Expense, 100, d(2024, 3, 10), "visa", "Food"),
            tx("b", TransactionKind::Expense, 50, d(2024, 4, 2), "pix", "Food"),
            tx("c", TransactionKind::Expense, 70, d(2024, 4, 3), "pix", "Home"),
            tx("d", TransactionKind::Income, 999, d(2024, 4, 3), "pix", "Salary"),
        ];
        let report = category_breakdown(&l, ym(2024, 3), ym(2024, 4), d(2024, 12, 1));
        assert_eq!(report.months, vec![ym(2024, 3), ym(2024, 4)]);
        assert_eq!(report.rows.len(), 2);
        let food = &report.rows[0];
        assert_eq!(food.category, "Food");
        assert_eq!(food.by_month.get(&ym(2024, 4)), Some(&Decimal::from(150)));
        assert_eq!(food.total, Decimal::from(150));
        assert_eq!(report.month_total(ym(2024, 4)), Decimal::from(220));
        assert_eq!(report.month_total(ym(2024, 3)), Decimal::ZERO);
    }
}
