// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Virtual subscription occurrences.
//!
//! A subscription bills on its start date's day-of-month. The occurrences that
//! count in a target month are found by taking the nominal billing date in the
//! target month and in each of the preceding [`LOOKBACK_MONTHS`] months,
//! resolving it through the card's billing cycle, and keeping every one whose
//! effective month is the target. Two nominal months can land in the same
//! target when a clamped billing day meets a late closing day (billing on the
//! 31st with a card closing on the 30th puts both the Jan 31 and Feb 29
//! charges in March), so a month may carry more than one occurrence of a
//! subscription while a later month carries none. Nothing here is ever
//! persisted unless a caller explicitly [`materialize`]s an occurrence.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::trace;

use crate::calendar::YearMonth;
use crate::effective_date::resolve;
use crate::models::{
    Id, Ledger, Origin, Reimbursement, Subscription, Transaction, TransactionKind,
};

/// How far a nominal billing date can be pushed forward by the resolver:
/// one month for a purchase after the closing day, one for a due day on or
/// before the closing day, one for a day that overflows a short month.
pub const LOOKBACK_MONTHS: i32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedOccurrence {
    pub subscription_id: Id,
    pub name: String,
    pub amount: Decimal,
    pub category: String,
    pub payment_method: Id,
    pub debtor: Option<String>,
    /// Month whose billing day produced this occurrence.
    pub nominal_month: YearMonth,
    pub billing_date: NaiveDate,
    pub effective_date: NaiveDate,
}

/// Whether an occurrence of `subscription_id` billed in `month` was already
/// recorded as a real transaction.
pub fn is_materialized(transactions: &[Transaction], subscription_id: &Id, month: YearMonth) -> bool {
    transactions.iter().any(|t| match &t.origin {
        Origin::Subscription {
            subscription_id: sid,
            month: m,
        } => sid == subscription_id && *m == month,
        _ => false,
    })
}

/// Pending occurrences of every subscription whose effective month is `target`.
pub fn projected_occurrences(ledger: &Ledger, target: YearMonth) -> Vec<ProjectedOccurrence> {
    ledger
        .subscriptions
        .iter()
        .flat_map(|sub| pending_occurrences(ledger, sub, target))
        .collect()
}

/// Unlaunched occurrences of `sub` counting in `target`, oldest nominal month first.
pub fn pending_occurrences(
    ledger: &Ledger,
    sub: &Subscription,
    target: YearMonth,
) -> Vec<ProjectedOccurrence> {
    (0..=LOOKBACK_MONTHS)
        .rev()
        .map(|back| target.add_months(-back))
        .filter_map(|nominal| {
            let billing = nominal.clamped_day(sub.billing_day());
            if !sub.is_active_on(billing) {
                return None;
            }
            let candidate = synthetic_expense(sub, nominal, billing);
            let effective = resolve(&candidate, &ledger.payment_methods, &ledger.preferences);
            if YearMonth::of(effective) != target {
                return None;
            }
            if is_materialized(&ledger.transactions, &sub.id, nominal) {
                trace!(subscription = %sub.id, month = %nominal, "occurrence already launched");
                return None;
            }
            Some(ProjectedOccurrence {
                subscription_id: sub.id.clone(),
                name: sub.name.clone(),
                amount: sub.amount,
                category: sub.category.clone(),
                payment_method: sub.payment_method.clone(),
                debtor: sub.debtor.clone(),
                nominal_month: nominal,
                billing_date: billing,
                effective_date: effective,
            })
        })
        .collect()
}

fn synthetic_expense(sub: &Subscription, nominal: YearMonth, billing: NaiveDate) -> Transaction {
    Transaction {
        id: Id::from_string(format!("projected:{}:{}", sub.id, nominal)),
        amount: sub.amount,
        category: sub.category.clone(),
        payment_method: sub.payment_method.clone(),
        kind: TransactionKind::Expense,
        description: sub.name.clone(),
        date: billing,
        group_id: None,
        origin: Origin::Manual,
        reimbursement: None,
    }
}

/// Turn a projected occurrence into a real expense linked back to its subscription.
pub fn materialize(occurrence: &ProjectedOccurrence, id: Id) -> Transaction {
    Transaction {
        id,
        amount: occurrence.amount,
        category: occurrence.category.clone(),
        payment_method: occurrence.payment_method.clone(),
        kind: TransactionKind::Expense,
        description: format!("Subscription: {}", occurrence.name),
        date: occurrence.billing_date,
        group_id: None,
        origin: Origin::Subscription {
            subscription_id: occurrence.subscription_id.clone(),
            month: occurrence.nominal_month,
        },
        reimbursement: occurrence
            .debtor
            .as_ref()
            .map(|d| Reimbursement::owed_by(Some(d.clone()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreditCardLogic, Lifetime, PaymentMethod, UserPreferences};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    fn id(s: &str) -> Id {
        Id::from_string(s)
    }

    fn sub(sid: &str, pm: &str, start: NaiveDate, lifetime: Lifetime) -> Subscription {
        Subscription::new(
            id(sid),
            "Netflix",
            Decimal::from(40),
            "Leisure",
            id(pm),
            start,
            lifetime,
            None,
        )
        .unwrap()
    }

    fn ledger(logic: CreditCardLogic) -> Ledger {
        Ledger {
            payment_methods: vec![
                PaymentMethod::credit_card(id("visa"), "Visa", 25, 5).unwrap(),
                PaymentMethod::other(id("pix"), "Pix"),
            ],
            preferences: UserPreferences {
                credit_card_logic: logic,
            },
            ..Ledger::default()
        }
    }

    #[test]
    fn non_card_subscription_bills_in_its_own_month() {
        let mut l = ledger(CreditCardLogic::TransactionDate);
        l.subscriptions = vec![sub("n", "pix", d(2024, 1, 10), Lifetime::Indefinite)];
        let out = projected_occurrences(&l, ym(2024, 5));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].billing_date, d(2024, 5, 10));
        assert_eq!(out[0].effective_date, d(2024, 5, 10));
        assert_eq!(out[0].nominal_month, ym(2024, 5));
    }

    #[test]
    fn billing_after_close_is_found_from_previous_month() {
        let mut l = ledger(CreditCardLogic::TransactionDate);
        l.subscriptions = vec![sub("n", "visa", d(2024, 1, 28), Lifetime::Indefinite)];
        let out = projected_occurrences(&l, ym(2024, 5));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].nominal_month, ym(2024, 4));
        assert_eq!(out[0].effective_date, d(2024, 5, 25));
    }

    #[test]
    fn due_month_view_looks_back_two_months() {
        let mut l = ledger(CreditCardLogic::ClosingDay);
        l.subscriptions = vec![sub("n", "visa", d(2024, 1, 28), Lifetime::Indefinite)];
        let out = projected_occurrences(&l, ym(2024, 5));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].billing_date, d(2024, 3, 28));
        assert_eq!(out[0].effective_date, d(2024, 5, 5));
    }

    #[test]
    fn respects_validity_window() {
        let mut l = ledger(CreditCardLogic::TransactionDate);
        l.subscriptions = vec![sub(
            "n",
            "pix",
            d(2024, 2, 10),
            Lifetime::Until(d(2024, 4, 30)),
        )];
        assert!(projected_occurrences(&l, ym(2024, 1)).is_empty());
        assert_eq!(projected_occurrences(&l, ym(2024, 2)).len(), 1);
        assert_eq!(projected_occurrences(&l, ym(2024, 4)).len(), 1);
        assert!(projected_occurrences(&l, ym(2024, 5)).is_empty());
    }

    #[test]
    fn launched_occurrence_is_not_projected_again() {
        let mut l = ledger(CreditCardLogic::TransactionDate);
        l.subscriptions = vec![sub("netflix", "pix", d(2024, 1, 10), Lifetime::Indefinite)];
        let pending = projected_occurrences(&l, ym(2024, 6));
        assert_eq!(pending.len(), 1);

        let launched = materialize(&pending[0], id("tx-1"));
        assert_eq!(launched.description, "Subscription: Netflix");
        assert_eq!(launched.date, d(2024, 6, 10));
        l.transactions.push(launched);

        assert!(projected_occurrences(&l, ym(2024, 6)).is_empty());
        assert_eq!(projected_occurrences(&l, ym(2024, 7)).len(), 1);
    }

    #[test]
    fn clamped_billing_day_can_put_two_charges_in_one_month() {
        let mut l = ledger(CreditCardLogic::TransactionDate);
        l.payment_methods
            .push(PaymentMethod::credit_card(id("late"), "Late", 30, 10).unwrap());
        l.subscriptions = vec![sub("n", "late", d(2024, 1, 31), Lifetime::Indefinite)];

        assert!(projected_occurrences(&l, ym(2024, 2)).is_empty());

        let march = projected_occurrences(&l, ym(2024, 3));
        let seen: Vec<_> = march
            .iter()
            .map(|o| (o.nominal_month, o.billing_date, o.effective_date))
            .collect();
        assert_eq!(
            seen,
            vec![
                (ym(2024, 1), d(2024, 1, 31), d(2024, 3, 1)),
                (ym(2024, 2), d(2024, 2, 29), d(2024, 3, 1)),
            ]
        );

        let counted: usize = ym(2024, 2)
            .range_inclusive(ym(2024, 6))
            .into_iter()
            .map(|m| projected_occurrences(&l, m).len())
            .sum();
        assert_eq!(counted, 6, "every nominal month from January to June is counted once");

        l.transactions.push(materialize(&march[0], id("tx-1")));
        let rest = projected_occurrences(&l, ym(2024, 3));
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].nominal_month, ym(2024, 2));
    }

    #[test]
    fn billing_day_is_clamped_in_short_months() {
        let mut l = ledger(CreditCardLogic::TransactionDate);
        l.subscriptions = vec![sub("n", "pix", d(2024, 1, 31), Lifetime::Indefinite)];
        let out = projected_occurrences(&l, ym(2024, 2));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].billing_date, d(2024, 2, 29));
    }
}
