// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Maps a transaction to the date at which it affects the user's finances.
//!
//! Only ordinary credit-card expenses are remapped. A purchase made after the
//! card's closing day belongs to the next billing cycle; the preference then
//! picks either the cycle's closing date or the invoice due date.

use chrono::{Datelike, NaiveDate};
use tracing::trace;

use crate::calendar::YearMonth;
use crate::models::{
    find_payment_method, CreditCardLogic, Origin, PaymentMethod, Transaction, UserPreferences,
};

pub fn resolve(
    transaction: &Transaction,
    payment_methods: &[PaymentMethod],
    preferences: &UserPreferences,
) -> NaiveDate {
    if !transaction.is_expense() || transaction.origin == Origin::Anticipation {
        return transaction.date;
    }
    let Some(pm) = find_payment_method(payment_methods, &transaction.payment_method) else {
        trace!(
            transaction = %transaction.id,
            payment_method = %transaction.payment_method,
            "payment method not found, keeping raw date"
        );
        return transaction.date;
    };
    let Some((closing_day, due_day)) = pm.card_days() else {
        return transaction.date;
    };
    card_effective_date(
        transaction.date,
        closing_day,
        due_day,
        preferences.credit_card_logic,
    )
}

pub fn effective_month(
    transaction: &Transaction,
    payment_methods: &[PaymentMethod],
    preferences: &UserPreferences,
) -> YearMonth {
    YearMonth::of(resolve(transaction, payment_methods, preferences))
}

/// Month whose closing date ends the billing cycle `date` belongs to.
/// A purchase on the closing day itself stays in the current cycle.
pub fn billing_cycle(date: NaiveDate, closing_day: u32) -> YearMonth {
    let month = YearMonth::of(date);
    if date.day() > closing_day {
        month.next()
    } else {
        month
    }
}

/// Month in which the invoice closing in `cycle` is due. The due date always
/// trails the close, so a due day on or before the closing day lands next month.
pub fn due_month(cycle: YearMonth, closing_day: u32, due_day: u32) -> YearMonth {
    if due_day <= closing_day {
        cycle.next()
    } else {
        cycle
    }
}

pub fn card_effective_date(
    date: NaiveDate,
    closing_day: u32,
    due_day: u32,
    logic: CreditCardLogic,
) -> NaiveDate {
    let cycle = billing_cycle(date, closing_day);
    match logic {
        CreditCardLogic::TransactionDate => cycle.rolled_day(closing_day),
        CreditCardLogic::ClosingDay => due_month(cycle, closing_day, due_day).rolled_day(due_day),
    }
}
