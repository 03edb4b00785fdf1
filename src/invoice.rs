// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, trace};

use crate::calendar::YearMonth;
use crate::effective_date::due_month;
use crate::models::{Id, Ledger, PaymentMethodKind};
use crate::recurrence::is_materialized;

/// Inclusive date range of one billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoicePeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl InvoicePeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn months(&self) -> Vec<YearMonth> {
        YearMonth::of(self.start).range_inclusive(YearMonth::of(self.end))
    }
}

/// Billing cycle closing in `month`: from the day after the previous month's
/// closing date through this month's closing date. Out-of-range days roll
/// into the following month rather than being clamped.
pub fn period(closing_day: u32, month: YearMonth) -> InvoicePeriod {
    InvoicePeriod {
        start: month.prev().rolled_day(closing_day + 1),
        end: month.rolled_day(closing_day),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum LineSource {
    Recorded { transaction_id: Id },
    Projected { subscription_id: Id },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceLine {
    pub date: NaiveDate,
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    #[serde(flatten)]
    pub source: LineSource,
}

impl InvoiceLine {
    pub fn is_projected(&self) -> bool {
        matches!(self.source, LineSource::Projected { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    pub card_id: Id,
    pub month: YearMonth,
    pub lines: Vec<InvoiceLine>,
    pub total: Decimal,
    pub period: Option<InvoicePeriod>,
    pub closing_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl Invoice {
    fn empty(card_id: &Id, month: YearMonth) -> Self {
        Self {
            card_id: card_id.clone(),
            month,
            lines: Vec::new(),
            total: Decimal::ZERO,
            period: None,
            closing_date: None,
            due_date: None,
        }
    }
}

/// Collects the expenses billed on `card_id` in the cycle closing in `month`.
///
/// Membership uses the raw transaction date: the invoice is itself the
/// billing-cycle grouping. Subscriptions on the card contribute a projected
/// line for each billing date inside the period unless that occurrence was
/// already launched as a real transaction. Anything that is not a credit card
/// yields an empty invoice.
pub fn assemble(ledger: &Ledger, card_id: &Id, month: YearMonth) -> Invoice {
    let Some(card) = ledger.payment_method(card_id) else {
        debug!(card = %card_id, "no such payment method, empty invoice");
        return Invoice::empty(card_id, month);
    };
    let PaymentMethodKind::CreditCard {
        closing_day,
        due_day,
    } = card.kind
    else {
        debug!(card = %card_id, "payment method is not a credit card, empty invoice");
        return Invoice::empty(card_id, month);
    };

    let period = period(closing_day, month);

    let mut lines: Vec<InvoiceLine> = ledger
        .transactions
        .iter()
        .filter(|t| t.is_expense() && &t.payment_method == card_id && period.contains(t.date))
        .map(|t| InvoiceLine {
            date: t.date,
            description: t.description.clone(),
            category: t.category.clone(),
            amount: t.amount,
            source: LineSource::Recorded {
                transaction_id: t.id.clone(),
            },
        })
        .collect();

    for sub in ledger
        .subscriptions
        .iter()
        .filter(|s| &s.payment_method == card_id)
    {
        for nominal in period.months() {
            let billing = nominal.clamped_day(sub.billing_day());
            if !period.contains(billing) || !sub.is_active_on(billing) {
                continue;
            }
            if is_materialized(&ledger.transactions, &sub.id, nominal) {
                trace!(subscription = %sub.id, month = %nominal, "already launched");
                continue;
            }
            lines.push(InvoiceLine {
                date: billing,
                description: sub.name.clone(),
                category: sub.category.clone(),
                amount: sub.amount,
                source: LineSource::Projected {
                    subscription_id: sub.id.clone(),
                },
            });
        }
    }

    lines.sort_by(|a, b| b.date.cmp(&a.date));
    let total = lines.iter().map(|l| l.amount).sum();
    let due_date = due_month(month, closing_day, due_day).rolled_day(due_day);

    Invoice {
        card_id: card_id.clone(),
        month,
        lines,
        total,
        period: Some(period),
        closing_date: Some(period.end),
        due_date: Some(due_date),
    }
}

/// One invoice per credit card for the cycle closing in `month`.
pub fn invoices_for_month(ledger: &Ledger, month: YearMonth) -> Vec<Invoice> {
    ledger
        .payment_methods
        .iter()
        .filter(|pm| pm.card_days().is_some())
        .map(|pm| assemble(ledger, &pm.id, month))
        .collect()
}
