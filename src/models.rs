// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::calendar::YearMonth;
use crate::error::LedgerError;

/// Opaque identifier for stored entities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Abstraction over id generation so tests get deterministic ids.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> Id;
}

#[derive(Debug, Clone, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn new_id(&self) -> Id {
        Id::new()
    }
}

/// Hands out `{prefix}-1`, `{prefix}-2`, ...
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn new_id(&self) -> Id {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Id(format!("{}-{}", self.prefix, n))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
    Investment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
            TransactionKind::Investment => "investment",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(TransactionKind::Expense),
            "income" => Ok(TransactionKind::Income),
            "investment" => Ok(TransactionKind::Investment),
            other => Err(LedgerError::UnknownVariant {
                kind: "transaction type",
                value: other.to_string(),
            }),
        }
    }
}

/// Where a transaction came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    #[default]
    Manual,
    /// Cash settlement of advanced installments. Never remapped by billing cycles.
    Anticipation,
    /// A subscription occurrence launched for its nominal billing month.
    Subscription { subscription_id: Id, month: YearMonth },
    /// Money paid back for a reimbursable expense.
    Reimbursement { expense_id: Id },
    /// Investment put into a savings goal.
    Contribution { goal_id: Id },
    /// Income taken out of a savings goal.
    Withdrawal { goal_id: Id },
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Manual => "manual",
            Origin::Anticipation => "anticipation",
            Origin::Subscription { .. } => "subscription",
            Origin::Reimbursement { .. } => "reimbursement",
            Origin::Contribution { .. } => "contribution",
            Origin::Withdrawal { .. } => "withdrawal",
        }
    }

    /// Goal this transaction moves money in or out of.
    pub fn goal_id(&self) -> Option<&Id> {
        match self {
            Origin::Contribution { goal_id } | Origin::Withdrawal { goal_id } => Some(goal_id),
            _ => None,
        }
    }
}

/// Reimbursable expense terms. `received` links the income transaction once paid back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Reimbursement {
    pub debtor: Option<String>,
    pub received: Option<Id>,
}

impl Reimbursement {
    pub fn owed_by(debtor: Option<String>) -> Self {
        Self {
            debtor,
            received: None,
        }
    }

    pub fn is_reimbursed(&self) -> bool {
        self.received.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Id,
    pub amount: Decimal,
    pub category: String,
    pub payment_method: Id,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: String,
    pub date: NaiveDate,
    pub group_id: Option<Id>,
    pub origin: Origin,
    pub reimbursement: Option<Reimbursement>,
}

impl Transaction {
    pub fn new(
        id: Id,
        kind: TransactionKind,
        amount: Decimal,
        date: NaiveDate,
        description: impl Into<String>,
        category: impl Into<String>,
        payment_method: Id,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            id,
            amount: ensure_positive(amount)?,
            category: category.into(),
            payment_method,
            kind,
            description: description.into(),
            date,
            group_id: None,
            origin: Origin::Manual,
            reimbursement: None,
        })
    }

    pub fn with_reimbursement(mut self, reimbursement: Option<Reimbursement>) -> Self {
        self.reimbursement = reimbursement;
        self
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}

pub fn ensure_positive(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount > Decimal::ZERO {
        Ok(amount)
    } else {
        Err(LedgerError::NonPositiveAmount(amount))
    }
}

pub fn ensure_non_negative(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount >= Decimal::ZERO {
        Ok(amount)
    } else {
        Err(LedgerError::NegativeAmount(amount))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "date", rename_all = "snake_case")]
pub enum Lifetime {
    Indefinite,
    Until(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Id,
    pub name: String,
    pub amount: Decimal,
    pub category: String,
    pub payment_method: Id,
    pub start_date: NaiveDate,
    pub lifetime: Lifetime,
    pub debtor: Option<String>,
}

impl Subscription {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Id,
        name: impl Into<String>,
        amount: Decimal,
        category: impl Into<String>,
        payment_method: Id,
        start_date: NaiveDate,
        lifetime: Lifetime,
        debtor: Option<String>,
    ) -> Result<Self, LedgerError> {
        if let Lifetime::Until(until) = lifetime {
            if until < start_date {
                return Err(LedgerError::LifetimeBeforeStart {
                    start: start_date,
                    until,
                });
            }
        }
        Ok(Self {
            id,
            name: name.into(),
            amount: ensure_positive(amount)?,
            category: category.into(),
            payment_method,
            start_date,
            lifetime,
            debtor,
        })
    }

    /// Billing day-of-month, taken from the start date.
    pub fn billing_day(&self) -> u32 {
        chrono::Datelike::day(&self.start_date)
    }

    /// Whether a billing on `date` falls inside the subscription's validity window.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        if date < self.start_date {
            return false;
        }
        match self.lifetime {
            Lifetime::Indefinite => true,
            Lifetime::Until(until) => date <= until,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethodKind {
    CreditCard { closing_day: u32, due_day: u32 },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: Id,
    pub name: String,
    pub kind: PaymentMethodKind,
}

impl PaymentMethod {
    pub fn other(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: PaymentMethodKind::Other,
        }
    }

    pub fn credit_card(
        id: Id,
        name: impl Into<String>,
        closing_day: u32,
        due_day: u32,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            id,
            name: name.into(),
            kind: PaymentMethodKind::CreditCard {
                closing_day: ensure_day("closing day", closing_day)?,
                due_day: ensure_day("due day", due_day)?,
            },
        })
    }

    /// `(closing_day, due_day)` for credit cards.
    pub fn card_days(&self) -> Option<(u32, u32)> {
        match self.kind {
            PaymentMethodKind::CreditCard {
                closing_day,
                due_day,
            } => Some((closing_day, due_day)),
            PaymentMethodKind::Other => None,
        }
    }

    pub fn type_str(&self) -> &'static str {
        match self.kind {
            PaymentMethodKind::CreditCard { .. } => "credit_card",
            PaymentMethodKind::Other => "other",
        }
    }
}

fn ensure_day(field: &'static str, value: u32) -> Result<u32, LedgerError> {
    if (1..=31).contains(&value) {
        Ok(value)
    } else {
        Err(LedgerError::InvalidDay { field, value })
    }
}

/// Which month a credit-card expense is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CreditCardLogic {
    /// Month in which the purchase's billing cycle closes.
    #[default]
    TransactionDate,
    /// Month in which the closed invoice is due.
    ClosingDay,
}

impl CreditCardLogic {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditCardLogic::TransactionDate => "transaction_date",
            CreditCardLogic::ClosingDay => "closing_day",
        }
    }
}

impl FromStr for CreditCardLogic {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "transaction_date" => Ok(CreditCardLogic::TransactionDate),
            "closing_day" => Ok(CreditCardLogic::ClosingDay),
            other => Err(LedgerError::UnknownVariant {
                kind: "credit card logic",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserPreferences {
    pub credit_card_logic: CreditCardLogic,
}

/// One user's complete dataset. Every engine function reads from this by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    pub transactions: Vec<Transaction>,
    pub subscriptions: Vec<Subscription>,
    pub payment_methods: Vec<PaymentMethod>,
    pub preferences: UserPreferences,
}

impl Ledger {
    pub fn payment_method(&self, id: &Id) -> Option<&PaymentMethod> {
        find_payment_method(&self.payment_methods, id)
    }

    /// Normalize a user-supplied name or id into a payment method id.
    pub fn resolve_payment_method(&self, name_or_id: &str) -> Result<Id, LedgerError> {
        let key = name_or_id.trim();
        self.payment_methods
            .iter()
            .find(|pm| pm.id.as_str() == key)
            .or_else(|| {
                self.payment_methods
                    .iter()
                    .find(|pm| pm.name.eq_ignore_ascii_case(key))
            })
            .map(|pm| pm.id.clone())
            .ok_or_else(|| LedgerError::UnknownPaymentMethod(key.to_string()))
    }

    pub fn transaction(&self, id: &Id) -> Option<&Transaction> {
        self.transactions.iter().find(|t| &t.id == id)
    }

    pub fn subscription(&self, id: &Id) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| &s.id == id)
    }
}

pub fn find_payment_method<'a>(methods: &'a [PaymentMethod], id: &Id) -> Option<&'a PaymentMethod> {
    methods.iter().find(|pm| &pm.id == id)
}
