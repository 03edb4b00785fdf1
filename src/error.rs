// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Errors raised while building domain values from caller input.
///
/// The projection engine itself never fails; these only guard construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("amount must not be negative, got {0}")]
    NegativeAmount(Decimal),
    #[error("{field} must be a day of month between 1 and 31, got {value}")]
    InvalidDay { field: &'static str, value: u32 },
    #[error("subscription ends on {until} which is before its start {start}")]
    LifetimeBeforeStart { start: NaiveDate, until: NaiveDate },
    #[error("an installment plan needs at least one installment")]
    EmptyInstallmentPlan,
    #[error("an installment plan allows at most {max} installments, got {got}")]
    TooManyInstallments { max: u32, got: u32 },
    #[error("payment method '{0}' not found")]
    UnknownPaymentMethod(String),
    #[error("invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
    #[error("goal '{0}' not found")]
    UnknownGoal(String),
    #[error("cannot withdraw {requested} from '{goal}', only {available} is saved")]
    InsufficientGoalBalance {
        goal: String,
        available: Decimal,
        requested: Decimal,
    },
    #[error("transaction {0} is not a manual investment and cannot be linked to a goal")]
    NotLinkable(String),
    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}
