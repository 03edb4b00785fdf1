// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Investment goals.
//!
//! A goal stores only its target and the amounts that never pass through the
//! ledger (the starting balance and reported earnings). Contributions and
//! withdrawals are ordinary transactions tagged with the goal's id, so the
//! saved balance is always derived and deleting one of those transactions
//! adjusts the goal with no extra bookkeeping.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::error::LedgerError;
use crate::models::{
    ensure_non_negative, ensure_positive, Id, IdGenerator, Origin, Transaction, TransactionKind,
};

/// Category given to goal contributions.
pub const GOAL_CATEGORY: &str = "Investments";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvestmentGoal {
    pub id: Id,
    pub name: String,
    pub target: Decimal,
    pub category: String,
    pub deadline: Option<NaiveDate>,
    /// Amount already saved when the goal was created.
    pub initial_amount: Decimal,
    /// Returns reported on top of contributions.
    pub earnings: Decimal,
}

impl InvestmentGoal {
    pub fn new(
        id: Id,
        name: impl Into<String>,
        target: Decimal,
        category: impl Into<String>,
        deadline: Option<NaiveDate>,
        initial_amount: Decimal,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            id,
            name: name.into().trim().to_string(),
            target: ensure_positive(target)?,
            category: category.into(),
            deadline,
            initial_amount: ensure_non_negative(initial_amount)?,
            earnings: Decimal::ZERO,
        })
    }
}

/// Goal lookup by id, then by case-insensitive name.
pub fn resolve_goal<'a>(
    goals: &'a [InvestmentGoal],
    name_or_id: &str,
) -> Result<&'a InvestmentGoal, LedgerError> {
    let key = name_or_id.trim();
    goals
        .iter()
        .find(|g| g.id.as_str() == key)
        .or_else(|| goals.iter().find(|g| g.name.eq_ignore_ascii_case(key)))
        .ok_or_else(|| LedgerError::UnknownGoal(key.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalProgress {
    pub goal_id: Id,
    pub name: String,
    pub target: Decimal,
    pub deadline: Option<NaiveDate>,
    pub contributed: Decimal,
    pub withdrawn: Decimal,
    pub earnings: Decimal,
    pub current: Decimal,
    pub remaining: Decimal,
    pub percent: Decimal,
}

impl GoalProgress {
    pub fn is_reached(&self) -> bool {
        self.current >= self.target
    }
}

pub fn progress(goal: &InvestmentGoal, transactions: &[Transaction]) -> GoalProgress {
    let mut contributed = Decimal::ZERO;
    let mut withdrawn = Decimal::ZERO;
    for t in transactions {
        match &t.origin {
            Origin::Contribution { goal_id } if *goal_id == goal.id => contributed += t.amount,
            Origin::Withdrawal { goal_id } if *goal_id == goal.id => withdrawn += t.amount,
            _ => {}
        }
    }
    let current = (goal.initial_amount + goal.earnings + contributed - withdrawn).max(Decimal::ZERO);
    let percent = (current / goal.target * Decimal::ONE_HUNDRED)
        .min(Decimal::ONE_HUNDRED)
        .round_dp(2);
    GoalProgress {
        goal_id: goal.id.clone(),
        name: goal.name.clone(),
        target: goal.target,
        deadline: goal.deadline,
        contributed,
        withdrawn,
        earnings: goal.earnings,
        current,
        remaining: (goal.target - current).max(Decimal::ZERO),
        percent,
    }
}

fn goal_transaction(
    goal: &InvestmentGoal,
    kind: TransactionKind,
    amount: Decimal,
    today: NaiveDate,
    payment_method: Id,
    ids: &dyn IdGenerator,
) -> Transaction {
    let (category, description, origin) = match kind {
        TransactionKind::Income => (
            goal.category.clone(),
            format!("Withdrawal from investment: {}", goal.name),
            Origin::Withdrawal {
                goal_id: goal.id.clone(),
            },
        ),
        _ => (
            GOAL_CATEGORY.to_string(),
            format!("Contribution: {}", goal.name),
            Origin::Contribution {
                goal_id: goal.id.clone(),
            },
        ),
    };
    Transaction {
        id: ids.new_id(),
        amount,
        category,
        payment_method,
        kind,
        description,
        date: today,
        group_id: None,
        origin,
        reimbursement: None,
    }
}

/// Records `amount` invested into the goal today.
pub fn contribute(
    transactions: &[Transaction],
    goal: &InvestmentGoal,
    amount: Decimal,
    today: NaiveDate,
    payment_method: Id,
    ids: &dyn IdGenerator,
) -> Result<Vec<Transaction>, LedgerError> {
    let amount = ensure_positive(amount)?;
    let mut out = transactions.to_vec();
    out.push(goal_transaction(
        goal,
        TransactionKind::Investment,
        amount,
        today,
        payment_method,
        ids,
    ));
    Ok(out)
}

/// Takes `amount` out of the goal today as income. Fails when the goal holds less.
pub fn withdraw(
    transactions: &[Transaction],
    goal: &InvestmentGoal,
    amount: Decimal,
    today: NaiveDate,
    payment_method: Id,
    ids: &dyn IdGenerator,
) -> Result<Vec<Transaction>, LedgerError> {
    let amount = ensure_positive(amount)?;
    let available = progress(goal, transactions).current;
    if amount > available {
        return Err(LedgerError::InsufficientGoalBalance {
            goal: goal.name.clone(),
            available,
            requested: amount,
        });
    }
    let mut out = transactions.to_vec();
    out.push(goal_transaction(
        goal,
        TransactionKind::Income,
        amount,
        today,
        payment_method,
        ids,
    ));
    Ok(out)
}

/// Adds reported returns. No transaction is recorded.
pub fn add_earning(goal: &InvestmentGoal, amount: Decimal) -> Result<InvestmentGoal, LedgerError> {
    let amount = ensure_positive(amount)?;
    Ok(InvestmentGoal {
        earnings: goal.earnings + amount,
        ..goal.clone()
    })
}

/// Adopts existing manual investments as contributions to `goal_id`.
/// Fails without changing anything if any id is not a manual investment.
pub fn link_transactions(
    transactions: &[Transaction],
    goal_id: &Id,
    tx_ids: &[Id],
) -> Result<Vec<Transaction>, LedgerError> {
    for id in tx_ids {
        let linkable = transactions.iter().any(|t| {
            &t.id == id && t.kind == TransactionKind::Investment && t.origin == Origin::Manual
        });
        if !linkable {
            return Err(LedgerError::NotLinkable(id.to_string()));
        }
    }
    Ok(transactions
        .iter()
        .cloned()
        .map(|mut t| {
            if tx_ids.contains(&t.id) {
                t.origin = Origin::Contribution {
                    goal_id: goal_id.clone(),
                };
            }
            t
        })
        .collect())
}

/// Turns the goal's contributions and withdrawals back into manual
/// transactions so deleting the goal leaves the ledger untouched otherwise.
pub fn detach_goal(transactions: &[Transaction], goal_id: &Id) -> Vec<Transaction> {
    transactions
        .iter()
        .cloned()
        .map(|mut t| {
            if t.origin.goal_id() == Some(goal_id) {
                debug!(transaction = %t.id, goal = %goal_id, "detached from goal");
                t.origin = Origin::Manual;
            }
            t
        })
        .collect()
}

/// Manual investments not yet tied to any goal.
pub fn unlinked_investments(transactions: &[Transaction]) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Investment && t.origin == Origin::Manual)
        .collect()
}
