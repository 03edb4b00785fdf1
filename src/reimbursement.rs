// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::models::{Id, IdGenerator, Origin, Transaction, TransactionKind};

pub const REIMBURSEMENT_CATEGORY: &str = "Other";

/// Label used for reimbursable expenses with no debtor recorded.
pub const UNKNOWN_DEBTOR: &str = "(unspecified)";

/// Records the money paid back for `expense_id` as income dated `today` and
/// links it from the expense. Unknown, non-reimbursable or already reimbursed
/// expenses leave the list unchanged.
pub fn mark_reimbursed(
    transactions: &[Transaction],
    expense_id: &Id,
    today: NaiveDate,
    ids: &dyn IdGenerator,
) -> Vec<Transaction> {
    let Some(expense) = transactions.iter().find(|t| &t.id == expense_id) else {
        debug!(expense = %expense_id, "no such transaction");
        return transactions.to_vec();
    };
    match &expense.reimbursement {
        Some(r) if !r.is_reimbursed() => {}
        _ => {
            debug!(expense = %expense_id, "not awaiting reimbursement");
            return transactions.to_vec();
        }
    }

    let income = Transaction {
        id: ids.new_id(),
        amount: expense.amount,
        category: REIMBURSEMENT_CATEGORY.to_string(),
        payment_method: expense.payment_method.clone(),
        kind: TransactionKind::Income,
        description: format!("Reimbursement received: {}", expense.description),
        date: today,
        group_id: None,
        origin: Origin::Reimbursement {
            expense_id: expense_id.clone(),
        },
        reimbursement: None,
    };

    let mut out: Vec<Transaction> = transactions
        .iter()
        .cloned()
        .map(|mut t| {
            if &t.id == expense_id {
                if let Some(r) = t.reimbursement.as_mut() {
                    r.received = Some(income.id.clone());
                }
            }
            t
        })
        .collect();
    out.push(income);
    out
}

/// Reverses [`mark_reimbursed`]: drops the linked income and clears the link.
pub fn undo_reimbursement(transactions: &[Transaction], expense_id: &Id) -> Vec<Transaction> {
    let received = transactions
        .iter()
        .find(|t| &t.id == expense_id)
        .and_then(|t| t.reimbursement.as_ref())
        .and_then(|r| r.received.clone());
    let Some(income_id) = received else {
        debug!(expense = %expense_id, "nothing to undo");
        return transactions.to_vec();
    };

    transactions
        .iter()
        .filter(|t| t.id != income_id)
        .cloned()
        .map(|mut t| {
            if &t.id == expense_id {
                if let Some(r) = t.reimbursement.as_mut() {
                    r.received = None;
                }
            }
            t
        })
        .collect()
}

/// Drops reimbursement incomes whose expense is no longer in the list.
///
/// Operations that remove expenses in bulk (installment edits, anticipation,
/// group deletion) call this so the money received does not outlive the debt.
pub fn prune_orphaned_reimbursements(transactions: Vec<Transaction>) -> Vec<Transaction> {
    let live: HashSet<Id> = transactions.iter().map(|t| t.id.clone()).collect();
    transactions
        .into_iter()
        .filter(|t| match &t.origin {
            Origin::Reimbursement { expense_id } if !live.contains(expense_id) => {
                debug!(income = %t.id, expense = %expense_id, "dropping orphaned reimbursement");
                false
            }
            _ => true,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtorBalance {
    pub debtor: String,
    pub total: Decimal,
    pub expenses: Vec<Transaction>,
}

/// Outstanding reimbursable expenses grouped by debtor, oldest first within a debtor.
pub fn pending_reimbursements(transactions: &[Transaction]) -> Vec<DebtorBalance> {
    let mut by_debtor: BTreeMap<String, Vec<Transaction>> = BTreeMap::new();
    for t in transactions {
        let Some(r) = &t.reimbursement else { continue };
        if r.is_reimbursed() {
            continue;
        }
        let debtor = r
            .debtor
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(UNKNOWN_DEBTOR)
            .to_string();
        by_debtor.entry(debtor).or_default().push(t.clone());
    }
    by_debtor
        .into_iter()
        .map(|(debtor, mut expenses)| {
            expenses.sort_by(|a, b| a.date.cmp(&b.date));
            DebtorBalance {
                total: expenses.iter().map(|t| t.amount).sum(),
                debtor,
                expenses,
            }
        })
        .collect()
}
