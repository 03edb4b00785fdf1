// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

use crate::db;
use crate::goals::InvestmentGoal;
use crate::models::{Ledger, Origin, TransactionKind};
use crate::utils::pretty_table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

impl Issue {
    fn new(kind: &'static str, detail: String) -> Self {
        Self { kind, detail }
    }
}

pub fn diagnose(ledger: &Ledger) -> Vec<Issue> {
    let mut issues = Vec::new();

    // 1) References to payment methods that no longer exist
    for t in &ledger.transactions {
        if ledger.payment_method(&t.payment_method).is_none() {
            issues.push(Issue::new(
                "unknown_payment_method",
                format!("transaction {} uses '{}'", t.id, t.payment_method),
            ));
        }
    }
    for s in &ledger.subscriptions {
        if ledger.payment_method(&s.payment_method).is_none() {
            issues.push(Issue::new(
                "unknown_payment_method",
                format!("subscription '{}' uses '{}'", s.name, s.payment_method),
            ));
        }
    }

    // 2) Reimbursement links that do not point at each other
    for t in &ledger.transactions {
        if let Some(received) = t.reimbursement.as_ref().and_then(|r| r.received.as_ref()) {
            let linked_back = ledger.transaction(received).is_some_and(|income| {
                matches!(&income.origin, Origin::Reimbursement { expense_id } if *expense_id == t.id)
            });
            if !linked_back {
                issues.push(Issue::new(
                    "dangling_reimbursement",
                    format!("expense {} points at missing income {}", t.id, received),
                ));
            }
        }
        if let Origin::Reimbursement { expense_id } = &t.origin {
            let links = ledger
                .transaction(expense_id)
                .and_then(|e| e.reimbursement.as_ref())
                .and_then(|r| r.received.as_ref())
                .is_some_and(|id| *id == t.id);
            if !links {
                issues.push(Issue::new(
                    "dangling_reimbursement",
                    format!("income {} refers to expense {} which does not link it", t.id, expense_id),
                ));
            }
        }
    }

    // 3) Card days that roll into the next month in short months
    for pm in &ledger.payment_methods {
        if let Some((closing, due)) = pm.card_days() {
            if closing > 28 || due > 28 {
                issues.push(Issue::new(
                    "card_day_rolls_over",
                    format!(
                        "'{}' closes on {} and is due on {}; short months shift these into the next month",
                        pm.name, closing, due
                    ),
                ));
            }
        }
    }

    issues
}

/// Goal contributions and withdrawals that point at a missing goal or carry
/// the wrong transaction type.
pub fn diagnose_goal_links(ledger: &Ledger, goals: &[InvestmentGoal]) -> Vec<Issue> {
    let mut issues = Vec::new();
    for t in &ledger.transactions {
        let (goal_id, expected) = match &t.origin {
            Origin::Contribution { goal_id } => (goal_id, TransactionKind::Investment),
            Origin::Withdrawal { goal_id } => (goal_id, TransactionKind::Income),
            _ => continue,
        };
        if !goals.iter().any(|g| &g.id == goal_id) {
            issues.push(Issue::new(
                "dangling_goal_link",
                format!("transaction {} refers to missing goal {}", t.id, goal_id),
            ));
        } else if t.kind != expected {
            issues.push(Issue::new(
                "goal_link_type",
                format!(
                    "{} {} of goal {} is recorded as {}",
                    t.origin.as_str(),
                    t.id,
                    goal_id,
                    t.kind.as_str()
                ),
            ));
        }
    }
    issues
}

pub fn handle(conn: &Connection) -> Result<()> {
    let ledger = db::load_ledger(conn)?;
    let mut issues = diagnose(&ledger);
    issues.extend(diagnose_goal_links(&ledger, &db::load_goals(conn)?));
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
