// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Installment groups: one purchase split into monthly expenses sharing a group id.
//!
//! Every operation takes the full transaction list and returns the new one.
//! An operation aimed at a group with no members returns the input unchanged.
//! Members that an operation drops take their reimbursement income with them.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::calendar::{add_months, YearMonth};
use crate::error::LedgerError;
use crate::models::{
    ensure_positive, Id, IdGenerator, Origin, Reimbursement, Transaction, TransactionKind,
};
use crate::reimbursement::prune_orphaned_reimbursements;

/// Upper bound on installments in one plan (fifty years of monthly payments).
pub const MAX_INSTALLMENTS: u32 = 600;

static INSTALLMENT_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(\d+/\d+\)$").expect("installment suffix regex"));

/// Description without the trailing `(i/N)` marker.
pub fn base_title(description: &str) -> String {
    INSTALLMENT_SUFFIX.replace(description, "").trim().to_string()
}

fn suffix_of(description: &str) -> Option<&str> {
    INSTALLMENT_SUFFIX.find(description).map(|m| m.as_str().trim())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallmentPlan {
    pub title: String,
    pub category: String,
    pub payment_method: Id,
    pub start: NaiveDate,
    pub count: u32,
    pub total: Decimal,
}

impl InstallmentPlan {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        payment_method: Id,
        start: NaiveDate,
        count: u32,
        total: Decimal,
    ) -> Result<Self, LedgerError> {
        if count == 0 {
            return Err(LedgerError::EmptyInstallmentPlan);
        }
        if count > MAX_INSTALLMENTS {
            return Err(LedgerError::TooManyInstallments {
                max: MAX_INSTALLMENTS,
                got: count,
            });
        }
        let total = ensure_positive(total)?;
        ensure_positive(installment_share(total, count))?;
        Ok(Self {
            title: title.into().trim().to_string(),
            category: category.into(),
            payment_method,
            start,
            count,
            total,
        })
    }

    /// Amounts of each installment, in order. Every installment is the total
    /// split evenly and rounded to cents; the last one absorbs the remainder.
    pub fn amounts(&self) -> Vec<Decimal> {
        if self.count == 0 {
            return Vec::new();
        }
        let share = installment_share(self.total, self.count);
        let last = self.total - share * Decimal::from(self.count - 1);
        (1..=self.count)
            .map(|i| if i == self.count { last } else { share })
            .collect()
    }
}

fn installment_share(total: Decimal, count: u32) -> Decimal {
    (total / Decimal::from(count)).round_dp(2)
}

/// What a whole-group edit does with the reimbursement terms.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReimbursementEdit {
    /// Keep the prototype's debtor. Reimbursed status resets.
    #[default]
    Keep,
    NotReimbursable,
    OwedBy(Option<String>),
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallmentGroup {
    pub group_id: Id,
    pub title: String,
    pub category: String,
    pub payment_method: Id,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total: Decimal,
    pub paid: Decimal,
    pub remaining: Decimal,
    pub progress: Decimal,
    pub members: Vec<Transaction>,
}

impl InstallmentGroup {
    pub fn future_members(&self, today: NaiveDate) -> usize {
        self.members.iter().filter(|t| t.date > today).count()
    }

    pub fn is_finished(&self) -> bool {
        self.progress >= Decimal::ONE_HUNDRED
    }
}

fn build_members(
    plan: &InstallmentPlan,
    group_id: &Id,
    reimbursement: Option<Reimbursement>,
    ids: &dyn IdGenerator,
) -> Vec<Transaction> {
    plan.amounts()
        .into_iter()
        .enumerate()
        .map(|(i, amount)| Transaction {
            id: ids.new_id(),
            amount,
            category: plan.category.clone(),
            payment_method: plan.payment_method.clone(),
            kind: TransactionKind::Expense,
            description: format!("{} ({}/{})", plan.title, i + 1, plan.count),
            date: add_months(plan.start, i as u32),
            group_id: Some(group_id.clone()),
            origin: Origin::Manual,
            reimbursement: reimbursement.clone(),
        })
        .collect()
}

/// Members of `group_id`, earliest first. The first one is the prototype.
pub fn members<'a>(transactions: &'a [Transaction], group_id: &Id) -> Vec<&'a Transaction> {
    let mut out: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.group_id.as_ref() == Some(group_id))
        .collect();
    out.sort_by(|a, b| a.date.cmp(&b.date));
    out
}

fn without_group(transactions: &[Transaction], group_id: &Id) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|t| t.group_id.as_ref() != Some(group_id))
        .cloned()
        .collect()
}

/// New installment transactions for `plan`, all sharing a fresh group id.
pub fn create_group(
    plan: &InstallmentPlan,
    reimbursement: Option<Reimbursement>,
    ids: &dyn IdGenerator,
) -> Vec<Transaction> {
    let group_id = ids.new_id();
    build_members(plan, &group_id, reimbursement, ids)
}

/// Replace every member of the group with installments regenerated from `plan`.
pub fn edit_group(
    transactions: &[Transaction],
    group_id: &Id,
    plan: &InstallmentPlan,
    reimbursement: ReimbursementEdit,
    ids: &dyn IdGenerator,
) -> Vec<Transaction> {
    let existing = members(transactions, group_id);
    let Some(prototype) = existing.first() else {
        debug!(group = %group_id, "edit on empty installment group ignored");
        return transactions.to_vec();
    };
    let terms = match reimbursement {
        ReimbursementEdit::Keep => prototype
            .reimbursement
            .as_ref()
            .map(|r| Reimbursement::owed_by(r.debtor.clone())),
        ReimbursementEdit::NotReimbursable => None,
        ReimbursementEdit::OwedBy(debtor) => Some(Reimbursement::owed_by(debtor)),
    };
    let mut out = without_group(transactions, group_id);
    out.extend(build_members(plan, group_id, terms, ids));
    prune_orphaned_reimbursements(out)
}

/// Update title and category on every member, keeping each `(i/N)` marker.
pub fn rename_group(
    transactions: &[Transaction],
    group_id: &Id,
    title: &str,
    category: &str,
) -> Vec<Transaction> {
    let title = title.trim();
    transactions
        .iter()
        .map(|t| {
            if t.group_id.as_ref() != Some(group_id) {
                return t.clone();
            }
            let mut t = t.clone();
            t.category = category.to_string();
            if let Some(suffix) = suffix_of(&t.description).map(str::to_string) {
                t.description = format!("{} {}", title, suffix);
            }
            t
        })
        .collect()
}

/// Pay off `advance` upcoming installments today for `settlement`.
///
/// Installments dated on or before `today` stay as they are. The first
/// `advance` later ones are dropped and replaced by one settlement expense
/// dated today. The remaining later ones move to consecutive months starting
/// next month, keeping their day of month.
pub fn anticipate(
    transactions: &[Transaction],
    group_id: &Id,
    advance: usize,
    settlement: Decimal,
    today: NaiveDate,
    ids: &dyn IdGenerator,
) -> Vec<Transaction> {
    let group = members(transactions, group_id);
    let Some(prototype) = group.first() else {
        debug!(group = %group_id, "anticipation on empty installment group ignored");
        return transactions.to_vec();
    };
    let (past, future): (Vec<&Transaction>, Vec<&Transaction>) =
        group.iter().copied().partition(|t| t.date <= today);
    if future.is_empty() || advance == 0 || settlement <= Decimal::ZERO {
        debug!(group = %group_id, advance, "nothing to anticipate");
        return transactions.to_vec();
    }
    let advance = advance.min(future.len());
    let next_month = YearMonth::of(today).next();

    let rescheduled = future[advance..].iter().enumerate().map(|(i, t)| {
        let mut t = (*t).clone();
        t.date = next_month.add_months(i as i32).clamped_day(t.date.day());
        t
    });
    let settlement_tx = Transaction {
        id: ids.new_id(),
        amount: settlement,
        category: prototype.category.clone(),
        payment_method: prototype.payment_method.clone(),
        kind: TransactionKind::Expense,
        description: format!(
            "Anticipation ({} inst.): {}",
            advance,
            base_title(&prototype.description)
        ),
        date: today,
        group_id: Some(group_id.clone()),
        origin: Origin::Anticipation,
        reimbursement: None,
    };

    let mut out = without_group(transactions, group_id);
    out.extend(past.into_iter().cloned());
    out.extend(rescheduled);
    out.push(settlement_tx);
    prune_orphaned_reimbursements(out)
}

/// Removes every member of the group along with incomes recorded for them.
pub fn delete_group(transactions: &[Transaction], group_id: &Id) -> Vec<Transaction> {
    prune_orphaned_reimbursements(without_group(transactions, group_id))
}

pub fn group(transactions: &[Transaction], group_id: &Id, today: NaiveDate) -> Option<InstallmentGroup> {
    summarize_group(group_id, members(transactions, group_id), today)
}

/// Every installment group, most recently ending first.
pub fn groups(transactions: &[Transaction], today: NaiveDate) -> Vec<InstallmentGroup> {
    let mut by_group: BTreeMap<&Id, Vec<&Transaction>> = BTreeMap::new();
    for t in transactions {
        if let Some(gid) = &t.group_id {
            by_group.entry(gid).or_default().push(t);
        }
    }
    let mut out: Vec<InstallmentGroup> = by_group
        .into_iter()
        .filter_map(|(gid, mut txs)| {
            txs.sort_by(|a, b| a.date.cmp(&b.date));
            summarize_group(gid, txs, today)
        })
        .collect();
    out.sort_by(|a, b| b.end_date.cmp(&a.end_date));
    out
}

fn summarize_group(
    group_id: &Id,
    sorted: Vec<&Transaction>,
    today: NaiveDate,
) -> Option<InstallmentGroup> {
    let first = *sorted.first()?;
    let last = *sorted.last()?;
    let total: Decimal = sorted.iter().map(|t| t.amount).sum();
    let paid: Decimal = sorted
        .iter()
        .filter(|t| t.date <= today)
        .map(|t| t.amount)
        .sum();
    let progress = if total > Decimal::ZERO {
        (paid / total * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    };
    Some(InstallmentGroup {
        group_id: group_id.clone(),
        title: base_title(&first.description),
        category: first.category.clone(),
        payment_method: first.payment_method.clone(),
        start_date: first.date,
        end_date: last.date,
        total,
        paid,
        remaining: total - paid,
        progress,
        members: sorted.into_iter().cloned().collect(),
    })
}
