// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use super::{reimbursement_terms, Env};
use crate::calendar::YearMonth;
use crate::db;
use crate::effective_date::resolve;
use crate::models::{Id, Origin, Transaction, TransactionKind};
use crate::reimbursement::undo_reimbursement;
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_decimal, parse_month, pretty_table};

pub fn handle(conn: &Connection, env: &Env, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, env, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let kind: TransactionKind = sub.get_one::<String>("type").unwrap().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let description = sub.get_one::<String>("description").unwrap();
    let category = sub.get_one::<String>("category").unwrap();
    let method = sub.get_one::<String>("method").unwrap();

    let ledger = db::load_ledger(conn)?;
    let payment_method = ledger.resolve_payment_method(method)?;
    let terms = match kind {
        TransactionKind::Expense => reimbursement_terms(sub),
        _ => None,
    };
    let t = Transaction::new(
        env.ids.new_id(),
        kind,
        amount,
        date,
        description.trim(),
        category.trim(),
        payment_method,
    )?
    .with_reimbursement(terms);
    db::save_transaction(conn, &t)?;

    let effective = resolve(&t, &ledger.payment_methods, &ledger.preferences);
    info!(id = %t.id, kind = kind.as_str(), %amount, %date, %effective, "transaction recorded");
    if effective != date {
        println!(
            "Recorded {} {} on {} (counts on {}) [{}]",
            kind.as_str(),
            fmt_money(&amount),
            date,
            effective,
            t.id
        );
    } else {
        println!("Recorded {} {} on {} [{}]", kind.as_str(), fmt_money(&amount), date, t.id);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    pub effective_date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: String,
    pub category: String,
    pub description: String,
    pub payment_method: String,
    pub group_id: Option<String>,
    pub origin: String,
    pub reimbursement: String,
}

fn reimbursement_label(t: &Transaction) -> String {
    match &t.reimbursement {
        None => String::new(),
        Some(r) => {
            let who = r.debtor.as_deref().unwrap_or("someone");
            if r.is_reimbursed() {
                format!("paid back by {}", who)
            } else {
                format!("owed by {}", who)
            }
        }
    }
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let ledger = db::load_ledger(conn)?;
    let month = sub.get_one::<String>("month").map(|s| parse_month(s)).transpose()?;
    let method = sub
        .get_one::<String>("method")
        .map(|s| ledger.resolve_payment_method(s))
        .transpose()?;
    let category = sub.get_one::<String>("category");
    let kind = sub
        .get_one::<String>("type")
        .map(|s| s.parse::<TransactionKind>())
        .transpose()?;

    let mut rows: Vec<(chrono::NaiveDate, &Transaction)> = ledger
        .transactions
        .iter()
        .map(|t| (resolve(t, &ledger.payment_methods, &ledger.preferences), t))
        .filter(|(eff, _)| month.is_none_or(|m| YearMonth::of(*eff) == m))
        .filter(|(_, t)| method.as_ref().is_none_or(|pm| &t.payment_method == pm))
        .filter(|(_, t)| category.is_none_or(|c| t.category.eq_ignore_ascii_case(c)))
        .filter(|(_, t)| kind.is_none_or(|k| t.kind == k))
        .collect();
    rows.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.date.cmp(&a.1.date)));
    if let Some(limit) = sub.get_one::<usize>("limit") {
        rows.truncate(*limit);
    }

    Ok(rows
        .into_iter()
        .map(|(eff, t)| TransactionRow {
            id: t.id.to_string(),
            date: t.date.to_string(),
            effective_date: eff.to_string(),
            kind: t.kind.as_str().to_string(),
            amount: fmt_money(&t.amount),
            category: t.category.clone(),
            description: t.description.clone(),
            payment_method: ledger
                .payment_method(&t.payment_method)
                .map(|pm| pm.name.clone())
                .unwrap_or_else(|| t.payment_method.to_string()),
            group_id: t.group_id.as_ref().map(|g| g.to_string()),
            origin: t.origin.as_str().to_string(),
            reimbursement: reimbursement_label(t),
        })
        .collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.effective_date.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.description.clone(),
                    r.payment_method.clone(),
                    r.reimbursement.clone(),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "Date",
                    "Counts on",
                    "Type",
                    "Amount",
                    "Category",
                    "Description",
                    "Method",
                    "Reimbursement",
                    "Id"
                ],
                rows,
            )
        );
    }
    Ok(())
}

/// Deleting either side of a reimbursement also unwinds the link.
fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = Id::from_string(sub.get_one::<String>("id").unwrap().trim());
    let before = db::load_transactions(conn)?;
    let Some(target) = before.iter().find(|t| t.id == id) else {
        bail!("Transaction '{}' not found", id);
    };
    let unlinked = match &target.origin {
        Origin::Reimbursement { expense_id } => undo_reimbursement(&before, expense_id),
        _ => undo_reimbursement(&before, &id),
    };
    let after: Vec<Transaction> = unlinked.into_iter().filter(|t| t.id != id).collect();
    let changes = db::apply_changes(conn, &before, &after)?;
    info!(id = %id, ?changes, "transaction removed");
    println!("Deleted transaction {}", id);
    Ok(())
}
