// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use rusqlite::Connection;
use tracing::info;

use super::Env;
use crate::db;
use crate::models::Id;
use crate::reimbursement::{mark_reimbursed, pending_reimbursements, undo_reimbursement, DebtorBalance};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, env: &Env, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(conn, sub)?,
        Some(("mark", sub)) => mark(conn, env, sub)?,
        Some(("undo", sub)) => undo(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn outstanding(conn: &Connection) -> Result<Vec<DebtorBalance>> {
    Ok(pending_reimbursements(&db::load_transactions(conn)?))
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = outstanding(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    if data.is_empty() {
        println!("Nobody owes you anything");
        return Ok(());
    }
    let mut rows = Vec::new();
    for balance in &data {
        for t in &balance.expenses {
            rows.push(vec![
                balance.debtor.clone(),
                t.date.to_string(),
                t.description.clone(),
                fmt_money(&t.amount),
                t.id.to_string(),
            ]);
        }
        rows.push(vec![
            balance.debtor.clone(),
            String::new(),
            "Total".into(),
            fmt_money(&balance.total),
            String::new(),
        ]);
    }
    println!(
        "{}",
        pretty_table(&["Debtor", "Date", "Description", "Amount", "Id"], rows)
    );
    Ok(())
}

fn expense_arg(sub: &clap::ArgMatches) -> Id {
    Id::from_string(sub.get_one::<String>("id").unwrap().trim())
}

fn mark(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let id = expense_arg(sub);
    let before = db::load_transactions(conn)?;
    let today = env.clock.today();
    let after = mark_reimbursed(&before, &id, today, env.ids);
    if after == before {
        bail!("Transaction '{}' is not an expense awaiting reimbursement", id);
    }
    db::apply_changes(conn, &before, &after)?;
    info!(expense = %id, %today, "reimbursement recorded");
    println!("Recorded reimbursement of {} on {}", id, today);
    Ok(())
}

fn undo(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = expense_arg(sub);
    let before = db::load_transactions(conn)?;
    let after = undo_reimbursement(&before, &id);
    if after == before {
        bail!("Transaction '{}' has no recorded reimbursement", id);
    }
    db::apply_changes(conn, &before, &after)?;
    info!(expense = %id, "reimbursement undone");
    println!("Reimbursement of {} undone", id);
    Ok(())
}
