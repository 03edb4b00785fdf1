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
use crate::db;
use crate::installments::{
    anticipate, create_group, delete_group, edit_group, groups, members, rename_group,
    InstallmentPlan, ReimbursementEdit,
};
use crate::models::{Id, Ledger, Transaction};
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table};

pub fn handle(conn: &Connection, env: &Env, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, env, sub)?,
        Some(("list", sub)) => list(conn, env, sub)?,
        Some(("edit", sub)) => edit(conn, env, sub)?,
        Some(("rename", sub)) => rename(conn, sub)?,
        Some(("anticipate", sub)) => advance(conn, env, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn plan_from_args(ledger: &Ledger, sub: &clap::ArgMatches) -> Result<InstallmentPlan> {
    Ok(InstallmentPlan::new(
        sub.get_one::<String>("title").unwrap(),
        sub.get_one::<String>("category").unwrap().trim(),
        ledger.resolve_payment_method(sub.get_one::<String>("method").unwrap())?,
        parse_date(sub.get_one::<String>("start").unwrap())?,
        *sub.get_one::<u32>("count").unwrap(),
        parse_decimal(sub.get_one::<String>("total").unwrap())?,
    )?)
}

fn group_arg(sub: &clap::ArgMatches) -> Id {
    Id::from_string(sub.get_one::<String>("group").unwrap().trim())
}

fn require_group(transactions: &[Transaction], group_id: &Id) -> Result<()> {
    if members(transactions, group_id).is_empty() {
        bail!("Installment group '{}' not found", group_id);
    }
    Ok(())
}

fn add(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let ledger = db::load_ledger(conn)?;
    let plan = plan_from_args(&ledger, sub)?;
    let created = create_group(&plan, reimbursement_terms(sub), env.ids);
    let mut after = ledger.transactions.clone();
    after.extend(created.iter().cloned());
    db::apply_changes(conn, &ledger.transactions, &after)?;

    let group_id = created
        .first()
        .and_then(|t| t.group_id.clone())
        .unwrap_or_default();
    info!(group = %group_id, count = plan.count, total = %plan.total, "installment group created");
    println!(
        "Created {} installments of '{}' totalling {} (group {})",
        plan.count,
        plan.title,
        fmt_money(&plan.total),
        group_id
    );
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct GroupRow {
    pub group_id: String,
    pub title: String,
    pub category: String,
    pub payment_method: String,
    pub start_date: String,
    pub end_date: String,
    pub installments: usize,
    pub remaining_installments: usize,
    pub total: String,
    pub paid: String,
    pub remaining: String,
    pub progress: String,
}

pub fn query_rows(conn: &Connection, env: &Env) -> Result<Vec<GroupRow>> {
    let ledger = db::load_ledger(conn)?;
    let today = env.clock.today();
    Ok(groups(&ledger.transactions, today)
        .into_iter()
        .map(|g| GroupRow {
            group_id: g.group_id.to_string(),
            payment_method: ledger
                .payment_method(&g.payment_method)
                .map(|pm| pm.name.clone())
                .unwrap_or_else(|| g.payment_method.to_string()),
            start_date: g.start_date.to_string(),
            end_date: g.end_date.to_string(),
            installments: g.members.len(),
            remaining_installments: g.future_members(today),
            total: fmt_money(&g.total),
            paid: fmt_money(&g.paid),
            remaining: fmt_money(&g.remaining),
            progress: format!("{}%", g.progress.round_dp(0)),
            title: g.title,
            category: g.category,
        })
        .collect())
}

fn list(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, env)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.title.clone(),
                    r.category.clone(),
                    r.payment_method.clone(),
                    format!("{} to {}", r.start_date, r.end_date),
                    format!(
                        "{}/{}",
                        r.installments - r.remaining_installments,
                        r.installments
                    ),
                    r.total.clone(),
                    r.remaining.clone(),
                    r.progress.clone(),
                    r.group_id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "Title",
                    "Category",
                    "Method",
                    "Period",
                    "Paid",
                    "Total",
                    "Remaining",
                    "Progress",
                    "Group"
                ],
                rows
            )
        );
    }
    Ok(())
}

fn edit(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let ledger = db::load_ledger(conn)?;
    let group_id = group_arg(sub);
    require_group(&ledger.transactions, &group_id)?;
    let plan = plan_from_args(&ledger, sub)?;
    let terms = if sub.get_flag("not-reimbursable") {
        ReimbursementEdit::NotReimbursable
    } else if let Some(d) = sub.get_one::<String>("debtor") {
        ReimbursementEdit::OwedBy(Some(d.trim().to_string()).filter(|d| !d.is_empty()))
    } else {
        ReimbursementEdit::Keep
    };
    let after = edit_group(&ledger.transactions, &group_id, &plan, terms, env.ids);
    let changes = db::apply_changes(conn, &ledger.transactions, &after)?;
    info!(group = %group_id, ?changes, "installment group edited");
    println!(
        "Regenerated {} installments of '{}' (group {})",
        plan.count, plan.title, group_id
    );
    Ok(())
}

fn rename(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let before = db::load_transactions(conn)?;
    let group_id = group_arg(sub);
    require_group(&before, &group_id)?;
    let title = sub.get_one::<String>("title").unwrap();
    let category = sub.get_one::<String>("category").unwrap().trim();
    let after = rename_group(&before, &group_id, title, category);
    let changes = db::apply_changes(conn, &before, &after)?;
    info!(group = %group_id, ?changes, "installment group renamed");
    println!("Updated {} installments", changes.updated);
    Ok(())
}

fn advance(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let before = db::load_transactions(conn)?;
    let group_id = group_arg(sub);
    require_group(&before, &group_id)?;
    let count = *sub.get_one::<usize>("count").unwrap();
    let settlement = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let today = env.clock.today();
    let after = anticipate(&before, &group_id, count, settlement, today, env.ids);
    if after == before {
        println!("Nothing to anticipate: no upcoming installments, zero count or zero amount");
        return Ok(());
    }
    let changes = db::apply_changes(conn, &before, &after)?;
    info!(group = %group_id, count, %settlement, ?changes, "installments anticipated");
    println!(
        "Settled {} upcoming installment(s) for {} on {}",
        changes.deleted,
        fmt_money(&settlement),
        today
    );
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let before = db::load_transactions(conn)?;
    let group_id = group_arg(sub);
    require_group(&before, &group_id)?;
    let after = delete_group(&before, &group_id);
    let changes = db::apply_changes(conn, &before, &after)?;
    info!(group = %group_id, deleted = changes.deleted, "installment group deleted");
    println!("Deleted {} installments", changes.deleted);
    Ok(())
}
