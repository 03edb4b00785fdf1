// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use super::{month_or_current, Env};
use crate::budget::{budget_vs_actual, Budget, BudgetLine};
use crate::db;
use crate::models::ensure_positive;
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};

pub fn handle(conn: &Connection, env: &Env, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        Some(("salary", sub)) => salary(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("report", sub)) => report(conn, env, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let category = sub.get_one::<String>("category").unwrap().trim();
    let amount = ensure_positive(parse_decimal(sub.get_one::<String>("amount").unwrap())?)?;
    if category.is_empty() {
        bail!("Category must not be empty");
    }
    db::set_budget(conn, category, amount)?;
    info!(category, %amount, "budget set");
    println!("Budget set for {} = {}", category, fmt_money(&amount));
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let category = sub.get_one::<String>("category").unwrap().trim();
    if !db::delete_budget(conn, category)? {
        bail!("No budget for '{}'", category);
    }
    info!(category, "budget removed");
    println!("Removed budget for {}", category);
    Ok(())
}

fn salary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = ensure_positive(parse_decimal(sub.get_one::<String>("amount").unwrap())?)?;
    db::set_salary(conn, amount)?;
    info!(%amount, "salary set");
    println!("Salary = {}", fmt_money(&amount));
    Ok(())
}

#[derive(Serialize)]
struct BudgetOverview<'a> {
    salary: Option<String>,
    total_budgeted: String,
    unallocated: Option<String>,
    allocations: &'a BTreeMap<String, Decimal>,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let budget = db::load_budget(conn)?;
    let overview = BudgetOverview {
        salary: budget.salary.as_ref().map(fmt_money),
        total_budgeted: fmt_money(&budget.total_budgeted()),
        unallocated: budget.unallocated().as_ref().map(fmt_money),
        allocations: &budget.allocations,
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &overview)? {
        return Ok(());
    }
    let mut rows: Vec<Vec<String>> = budget
        .allocations
        .iter()
        .map(|(c, a)| vec![c.clone(), fmt_money(a)])
        .collect();
    rows.push(vec!["Total budgeted".into(), overview.total_budgeted.clone()]);
    if let (Some(salary), Some(unallocated)) = (&overview.salary, &overview.unallocated) {
        rows.push(vec!["Salary".into(), salary.clone()]);
        rows.push(vec!["Unallocated".into(), unallocated.clone()]);
    }
    println!("{}", pretty_table(&["Category", "Budget"], rows));
    Ok(())
}

/// Budget lines for `--month`, most consumed first.
pub fn report_lines(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<(Budget, Vec<BudgetLine>)> {
    let month = month_or_current(sub, env)?;
    let ledger = db::load_ledger(conn)?;
    let budget = db::load_budget(conn)?;
    let lines = budget_vs_actual(&ledger, &budget, month, env.clock.today());
    Ok((budget, lines))
}

fn report(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let (budget, lines) = report_lines(conn, env, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &lines)? {
        return Ok(());
    }
    if budget.allocations.is_empty() {
        println!("No budgets set. Use `budget set --category <name> --amount <n>`.");
        return Ok(());
    }
    let rows = lines
        .iter()
        .map(|l| {
            vec![
                l.category.clone(),
                fmt_money(&l.budget),
                fmt_money(&l.spent),
                fmt_money(&l.remaining),
                format!("{}%", l.percentage),
                if l.over_budget { "over".into() } else { String::new() },
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Category", "Budget", "Spent", "Remaining", "Used", ""],
            rows
        )
    );
    Ok(())
}
