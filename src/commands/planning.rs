// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::{month_or_current, Env};
use crate::db;
use crate::models::ensure_non_negative;
use crate::planning::{compare, upsert, PlanComparison, PlanningProfile};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, parse_month, pretty_table};

pub fn handle(conn: &Connection, env: &Env, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, env, sub)?,
        Some(("show", sub)) => show(conn, env, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Splits `CATEGORY=AMOUNT`.
fn parse_line(raw: &str) -> Result<(String, Decimal)> {
    let (category, amount) = raw
        .rsplit_once('=')
        .with_context(|| format!("Invalid planned expense '{}', expected CATEGORY=AMOUNT", raw))?;
    let category = category.trim();
    if category.is_empty() {
        bail!("Invalid planned expense '{}': empty category", raw);
    }
    Ok((category.to_string(), parse_decimal(amount.trim())?))
}

fn set(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let month = month_or_current(sub, env)?;
    let income = sub
        .get_one::<String>("income")
        .map(|s| parse_decimal(s))
        .transpose()?
        .map(ensure_non_negative)
        .transpose()?;

    let plans = db::load_plans(conn)?;
    let mut profile = match plans.iter().find(|p| p.month == month) {
        Some(existing) => existing.clone(),
        None => {
            let Some(income) = income else {
                bail!("No plan for {} yet; --income is required to create one", month);
            };
            PlanningProfile::draft(env.ids.new_id(), month, income, &db::load_budget(conn)?)
        }
    };
    if let Some(income) = income {
        profile.expected_income = income;
    }
    for raw in sub.get_many::<String>("expense").into_iter().flatten() {
        let (category, amount) = parse_line(raw)?;
        profile.set_line(&category, amount)?;
    }

    let stored = upsert(&plans, profile)
        .into_iter()
        .find(|p| p.month == month)
        .context("plan vanished after update")?;
    db::save_plan(conn, &stored)?;
    info!(month = %month, id = %stored.id, "plan saved");
    println!(
        "Plan for {}: income {}, planned {}, projected balance {}",
        month,
        fmt_money(&stored.expected_income),
        fmt_money(&stored.total_planned()),
        fmt_money(&stored.projected_balance())
    );
    Ok(())
}

/// Planned against actual for `--month`.
pub fn comparison(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<PlanComparison> {
    let month = month_or_current(sub, env)?;
    let profile = db::load_plans(conn)?
        .into_iter()
        .find(|p| p.month == month)
        .with_context(|| format!("No plan for {}", month))?;
    let ledger = db::load_ledger(conn)?;
    Ok(compare(&ledger, &profile, env.clock.today()))
}

fn show(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let c = comparison(conn, env, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &c)? {
        return Ok(());
    }
    let mut rows: Vec<Vec<String>> = c
        .lines
        .iter()
        .map(|l| {
            vec![
                l.category.clone(),
                fmt_money(&l.planned),
                fmt_money(&l.actual),
                fmt_money(&l.difference),
            ]
        })
        .collect();
    rows.push(vec![
        "Total expenses".into(),
        fmt_money(&c.total_planned),
        fmt_money(&c.total_actual),
        fmt_money(&(c.total_planned - c.total_actual)),
    ]);
    rows.push(vec![
        "Income".into(),
        fmt_money(&c.expected_income),
        fmt_money(&c.actual_income),
        fmt_money(&(c.actual_income - c.expected_income)),
    ]);
    rows.push(vec![
        "Balance".into(),
        fmt_money(&c.projected_balance),
        fmt_money(&c.actual_balance),
        String::new(),
    ]);
    rows.push(vec![
        "Savings rate".into(),
        format!("{}%", c.planned_savings_rate),
        format!("{}%", c.actual_savings_rate),
        String::new(),
    ]);
    println!("Plan for {}", c.month);
    println!(
        "{}",
        pretty_table(&["Category", "Planned", "Actual", "Difference"], rows)
    );
    Ok(())
}

#[derive(Serialize)]
struct PlanRow {
    id: String,
    month: String,
    expected_income: String,
    total_planned: String,
    projected_balance: String,
    savings_rate: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data: Vec<PlanRow> = db::load_plans(conn)?
        .iter()
        .map(|p| PlanRow {
            id: p.id.to_string(),
            month: p.month.to_string(),
            expected_income: fmt_money(&p.expected_income),
            total_planned: fmt_money(&p.total_planned()),
            projected_balance: fmt_money(&p.projected_balance()),
            savings_rate: format!("{}%", p.savings_rate()),
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.month.clone(),
                    r.expected_income.clone(),
                    r.total_planned.clone(),
                    r.projected_balance.clone(),
                    r.savings_rate.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Month", "Expected income", "Planned", "Projected balance", "Savings rate"],
                rows
            )
        );
    }
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    if !db::delete_plan(conn, month)? {
        bail!("No plan for {}", month);
    }
    info!(month = %month, "plan removed");
    println!("Deleted plan for {}", month);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planned_expense_lines_parse() {
        assert_eq!(
            parse_line("Food = 850.50").unwrap(),
            ("Food".to_string(), Decimal::new(85050, 2))
        );
        assert_eq!(
            parse_line("Bar=Pub=30").unwrap(),
            ("Bar=Pub".to_string(), Decimal::from(30))
        );
        assert!(parse_line("Food").is_err());
        assert!(parse_line("=10").is_err());
        assert!(parse_line("Food=abc").is_err());
    }
}
