// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;

use super::{month_or_current, Env};
use crate::db;
use crate::summary::{category_breakdown, summarize, CategoryReport, MonthSummary};
use crate::utils::{fmt_money, maybe_print_json, parse_month, pretty_table};

pub fn handle(conn: &Connection, env: &Env, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("categories", sub)) => categories(conn, env, sub)?,
        _ => {}
    }
    Ok(())
}

/// Month summaries for `--month` and the following `--months - 1` months.
pub fn monthly(conn: &Connection, env: &Env, m: &clap::ArgMatches) -> Result<Vec<MonthSummary>> {
    let ledger = db::load_ledger(conn)?;
    let first = month_or_current(m, env)?;
    let count = m.get_one::<u32>("months").copied().unwrap_or(1);
    let today = env.clock.today();
    Ok((0..count)
        .map(|i| summarize(&ledger, first.add_months(i as i32), today))
        .collect())
}

pub fn summary(conn: &Connection, env: &Env, m: &clap::ArgMatches) -> Result<()> {
    let data = monthly(conn, env, m)?;
    if !maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|s| {
                vec![
                    s.month.to_string(),
                    fmt_money(&s.income),
                    fmt_money(&s.expense),
                    fmt_money(&s.projected_expense),
                    fmt_money(&s.investment),
                    fmt_money(&s.balance),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Month", "Income", "Expense", "of which projected", "Investment", "Balance"],
                rows
            )
        );
    }
    Ok(())
}

pub fn category_report(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<CategoryReport> {
    let from = parse_month(sub.get_one::<String>("from").unwrap())?;
    let to = parse_month(sub.get_one::<String>("to").unwrap())?;
    if to < from {
        bail!("--to ({}) is before --from ({})", to, from);
    }
    let ledger = db::load_ledger(conn)?;
    Ok(category_breakdown(&ledger, from, to, env.clock.today()))
}

fn categories(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let report = category_report(conn, env, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report.rows)? {
        return Ok(());
    }
    let months: Vec<String> = report.months.iter().map(|m| m.to_string()).collect();
    let mut headers: Vec<&str> = vec!["Category"];
    headers.extend(months.iter().map(String::as_str));
    headers.push("Total");

    let mut rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|r| {
            let mut row = vec![r.category.clone()];
            row.extend(report.months.iter().map(|m| {
                r.by_month.get(m).map(fmt_money).unwrap_or_else(|| "-".into())
            }));
            row.push(fmt_money(&r.total));
            row
        })
        .collect();
    let mut footer = vec!["Total".to_string()];
    footer.extend(report.months.iter().map(|m| fmt_money(&report.month_total(*m))));
    footer.push(fmt_money(&report.rows.iter().map(|r| r.total).sum::<Decimal>()));
    rows.push(footer);

    println!("{}", pretty_table(&headers, rows));
    Ok(())
}
