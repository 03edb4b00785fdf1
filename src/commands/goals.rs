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
use crate::goals::{
    add_earning, contribute, detach_goal, link_transactions, progress, resolve_goal, withdraw,
    GoalProgress, InvestmentGoal,
};
use crate::models::Id;
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table};

pub fn handle(conn: &Connection, env: &Env, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, env, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("contribute", sub)) => move_money(conn, env, sub, Movement::Contribute)?,
        Some(("withdraw", sub)) => move_money(conn, env, sub, Movement::Withdraw)?,
        Some(("earn", sub)) => earn(conn, sub)?,
        Some(("link", sub)) => link(conn, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn goal_arg(goals: &[InvestmentGoal], sub: &clap::ArgMatches) -> Result<InvestmentGoal> {
    Ok(resolve_goal(goals, sub.get_one::<String>("goal").unwrap())?.clone())
}

fn add(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let goal = InvestmentGoal::new(
        env.ids.new_id(),
        sub.get_one::<String>("name").unwrap(),
        parse_decimal(sub.get_one::<String>("target").unwrap())?,
        sub.get_one::<String>("category").unwrap().trim(),
        sub.get_one::<String>("deadline")
            .map(|d| parse_date(d))
            .transpose()?,
        parse_decimal(sub.get_one::<String>("initial").unwrap())?,
    )?;
    if goal.name.is_empty() {
        bail!("Goal name must not be empty");
    }
    db::save_goal(conn, &goal)?;
    info!(id = %goal.id, name = %goal.name, "goal added");
    println!(
        "Added goal '{}' targeting {} ({})",
        goal.name,
        fmt_money(&goal.target),
        goal.id
    );
    Ok(())
}

/// Progress of every goal, alphabetically.
pub fn progress_rows(conn: &Connection) -> Result<Vec<GoalProgress>> {
    let goals = db::load_goals(conn)?;
    let transactions = db::load_transactions(conn)?;
    Ok(goals.iter().map(|g| progress(g, &transactions)).collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = progress_rows(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|p| {
                vec![
                    p.name.clone(),
                    fmt_money(&p.current),
                    fmt_money(&p.target),
                    fmt_money(&p.remaining),
                    format!("{}%", p.percent),
                    p.deadline.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
                    p.goal_id.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Goal", "Saved", "Target", "Remaining", "Progress", "Deadline", "Id"],
                rows
            )
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Movement {
    Contribute,
    Withdraw,
}

fn move_money(conn: &Connection, env: &Env, sub: &clap::ArgMatches, movement: Movement) -> Result<()> {
    let ledger = db::load_ledger(conn)?;
    let goal = goal_arg(&db::load_goals(conn)?, sub)?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let method = ledger.resolve_payment_method(sub.get_one::<String>("method").unwrap())?;
    let today = env.clock.today();
    let after = match movement {
        Movement::Contribute => contribute(&ledger.transactions, &goal, amount, today, method, env.ids)?,
        Movement::Withdraw => withdraw(&ledger.transactions, &goal, amount, today, method, env.ids)?,
    };
    db::apply_changes(conn, &ledger.transactions, &after)?;
    let saved = progress(&goal, &after).current;
    info!(goal = %goal.id, ?movement, %amount, "goal balance changed");
    println!(
        "{} {} {} '{}' (saved {})",
        match movement {
            Movement::Contribute => "Contributed",
            Movement::Withdraw => "Withdrew",
        },
        fmt_money(&amount),
        match movement {
            Movement::Contribute => "to",
            Movement::Withdraw => "from",
        },
        goal.name,
        fmt_money(&saved)
    );
    Ok(())
}

fn earn(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let goal = goal_arg(&db::load_goals(conn)?, sub)?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let updated = add_earning(&goal, amount)?;
    db::save_goal(conn, &updated)?;
    info!(goal = %goal.id, %amount, "goal earnings recorded");
    println!("Recorded {} earned by '{}'", fmt_money(&amount), goal.name);
    Ok(())
}

fn link(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let goal = goal_arg(&db::load_goals(conn)?, sub)?;
    let tx_ids: Vec<Id> = sub
        .get_many::<String>("tx")
        .into_iter()
        .flatten()
        .map(|s| Id::from_string(s.trim()))
        .collect();
    let before = db::load_transactions(conn)?;
    let after = link_transactions(&before, &goal.id, &tx_ids)?;
    let changes = db::apply_changes(conn, &before, &after)?;
    info!(goal = %goal.id, ?changes, "transactions linked to goal");
    println!("Linked {} transaction(s) to '{}'", changes.updated, goal.name);
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let goal = goal_arg(&db::load_goals(conn)?, sub)?;
    let before = db::load_transactions(conn)?;
    let after = detach_goal(&before, &goal.id);
    let changes = db::apply_changes(conn, &before, &after)?;
    db::delete_goal(conn, &goal.id)?;
    info!(goal = %goal.id, ?changes, "goal removed");
    println!(
        "Deleted goal '{}'; {} transaction(s) kept as manual entries",
        goal.name, changes.updated
    );
    Ok(())
}
