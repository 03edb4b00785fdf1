// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use super::{month_or_current, Env};
use crate::calendar::YearMonth;
use crate::db;
use crate::models::{Id, Ledger, Lifetime, Subscription};
use crate::recurrence::{materialize, pending_occurrences, projected_occurrences};
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table};

pub fn handle(conn: &Connection, env: &Env, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, env, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        Some(("pending", sub)) => pending(conn, env, sub)?,
        Some(("launch", sub)) => launch(conn, env, sub)?,
        _ => {}
    }
    Ok(())
}

fn method_name(ledger: &Ledger, id: &Id) -> String {
    ledger
        .payment_method(id)
        .map(|pm| pm.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn add(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let ledger = db::load_ledger(conn)?;
    let start = parse_date(sub.get_one::<String>("start").unwrap())?;
    let lifetime = match sub.get_one::<String>("until") {
        Some(u) => Lifetime::Until(parse_date(u)?),
        None => Lifetime::Indefinite,
    };
    let s = Subscription::new(
        env.ids.new_id(),
        sub.get_one::<String>("name").unwrap().trim(),
        parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        sub.get_one::<String>("category").unwrap().trim(),
        ledger.resolve_payment_method(sub.get_one::<String>("method").unwrap())?,
        start,
        lifetime,
        sub.get_one::<String>("debtor")
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
    )?;
    db::insert_subscription(conn, &s)?;
    info!(id = %s.id, name = %s.name, "subscription added");
    println!(
        "Added subscription '{}' billed on day {} ({})",
        s.name,
        s.billing_day(),
        s.id
    );
    Ok(())
}

/// Rebuilds the subscription from its current fields and the given flags so
/// the result goes through the same validation as a new one. Occurrences
/// already launched keep their original amount and date.
fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let ledger = db::load_ledger(conn)?;
    let id = Id::from_string(sub.get_one::<String>("id").unwrap().trim());
    let current = ledger
        .subscription(&id)
        .with_context(|| format!("Subscription '{}' not found", id))?;

    let lifetime = if sub.get_flag("indefinite") {
        Lifetime::Indefinite
    } else {
        match sub.get_one::<String>("until") {
            Some(u) => Lifetime::Until(parse_date(u)?),
            None => current.lifetime,
        }
    };
    let debtor = if sub.get_flag("no-debtor") {
        None
    } else {
        match sub.get_one::<String>("debtor") {
            Some(d) => Some(d.trim().to_string()).filter(|d| !d.is_empty()),
            None => current.debtor.clone(),
        }
    };
    let updated = Subscription::new(
        current.id.clone(),
        sub.get_one::<String>("name")
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| current.name.clone()),
        match sub.get_one::<String>("amount") {
            Some(a) => parse_decimal(a)?,
            None => current.amount,
        },
        sub.get_one::<String>("category")
            .map(|c| c.trim().to_string())
            .unwrap_or_else(|| current.category.clone()),
        match sub.get_one::<String>("method") {
            Some(m) => ledger.resolve_payment_method(m)?,
            None => current.payment_method.clone(),
        },
        match sub.get_one::<String>("start") {
            Some(s) => parse_date(s)?,
            None => current.start_date,
        },
        lifetime,
        debtor,
    )?;
    if &updated == current {
        println!("Subscription '{}' unchanged", current.name);
        return Ok(());
    }
    db::update_subscription(conn, &updated)?;
    info!(id = %updated.id, name = %updated.name, "subscription updated");
    println!("Updated subscription '{}' ({})", updated.name, updated.id);
    Ok(())
}

#[derive(Serialize)]
pub struct SubscriptionRow {
    pub id: String,
    pub name: String,
    pub amount: String,
    pub category: String,
    pub payment_method: String,
    pub start_date: String,
    pub until: Option<String>,
    pub debtor: Option<String>,
}

pub fn query_rows(conn: &Connection) -> Result<Vec<SubscriptionRow>> {
    let ledger = db::load_ledger(conn)?;
    Ok(ledger
        .subscriptions
        .iter()
        .map(|s| SubscriptionRow {
            id: s.id.to_string(),
            name: s.name.clone(),
            amount: fmt_money(&s.amount),
            category: s.category.clone(),
            payment_method: method_name(&ledger, &s.payment_method),
            start_date: s.start_date.to_string(),
            until: match s.lifetime {
                Lifetime::Indefinite => None,
                Lifetime::Until(d) => Some(d.to_string()),
            },
            debtor: s.debtor.clone(),
        })
        .collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    r.amount.clone(),
                    r.category.clone(),
                    r.payment_method.clone(),
                    r.start_date.clone(),
                    r.until.clone().unwrap_or_else(|| "-".into()),
                    r.debtor.clone().unwrap_or_default(),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Name", "Amount", "Category", "Method", "Start", "Until", "Debtor", "Id"],
                rows
            )
        );
    }
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = Id::from_string(sub.get_one::<String>("id").unwrap().trim());
    if !db::delete_subscription(conn, &id)? {
        bail!("Subscription '{}' not found", id);
    }
    info!(id = %id, "subscription removed");
    println!("Deleted subscription {}", id);
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct PendingRow {
    pub subscription_id: String,
    pub name: String,
    pub amount: String,
    pub payment_method: String,
    pub billing_date: String,
    pub effective_date: String,
}

pub fn pending_rows(conn: &Connection, month: YearMonth) -> Result<Vec<PendingRow>> {
    let ledger = db::load_ledger(conn)?;
    Ok(projected_occurrences(&ledger, month)
        .into_iter()
        .map(|o| PendingRow {
            subscription_id: o.subscription_id.to_string(),
            payment_method: method_name(&ledger, &o.payment_method),
            amount: fmt_money(&o.amount),
            billing_date: o.billing_date.to_string(),
            effective_date: o.effective_date.to_string(),
            name: o.name,
        })
        .collect())
}

fn pending(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let month = month_or_current(sub, env)?;
    let data = pending_rows(conn, month)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        if data.is_empty() {
            println!("No pending subscription charges count in {}", month);
            return Ok(());
        }
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    r.amount.clone(),
                    r.payment_method.clone(),
                    r.billing_date.clone(),
                    r.effective_date.clone(),
                    r.subscription_id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Name", "Amount", "Method", "Bills on", "Counts on", "Subscription"],
                rows
            )
        );
    }
    Ok(())
}

fn launch(conn: &Connection, env: &Env, sub: &clap::ArgMatches) -> Result<()> {
    let ledger = db::load_ledger(conn)?;
    let id = Id::from_string(sub.get_one::<String>("id").unwrap().trim());
    let month = month_or_current(sub, env)?;
    let subscription = ledger
        .subscription(&id)
        .with_context(|| format!("Subscription '{}' not found", id))?;
    let Some(occurrence) = pending_occurrences(&ledger, subscription, month).into_iter().next() else {
        bail!(
            "No pending charge of '{}' counts in {}",
            subscription.name,
            month
        );
    };
    let t = materialize(&occurrence, env.ids.new_id());
    db::save_transaction(conn, &t)?;
    info!(subscription = %id, month = %occurrence.nominal_month, transaction = %t.id, "subscription launched");
    println!(
        "Launched '{}' {} on {} [{}]",
        t.description,
        fmt_money(&t.amount),
        t.date,
        t.id
    );
    Ok(())
}
