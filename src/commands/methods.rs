// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use super::Env;
use crate::db;
use crate::models::{Ledger, PaymentMethod};
use crate::utils::{maybe_print_json, pretty_table};

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
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    if name.is_empty() {
        bail!("Payment method name cannot be empty");
    }
    let kind = sub.get_one::<String>("type").unwrap();
    let pm = if kind == "credit_card" {
        let closing = *sub
            .get_one::<u32>("closing-day")
            .context("--closing-day is required for credit cards")?;
        let due = *sub
            .get_one::<u32>("due-day")
            .context("--due-day is required for credit cards")?;
        PaymentMethod::credit_card(env.ids.new_id(), name, closing, due)?
    } else {
        PaymentMethod::other(env.ids.new_id(), name)
    };
    db::insert_payment_method(conn, &pm)?;
    info!(id = %pm.id, name = %pm.name, "payment method added");
    println!("Added payment method '{}' ({})", pm.name, pm.id);
    Ok(())
}

#[derive(Serialize)]
pub struct MethodRow {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub closing_day: Option<u32>,
    pub due_day: Option<u32>,
}

pub fn query_rows(conn: &Connection) -> Result<Vec<MethodRow>> {
    Ok(db::load_payment_methods(conn)?
        .into_iter()
        .map(|pm| {
            let days = pm.card_days();
            MethodRow {
                id: pm.id.to_string(),
                kind: pm.type_str().to_string(),
                name: pm.name,
                closing_day: days.map(|d| d.0),
                due_day: days.map(|d| d.1),
            }
        })
        .collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                let day = |d: Option<u32>| d.map(|v| v.to_string()).unwrap_or_default();
                vec![
                    r.name.clone(),
                    r.kind.clone(),
                    day(r.closing_day),
                    day(r.due_day),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Name", "Type", "Closing", "Due", "Id"], rows)
        );
    }
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let key = sub.get_one::<String>("name").unwrap();
    let ledger = Ledger {
        payment_methods: db::load_payment_methods(conn)?,
        ..Ledger::default()
    };
    let id = ledger.resolve_payment_method(key)?;
    let in_use = db::payment_method_usage(conn, &id)?;
    if in_use > 0 && !sub.get_flag("force") {
        bail!(
            "Payment method '{}' is used by {} record(s); pass --force to remove it anyway",
            key,
            in_use
        );
    }
    db::delete_payment_method(conn, &id)?;
    info!(id = %id, "payment method removed");
    println!("Removed payment method '{}'", key);
    Ok(())
}
