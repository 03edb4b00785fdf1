// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use rusqlite::Connection;
use serde::Serialize;

use super::{month_or_current, Env};
use crate::db;
use crate::invoice::{assemble, invoices_for_month, Invoice};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

#[derive(Serialize)]
pub struct InvoiceView {
    pub card: String,
    #[serde(flatten)]
    pub invoice: Invoice,
}

pub fn build(conn: &Connection, env: &Env, m: &clap::ArgMatches) -> Result<Vec<InvoiceView>> {
    let ledger = db::load_ledger(conn)?;
    let month = month_or_current(m, env)?;
    let invoices = match m.get_one::<String>("card") {
        Some(card) => {
            let id = ledger.resolve_payment_method(card)?;
            if ledger.payment_method(&id).and_then(|pm| pm.card_days()).is_none() {
                bail!("'{}' is not a credit card", card);
            }
            vec![assemble(&ledger, &id, month)]
        }
        None => invoices_for_month(&ledger, month),
    };
    Ok(invoices
        .into_iter()
        .map(|invoice| InvoiceView {
            card: ledger
                .payment_method(&invoice.card_id)
                .map(|pm| pm.name.clone())
                .unwrap_or_else(|| invoice.card_id.to_string()),
            invoice,
        })
        .collect())
}

pub fn handle(conn: &Connection, env: &Env, m: &clap::ArgMatches) -> Result<()> {
    let views = build(conn, env, m)?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &views)? {
        return Ok(());
    }
    if views.is_empty() {
        println!("No credit cards registered");
        return Ok(());
    }
    for v in &views {
        let inv = &v.invoice;
        let dates = match (inv.period, inv.due_date) {
            (Some(p), Some(due)) => format!("{} to {}, due {}", p.start, p.end, due),
            _ => String::new(),
        };
        println!("{} · {} ({})", v.card, inv.month, dates);
        let rows = inv
            .lines
            .iter()
            .map(|l| {
                vec![
                    l.date.to_string(),
                    l.description.clone(),
                    l.category.clone(),
                    fmt_money(&l.amount),
                    if l.is_projected() { "projected" } else { "" }.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Description", "Category", "Amount", ""], rows)
        );
        println!("Total: {}\n", fmt_money(&inv.total));
    }
    Ok(())
}
