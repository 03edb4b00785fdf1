// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::db;
use crate::effective_date::resolve;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        _ => Ok(()),
    }
}

const HEADERS: [&str; 12] = [
    "id",
    "date",
    "effective_date",
    "type",
    "amount",
    "category",
    "description",
    "payment_method",
    "group_id",
    "origin",
    "debtor",
    "reimbursed",
];

#[derive(Serialize)]
struct ExportRow {
    id: String,
    date: String,
    effective_date: String,
    #[serde(rename = "type")]
    kind: String,
    amount: String,
    category: String,
    description: String,
    payment_method: String,
    group_id: String,
    origin: String,
    debtor: String,
    reimbursed: String,
}

fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let ledger = db::load_ledger(conn)?;
    let rows: Vec<ExportRow> = ledger
        .transactions
        .iter()
        .map(|t| ExportRow {
            id: t.id.to_string(),
            date: t.date.to_string(),
            effective_date: resolve(t, &ledger.payment_methods, &ledger.preferences).to_string(),
            kind: t.kind.as_str().to_string(),
            amount: t.amount.to_string(),
            category: t.category.clone(),
            description: t.description.clone(),
            payment_method: ledger
                .payment_method(&t.payment_method)
                .map(|pm| pm.name.clone())
                .unwrap_or_else(|| t.payment_method.to_string()),
            group_id: t.group_id.as_ref().map(|g| g.to_string()).unwrap_or_default(),
            origin: t.origin.as_str().to_string(),
            debtor: t
                .reimbursement
                .as_ref()
                .and_then(|r| r.debtor.clone())
                .unwrap_or_default(),
            reimbursed: match &t.reimbursement {
                None => String::new(),
                Some(r) => r.is_reimbursed().to_string(),
            },
        })
        .collect();

    if fmt == "csv" {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(out)?;
        wtr.write_record(HEADERS)?;
        for row in &rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
    } else {
        std::fs::write(out, serde_json::to_string_pretty(&rows)?)?;
    }
    info!(count = rows.len(), format = %fmt, path = %out, "transactions exported");
    println!("Exported {} transactions to {}", rows.len(), out);
    Ok(())
}
