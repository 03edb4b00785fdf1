// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use cyclebook::commands::{self, Env};
use cyclebook::models::{Id, PaymentMethod};
use cyclebook::{cli, db};
use rusqlite::Connection;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

/// Fresh database with a "Visa" card (closes 25th, due 5th) and "Pix".
pub fn conn_with_methods() -> Connection {
    let conn = conn();
    db::insert_payment_method(
        &conn,
        &PaymentMethod::credit_card(Id::from_string("visa"), "Visa", 25, 5).unwrap(),
    )
    .unwrap();
    db::insert_payment_method(&conn, &PaymentMethod::other(Id::from_string("pix"), "Pix")).unwrap();
    conn
}

pub fn matches(args: &[&str]) -> clap::ArgMatches {
    cli::build_cli().get_matches_from(std::iter::once("cyclebook").chain(args.iter().copied()))
}

/// Matches of the innermost subcommand reached by `args`.
pub fn leaf(args: &[&str]) -> clap::ArgMatches {
    let mut m = matches(args);
    while let Some((_, sub)) = m.subcommand() {
        let next = sub.clone();
        m = next;
    }
    m
}

/// Dispatch `args` the same way the binary does.
pub fn run(conn: &Connection, env: &Env, args: &[&str]) -> Result<()> {
    let m = matches(args);
    let (name, sub) = m.subcommand().expect("a subcommand");
    match name {
        "method" => commands::methods::handle(conn, env, sub),
        "tx" => commands::transactions::handle(conn, env, sub),
        "sub" => commands::subscriptions::handle(conn, env, sub),
        "invoice" => commands::invoices::handle(conn, env, sub),
        "installment" => commands::installments::handle(conn, env, sub),
        "summary" => commands::reports::summary(conn, env, sub),
        "report" => commands::reports::handle(conn, env, sub),
        "reimburse" => commands::reimbursements::handle(conn, env, sub),
        "budget" => commands::budgets::handle(conn, env, sub),
        "plan" => commands::planning::handle(conn, env, sub),
        "goal" => commands::goals::handle(conn, env, sub),
        "category" => commands::categories::handle(conn, sub),
        "prefs" => commands::prefs::handle(conn, sub),
        "export" => commands::exporter::handle(conn, sub),
        "doctor" => commands::doctor::handle(conn),
        other => panic!("unexpected command {}", other),
    }
}
