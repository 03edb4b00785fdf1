// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod support;

use cyclebook::clock::FixedClock;
use cyclebook::commands::{reimbursements, Env};
use cyclebook::db;
use cyclebook::models::{Origin, SequentialIdGenerator, TransactionKind};
use rust_decimal::Decimal;
use support::{conn_with_methods, d, run};

fn setup_dinner(conn: &rusqlite::Connection, env: &Env) {
    run(conn, env, &[
        "tx", "add", "--amount", "120", "--date", "2024-03-02", "--description", "Dinner",
        "--category", "Food", "--method", "visa", "--debtor", "Ana",
    ])
    .unwrap();
    run(conn, env, &[
        "tx", "add", "--amount", "80", "--date", "2024-03-03", "--description", "Tickets",
        "--category", "Leisure", "--method", "pix", "--reimbursable",
    ])
    .unwrap();
}

#[test]
fn outstanding_grouped_by_debtor() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 3, 20));
    let ids = SequentialIdGenerator::new("tx");
    let env = Env { clock: &clock, ids: &ids };
    setup_dinner(&conn, &env);

    let owed = reimbursements::outstanding(&conn).unwrap();
    assert_eq!(owed.len(), 2);
    assert_eq!(owed[0].debtor, "(unspecified)");
    assert_eq!(owed[1].debtor, "Ana");
    assert_eq!(owed[1].total, Decimal::from(120));
}

#[test]
fn mark_then_undo() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 3, 20));
    let ids = SequentialIdGenerator::new("tx");
    let env = Env { clock: &clock, ids: &ids };
    setup_dinner(&conn, &env);

    run(&conn, &env, &["reimburse", "mark", "--id", "tx-1"]).unwrap();
    let txs = db::load_transactions(&conn).unwrap();
    let income = txs.iter().find(|t| t.kind == TransactionKind::Income).unwrap();
    assert_eq!(income.date, d(2024, 3, 20));
    assert_eq!(income.category, "Other");
    assert_eq!(income.description, "Reimbursement received: Dinner");
    assert!(matches!(&income.origin, Origin::Reimbursement { expense_id } if expense_id.as_str() == "tx-1"));
    assert_eq!(reimbursements::outstanding(&conn).unwrap().len(), 1);

    assert!(run(&conn, &env, &["reimburse", "mark", "--id", "tx-1"]).is_err());

    run(&conn, &env, &["reimburse", "undo", "--id", "tx-1"]).unwrap();
    let txs = db::load_transactions(&conn).unwrap();
    assert_eq!(txs.len(), 2);
    assert_eq!(reimbursements::outstanding(&conn).unwrap().len(), 2);
}

#[test]
fn deleting_the_income_clears_the_link() {
    let conn = conn_with_methods();
    let clock = FixedClock::new(d(2024, 3, 20));
    let ids = SequentialIdGenerator::new("tx");
    let env = Env { clock: &clock, ids: &ids };
    setup_dinner(&conn, &env);
    run(&conn, &env, &["reimburse", "mark", "--id", "tx-1"]).unwrap();

    run(&conn, &env, &["tx", "rm", "--id", "tx-3"]).unwrap();
    let txs = db::load_transactions(&conn).unwrap();
    assert_eq!(txs.len(), 2);
    let dinner = txs.iter().find(|t| t.id.as_str() == "tx-1").unwrap();
    assert!(!dinner.reimbursement.as_ref().unwrap().is_reimbursed());
}
